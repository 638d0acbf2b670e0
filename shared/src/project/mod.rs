pub mod handle;

use serde::{Deserialize, Serialize};

/// Represents a fundraising/volunteering project posted by a coordinator.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Project {
    /// The only id of this project.
    pub id: u64,
    pub name: String,
    pub description: String,
    /// Account id of the owning coordinator.
    pub coordinator: u64,
    /// Fundraising target in minor currency units.
    pub target_amount: u64,
    /// Sum of all donations applied so far. Only grows,
    /// and only through donations.
    pub collected_amount: u64,
    /// External image location. Image bytes are never handled here.
    pub image_url: Option<String>,
    /// Should be secret to users except admins and the owner.
    pub bank_details: Option<String>,
    pub status: ProjectStatus,
    /// The moderation trail of this project. Newer records are
    /// pushed to the back; the last record's status is the
    /// effective moderation status.
    pub moderation: Vec<ModerationRecord>,
    pub creation_time: chrono::DateTime<chrono::Utc>,
}

impl Project {
    /// The effective moderation status, `Pending` when the trail is empty.
    pub fn moderation_status(&self) -> ModerationStatus {
        self.moderation
            .last()
            .map_or(ModerationStatus::Pending, |record| record.status)
    }
}

/// Describes the funding/progress stage of a project,
/// independent of its moderation status.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectStatus {
    /// Accepting donations.
    Funding,
    /// The target was reached, work is under way.
    InProgress,
    Completed,
}

impl ProjectStatus {
    /// Whether `target` is a legal next stage.
    /// Stages only move forward, one step at a time.
    pub fn can_advance_to(&self, target: ProjectStatus) -> bool {
        matches!(
            (self, target),
            (ProjectStatus::Funding, ProjectStatus::InProgress)
                | (ProjectStatus::InProgress, ProjectStatus::Completed)
        )
    }
}

/// Describes a moderation decision on a project.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModerationStatus {
    Approved,
    /// Waiting for an admin decision. Invisible to the public.
    Pending,
    /// Terminal, there is no resubmission path.
    Rejected,
}

/// An admin decision in a project's moderation trail,
/// stored with the operator's account id.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ModerationRecord {
    pub operator: u64,
    pub status: ModerationStatus,
    pub comment: String,
    pub time: chrono::DateTime<chrono::Utc>,
}

/// A monetary contribution to a project.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Donation {
    /// The only id of this donation.
    pub id: u64,
    pub project: u64,
    /// `None` for anonymous donations.
    pub donor: Option<u64>,
    /// Amount in minor currency units, always positive.
    pub amount: u64,
    pub comment: Option<String>,
    pub time: chrono::DateTime<chrono::Utc>,
}
