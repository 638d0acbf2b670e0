pub mod handle;

use serde::{Deserialize, Serialize};

/// Represents a unit of work under a project.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Task {
    /// The only id of this task.
    pub id: u64,
    pub project: u64,
    pub name: String,
    pub description: String,
    pub kind: TaskKind,
    pub status: TaskStatus,
    /// The volunteer currently assigned, if any.
    pub assignee: Option<u64>,
    pub volunteers_needed: u32,
    /// Present when completing this task involves spending money.
    pub expenses: Option<ExpenseRequirement>,
    pub creation_time: chrono::DateTime<chrono::Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// Collecting goods or funds offline.
    Collection,
    EventOrganization,
    OnSite,
    OnlineSupport,
    Other,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// Waiting for a volunteer assignment.
    Pending,
    InProgress,
    /// Terminal, set when a report is accepted.
    Completed,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ExpenseRequirement {
    /// Estimated amount in minor currency units.
    pub estimated_amount: u64,
    pub purpose: String,
}

/// A volunteer's request to join a project's volunteer pool.
///
/// At most one application per (volunteer, project) pair exists,
/// in any status.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Application {
    /// The only id of this application.
    pub id: u64,
    pub project: u64,
    pub volunteer: u64,
    pub status: ApplicationStatus,
    pub message: Option<String>,
    pub time: chrono::DateTime<chrono::Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationStatus {
    Approved,
    /// Waiting for the coordinator's decision.
    Pending,
    Rejected,
}

/// A volunteer's completion submission for a task.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Report {
    /// The only id of this report.
    pub id: u64,
    pub task: u64,
    pub project: u64,
    pub volunteer: u64,
    pub summary: String,
    /// Spent amount in minor currency units, required when the
    /// task carries an expense requirement.
    pub expense_amount: Option<u64>,
    pub expense_purpose: Option<String>,
    pub time: chrono::DateTime<chrono::Utc>,
}
