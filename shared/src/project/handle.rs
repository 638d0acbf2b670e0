use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
pub struct CreateProjectDescriptor {
    pub name: String,
    pub description: String,
    /// Fundraising target in minor currency units.
    pub target_amount: u64,
    pub image_url: Option<String>,
    pub bank_details: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct GetProjectsDescriptor {
    pub filters: Vec<GetProjectsFilter>,
}

#[derive(Serialize, Deserialize, Clone)]
pub enum GetProjectsFilter {
    /// Projects owned by target coordinator account.
    Coordinator(u64),
    /// Projects whose name or description contains target keywords.
    Keyword(String),
    /// Projects with target effective moderation status.
    Moderation(super::ModerationStatus),
    /// Projects in target stage.
    Status(super::ProjectStatus),
}

#[derive(Serialize, Deserialize)]
pub struct GetProjectsInfoDescriptor {
    pub projects: Vec<u64>,
}

#[derive(Serialize, Deserialize)]
pub enum ProjectInfoResult {
    /// The complete record, returned to the owner and admins.
    Full(super::Project),
    /// The public view of an approved project. Bank details and the
    /// moderation trail stay private.
    Public {
        id: u64,
        name: String,
        description: String,
        coordinator: u64,
        target_amount: u64,
        collected_amount: u64,
        image_url: Option<String>,
        status: super::ProjectStatus,
    },
    /// The project exists but the actor may not view it. Existence
    /// is not secret, the contents are.
    Forbidden(
        /// Target project id.
        u64,
    ),
    NotFound(
        /// Target project id.
        u64,
    ),
}

#[derive(Serialize, Deserialize)]
pub struct EditProjectDescriptor {
    pub project: u64,
    pub variants: Vec<EditProjectVariant>,
}

#[derive(Serialize, Deserialize, Clone)]
pub enum EditProjectVariant {
    BankDetails(Option<String>),
    Description(String),
    ImageUrl(Option<String>),
    Name(String),
    /// Advance the stage. Backward and skipping moves are rejected.
    Status(super::ProjectStatus),
    /// Adjust the fundraising target, only while the project
    /// is still funding.
    TargetAmount(u64),
}

#[derive(Serialize, Deserialize)]
pub struct DeleteProjectDescriptor {
    pub project: u64,
}

#[derive(Serialize, Deserialize)]
pub struct ModerateProjectDescriptor {
    pub project: u64,
    pub variant: ModerateProjectVariant,
}

#[derive(Serialize, Deserialize, Clone)]
pub enum ModerateProjectVariant {
    Approve(
        /// Message to the coordinator.
        Option<String>,
    ),
    Reject(
        /// Message to the coordinator, should not be empty.
        String,
    ),
}

#[derive(Serialize, Deserialize)]
pub struct DonateDescriptor {
    pub project: u64,
    /// Amount in minor currency units, must be positive.
    pub amount: u64,
    pub comment: Option<String>,
    /// Donate without recording the donor account.
    pub anonymous: bool,
}

#[derive(Serialize, Deserialize)]
pub struct GetDonationsDescriptor {
    pub project: u64,
}
