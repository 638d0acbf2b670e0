pub mod handle;

use serde::{Deserialize, Serialize};

/// Represent roles an account can hold.
///
/// The moderator capability is carried by [`Role::Admin`],
/// there is no separate moderator role.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum Role {
    /// Manages accounts and moderates projects.
    Admin,
    /// Creates and manages projects and their tasks.
    Coordinator,
    /// Contributes funds to projects.
    Donor,
    /// Applies to projects and completes tasks.
    Volunteer,
}

impl Role {
    /// Whether this role carries the moderator capability.
    pub fn is_moderator(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

/// Represents an account's public metadata.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UserMetadata {
    pub id: u64,
    pub email: String,
    pub name: String,
    pub role: Role,
    /// Whether an admin has verified this account.
    pub verified: bool,
    /// Blocked accounts cannot perform any action.
    pub blocked: bool,
}
