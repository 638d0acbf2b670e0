use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
pub struct RegisterDescriptor {
    pub email: String,
    pub name: String,
    /// Requested role. Registering as an admin is rejected,
    /// admin accounts are only created through account management.
    pub role: super::Role,
    pub password: String,
}

#[derive(Serialize, Deserialize)]
pub struct LoginDescriptor {
    pub email: String,
    pub password: String,
}

pub mod manage {
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize)]
    pub struct MakeAccountDescriptor {
        pub email: String,
        pub name: String,
        pub role: crate::account::Role,
        pub password: String,
    }

    #[derive(Serialize, Deserialize)]
    pub struct ViewAccountDescriptor {
        pub accounts: Vec<u64>,
    }

    #[derive(Serialize, Deserialize)]
    pub enum ViewAccountResult {
        Ok(crate::account::UserMetadata),
        NotFound(
            /// Target account id.
            u64,
        ),
    }

    #[derive(Serialize, Deserialize)]
    pub struct ModifyAccountDescriptor {
        pub account: u64,
        pub variants: Vec<ModifyAccountVariant>,
    }

    #[derive(Serialize, Deserialize, Clone)]
    pub enum ModifyAccountVariant {
        SetBlocked(bool),
        SetName(String),
        SetRole(crate::account::Role),
        SetVerified(bool),
    }
}
