pub mod handle;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
};

pub use volunet_shared::account::*;

/// The static instance of accounts.
pub static INSTANCE: Lazy<AccountManager> = Lazy::new(AccountManager::new);

/// Represent a registered account.
#[derive(Serialize, Deserialize, Debug)]
pub struct Account {
    /// Identifier of this account, hashed from the email address.
    pub id: u64,
    /// Attributes of this account.
    pub attributes: UserAttributes,
    /// This account's token manager.
    pub tokens: Tokens,
}

impl Account {
    pub fn new(
        email: String,
        name: String,
        role: Role,
        password: &str,
        verified: bool,
    ) -> Result<Self, crate::Error> {
        if email.is_empty() || !email.contains('@') {
            return Err(crate::Error::Validation(
                "malformed email address".to_string(),
            ));
        }
        if password.is_empty() {
            return Err(crate::Error::Validation(
                "password could not be empty".to_string(),
            ));
        }

        Ok(Self {
            id: id_from_email(&email),
            attributes: UserAttributes {
                email,
                name,
                role,
                verified,
                blocked: false,
                registration_time: Utc::now(),
                password_sha: sha256::digest(password),
                token_expiration_time: 30,
            },
            tokens: Tokens::new(),
        })
    }

    /// Get metadata of this account.
    pub fn metadata(&self) -> UserMetadata {
        UserMetadata {
            id: self.id,
            email: self.attributes.email.clone(),
            name: self.attributes.name.clone(),
            role: self.attributes.role,
            verified: self.attributes.verified,
            blocked: self.attributes.blocked,
        }
    }

    /// Login into the account and return back a token in a `Result`.
    pub fn login(&mut self, password: &str) -> Result<String, crate::Error> {
        if sha256::digest(password) == self.attributes.password_sha {
            Ok(self
                .tokens
                .new_token(self.id, self.attributes.token_expiration_time))
        } else {
            Err(crate::Error::EmailOrPasswordIncorrect)
        }
    }

    /// Logout this account with the target token.
    pub fn logout(&mut self, token: &str) -> Result<(), crate::Error> {
        if self.tokens.remove(token) {
            Ok(())
        } else {
            Err(crate::Error::NotLoggedIn)
        }
    }

    /// Save this account to the filesystem.
    pub fn save(&self) {
        #[cfg(not(test))]
        {
            if crate::config::INSTANCE.demo_mode {
                return;
            }

            let id = self.id;
            let data = toml::to_string(&self).unwrap_or_default();

            tokio::spawn(async move {
                use tokio::io::AsyncWriteExt;

                if let Ok(mut file) =
                    tokio::fs::File::create(format!("./data/accounts/{}.toml", id)).await
                {
                    file.write_all(data.as_bytes()).await.unwrap()
                }
            });
        }
    }
}

/// Hash an email address into an account id.
pub fn id_from_email(email: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    email.hash(&mut hasher);
    hasher.finish()
}

/// Attributes of a registered account.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UserAttributes {
    /// Email address of this account.
    pub email: String,
    /// Name of this account.
    pub name: String,
    /// Role of this account.
    pub role: Role,
    /// Whether an admin has verified this account.
    /// Unverified accounts cannot perform actions.
    pub verified: bool,
    /// Whether an admin has blocked this account.
    pub blocked: bool,
    /// The registration time of this account.
    pub registration_time: DateTime<Utc>,
    /// Hash of this account's password.
    pub password_sha: String,
    /// The expiration time of a token in days.
    /// `0` means never expire.
    pub token_expiration_time: u16,
}

/// A simple token manager.
#[derive(Serialize, Deserialize, Debug)]
pub struct Tokens {
    inner: Vec<(Option<chrono::NaiveDateTime>, String)>,
}

impl Tokens {
    pub fn new() -> Self {
        Self { inner: Vec::new() }
    }

    /// Create a new token.
    #[must_use]
    pub fn new_token(&mut self, id: u64, expire_time: u16) -> String {
        let expiry = if expire_time == 0 {
            None
        } else {
            Some(chrono::Utc::now().naive_utc() + chrono::Days::new(expire_time as u64))
        };
        let token = sha256::digest(format!("{}-{:?}-{}", id, expiry, rand::random::<u64>()));
        self.inner.push((expiry, token.clone()));
        token
    }

    /// Remove a target token and return whether the token was
    /// removed successfully.
    fn remove(&mut self, token: &str) -> bool {
        let l = self.inner.len();
        self.inner.retain(|e| e.1 != token);
        l > self.inner.len()
    }

    /// Check if a token is usable.
    pub fn token_usable(&self, token: &str) -> bool {
        self.inner.iter().any(|e| e.1 == token)
    }

    /// Remove expired tokens.
    pub fn refresh(&mut self) {
        self.inner
            .retain(|e| e.0.map_or(true, |a| a > chrono::Utc::now().naive_utc()));
    }
}

impl Default for Tokens {
    fn default() -> Self {
        Self::new()
    }
}

/// A simple account manager.
pub struct AccountManager {
    accounts: RwLock<Vec<RwLock<Account>>>,
    /// An index cache for getting index from an id.
    index: DashMap<u64, usize>,
}

impl AccountManager {
    /// Read and create an account manager from `./data/accounts`,
    /// or from the demo seed in demo mode.
    fn new() -> Self {
        #[cfg(not(test))]
        {
            use std::fs::{self, File};
            use std::io::Read;

            if crate::config::INSTANCE.demo_mode {
                return Self::demo();
            }

            let mut vec = Vec::new();
            let index = DashMap::new();
            let mut i = 0;
            for dir in fs::read_dir("./data/accounts").unwrap() {
                if let Ok(account) = dir.map(|e| {
                    toml::from_str::<Account>(&{
                        let mut string = String::new();
                        File::open(e.path())
                            .unwrap()
                            .read_to_string(&mut string)
                            .unwrap();
                        string
                    })
                    .unwrap()
                }) {
                    index.insert(account.id, i);
                    vec.push(RwLock::new(account));
                    i += 1;
                }
            }
            Self {
                accounts: RwLock::new(vec),
                index,
            }
        }

        #[cfg(test)]
        Self {
            accounts: RwLock::new(Vec::new()),
            index: DashMap::new(),
        }
    }

    /// The seeded in-memory store selected by `demo_mode`:
    /// one verified account per role, all with password `volunet`.
    #[cfg(not(test))]
    fn demo() -> Self {
        let this = Self {
            accounts: RwLock::new(Vec::new()),
            index: DashMap::new(),
        };
        for (email, name, role) in [
            ("admin@volunet.org", "Demo Admin", Role::Admin),
            ("coordinator@volunet.org", "Demo Coordinator", Role::Coordinator),
            ("volunteer@volunet.org", "Demo Volunteer", Role::Volunteer),
            ("donor@volunet.org", "Demo Donor", Role::Donor),
        ] {
            this.push(
                Account::new(email.to_string(), name.to_string(), role, "volunet", true)
                    .expect("demo seed account"),
            );
        }
        this
    }

    /// Get inner accounts.
    pub fn inner(&self) -> &RwLock<Vec<RwLock<Account>>> {
        &self.accounts
    }

    /// Get inner index cache.
    pub fn index(&self) -> &DashMap<u64, usize> {
        &self.index
    }

    /// Update index cache of this instance.
    pub fn update_index(&self) {
        self.index.clear();
        for (i, account) in self.accounts.read().iter().enumerate() {
            self.index.insert(account.read().id, i);
        }
    }

    /// Push an account to this instance.
    pub fn push(&self, account: Account) {
        let mut accounts = self.accounts.write();
        self.index.insert(account.id, accounts.len());
        accounts.push(RwLock::new(account));
    }

    /// Indicates if the target id is already contained in this instance.
    pub fn contains_id(&self, id: u64) -> bool {
        self.index.contains_key(&id)
    }

    /// Remove expired tokens of all accounts.
    pub fn refresh_all(&self) {
        for account in self.accounts.read().iter() {
            account.write().tokens.refresh();
        }
    }

    /// Remove expired tokens of the target account.
    pub fn refresh(&self, id: u64) {
        if let Some(index) = self.index.get(&id) {
            if let Some(account) = self.accounts.read().get(*index) {
                account.write().tokens.refresh();
            }
        }
    }

    #[cfg(test)]
    pub fn reset(&self) {
        *self.accounts.write() = Vec::new();
        self.index.clear()
    }
}
