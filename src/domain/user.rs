//! User accounts and their public projection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::Username;
use super::money::Amount;

/// Maximum number of personal links on a profile.
pub const MAX_PROFILE_LINKS: usize = 4;

/// Cosmetic profile fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub display_name: String,
    pub emoji: String,
    pub description: String,
    pub links: Vec<String>,
}

/// A stored user account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub username: Username,
    pub profile: Profile,
    /// May be negative down to the configured debt floor.
    pub balance: Amount,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Public view of the account, without balance.
    #[must_use]
    pub fn to_public(&self) -> PublicUser {
        PublicUser {
            username: self.username.clone(),
            display_name: self.profile.display_name.clone(),
            emoji: self.profile.emoji.clone(),
            description: self.profile.description.clone(),
            links: self.profile.links.clone(),
        }
    }
}

/// A user account to insert.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: Username,
    pub profile: Profile,
    pub initial_balance: Amount,
    pub created_at: DateTime<Utc>,
}

/// Publicly visible user information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicUser {
    pub username: Username,
    pub display_name: String,
    pub emoji: String,
    pub description: String,
    pub links: Vec<String>,
}
