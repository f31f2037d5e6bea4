//! Profile domain entity
//!
//! A snapshot of a row from the `users` table. Every field is optional so the
//! empty profile (`{}`) used as a lookup fallback is representable.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a user (the auth user's UUID)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl From<Uuid> for UserId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Public profile of a user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Storage path of the avatar image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(
        default,
        rename = "phoneNumber",
        alias = "phone_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub phone_number: Option<String>,
}

impl Profile {
    /// The fallback used when a profile lookup fails
    pub fn empty() -> Self {
        Self::default()
    }

    /// Name to show next to a post or in the header
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Unknown")
    }
}
