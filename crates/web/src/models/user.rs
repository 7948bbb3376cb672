//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use podcast_core::{Email, Role, SessionClaim, Slug, UserId};

use super::podcast::Podcast;

/// Image shown for accounts created without one.
pub const DEFAULT_IMAGE_URL: &str = "https://via.placeholder.com/150";

/// A platform account.
///
/// Never carries the password hash; see [`CredentialRecord`] for that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub role: Role,
    pub image: String,
    /// Public handle, only set for podcast creators.
    pub slug: Option<Slug>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Build the session claim for this account, issued at `now`.
    #[must_use]
    pub fn to_claim(&self, now: DateTime<Utc>) -> SessionClaim {
        SessionClaim::new(self.id, self.email.clone(), self.name.clone(), self.role, now)
    }
}

/// A user together with their stored password hash.
///
/// Only the credential verifier sees this type.
#[derive(Debug, Clone)]
pub struct CredentialRecord {
    pub user: User,
    pub password_hash: String,
}

/// Data needed to insert a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: Email,
    pub password_hash: String,
    pub role: Role,
    pub image: String,
    pub slug: Option<Slug>,
}

/// A creator and their podcasts, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct UserWithPodcasts {
    #[serde(flatten)]
    pub user: User,
    pub podcasts: Vec<Podcast>,
}
