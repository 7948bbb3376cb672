//! Session claims and the storage seam they travel through.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Email, Role, UserId};

/// Lifetime of a session: seven days.
pub const SESSION_TTL_SECONDS: i64 = 604_800;

/// The authenticated identity carried by a session.
///
/// Built from a credential record at login and never mutated afterwards.
/// It never contains the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaim {
    pub user_id: UserId,
    pub email: Email,
    pub name: String,
    pub role: Role,
    pub issued_at: DateTime<Utc>,
}

impl SessionClaim {
    /// Create a claim issued at `now`.
    ///
    /// Sub-second precision is dropped so the claim survives a trip through
    /// a token's integer timestamps unchanged.
    #[must_use]
    pub fn new(user_id: UserId, email: Email, name: String, role: Role, now: DateTime<Utc>) -> Self {
        let issued_at = DateTime::from_timestamp(now.timestamp(), 0).unwrap_or(now);
        Self {
            user_id,
            email,
            name,
            role,
            issued_at,
        }
    }

    /// Instant after which the claim is no longer accepted.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.issued_at + TimeDelta::seconds(SESSION_TTL_SECONDS)
    }

    /// Whether more than [`SESSION_TTL_SECONDS`] have elapsed since issue.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        (now - self.issued_at).num_seconds() > SESSION_TTL_SECONDS
    }

    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Where a session lives between requests.
///
/// The server keeps a signed token in an HTTP-only cookie; the command-line
/// client keeps the decoded user object in a local key/value file. Both obey
/// the same contract: what was persisted is retrieved until it is cleared.
pub trait SessionStore {
    /// What the store holds (a token string, or a decoded user).
    type Value;
    /// Failure writing to the underlying medium.
    type Error;

    /// Store `value`, replacing any previous session.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying medium cannot be written.
    fn persist(&mut self, value: Self::Value) -> Result<(), Self::Error>;

    /// Current session, or `None` when absent or unreadable.
    fn retrieve(&self) -> Option<Self::Value>;

    /// Drop the session. Clearing an empty store succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying medium cannot be written.
    fn clear(&mut self) -> Result<(), Self::Error>;
}
