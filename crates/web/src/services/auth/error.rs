//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown identifier or wrong password. The two are never distinguished.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// No session token was presented.
    #[error("missing session token")]
    MissingToken,

    /// The token could not be decoded.
    #[error("malformed session token")]
    MalformedToken,

    /// The token signature did not verify against the server secret.
    #[error("invalid token signature")]
    InvalidSignature,

    /// The token is older than the session lifetime.
    #[error("session expired")]
    Expired,

    /// The session refers to an account that no longer exists.
    #[error("account not found")]
    AccountNotFound,

    /// Valid session, wrong role.
    #[error("not authorized for this resource")]
    Unauthorized,

    /// Invalid email format on account creation.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] podcast_core::EmailError),

    /// Name or email already registered.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Display name unusable (empty, or no characters left for a slug).
    #[error("invalid name: {0}")]
    InvalidName(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,

    /// Token signing error.
    #[error("token encoding error: {0}")]
    TokenEncoding(String),
}

impl AuthError {
    /// Whether this error means "no usable session" rather than a server fault.
    #[must_use]
    pub const fn is_session_rejection(&self) -> bool {
        matches!(
            self,
            Self::MissingToken
                | Self::MalformedToken
                | Self::InvalidSignature
                | Self::Expired
                | Self::AccountNotFound
        )
    }
}
