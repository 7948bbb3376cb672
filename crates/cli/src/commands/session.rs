//! Local session commands.
//!
//! # Usage
//!
//! ```bash
//! podcast-cli session login -e admin@example.com -p admin123
//! podcast-cli session show
//! podcast-cli session logout
//! ```
//!
//! # Environment Variables
//!
//! - `PODCAST_DATABASE_URL` - checked on `login` only
//! - `PODCAST_CLI_STATE` - session file (default `.podcast-session.json`)

use podcast_core::SessionStore;
use podcast_web::db::{PgStore, create_pool};
use podcast_web::services::auth::{AuthError, AuthService};
use thiserror::Error;

use super::{DatabaseUrlError, database_url};
use crate::storage::{FileStorage, LocalSessionStore, StorageError, StoredUser};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Config(#[from] DatabaseUrlError),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Login failed: {0}")]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

fn local_store() -> LocalSessionStore<FileStorage> {
    let storage = FileStorage::from_env();
    tracing::debug!(path = %storage.path().display(), "using session file");
    LocalSessionStore::new(storage)
}

/// Check credentials against the database and remember the account locally.
pub async fn login(email: &str, password: &str) -> Result<StoredUser, SessionError> {
    let database_url = database_url()?;
    let store = PgStore::new(create_pool(&database_url).await?);

    let claim = AuthService::new(&store).verify(email, password).await?;
    let user = StoredUser::from(&claim);

    local_store().persist(user.clone())?;
    tracing::info!(user_id = %user.id, role = %user.role, "Logged in");
    Ok(user)
}

/// The locally remembered account, if any.
#[must_use]
pub fn show() -> Option<StoredUser> {
    local_store().retrieve()
}

/// Forget the locally remembered account.
pub fn logout() -> Result<(), SessionError> {
    local_store().clear()?;
    tracing::info!("Logged out");
    Ok(())
}
