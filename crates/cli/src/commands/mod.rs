//! Subcommand implementations.

pub mod migrate;
pub mod session;
pub mod user;

use secrecy::SecretString;

/// Errors shared by commands that need a database.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseUrlError {
    #[error("Missing environment variable: PODCAST_DATABASE_URL (or DATABASE_URL)")]
    Missing,
}

/// Database URL from `PODCAST_DATABASE_URL`, falling back to `DATABASE_URL`.
///
/// Loads `.env` first.
pub fn database_url() -> Result<SecretString, DatabaseUrlError> {
    dotenvy::dotenv().ok();

    std::env::var("PODCAST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| DatabaseUrlError::Missing)
}
