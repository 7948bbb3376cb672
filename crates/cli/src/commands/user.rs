//! Account management commands.
//!
//! # Usage
//!
//! ```bash
//! # Create an administrator
//! podcast-cli user create -e admin@example.com -n "Admin" -r admin -p 'admin123'
//!
//! # Create a creator with a profile image
//! podcast-cli user create -e ana@example.com -n "Ana Ruiz" -r user -p 's3cure-pass' \
//!     --image https://cdn.example.com/ana.png
//! ```

use podcast_core::{Role, RoleError};
use podcast_web::db::{PgStore, create_pool};
use podcast_web::services::auth::{AuthError, AuthService, NewAccount};
use thiserror::Error;

use super::{DatabaseUrlError, database_url};

#[derive(Debug, Error)]
pub enum UserError {
    #[error(transparent)]
    Config(#[from] DatabaseUrlError),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid role: {0}")]
    InvalidRole(#[from] RoleError),

    #[error("Could not create account: {0}")]
    Auth(#[from] AuthError),
}

/// Create an account and return its id.
pub async fn create(
    email: &str,
    name: &str,
    role: &str,
    password: &str,
    image: Option<&str>,
) -> Result<i32, UserError> {
    let role: Role = role.parse()?;
    let database_url = database_url()?;

    tracing::info!("Connecting to database...");
    let store = PgStore::new(create_pool(&database_url).await?);

    let user = AuthService::new(&store)
        .create_account(NewAccount {
            name,
            email,
            password,
            role,
            image,
        })
        .await?;

    tracing::info!(
        user_id = %user.id,
        role = %user.role,
        slug = user.slug.as_ref().map_or("-", |s| s.as_str()),
        "Account created"
    );
    Ok(user.id.as_i32())
}
