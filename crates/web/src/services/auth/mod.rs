//! Authentication service.
//!
//! Verifies credentials, creates accounts, and hands out the signed session
//! tokens the cookie carries.

mod error;
pub mod token;

pub use error::AuthError;
pub use token::TokenCodec;

use std::sync::LazyLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;

use podcast_core::{Email, Role, SessionClaim, Slug};

use crate::db::{RepositoryError, UserStore};
use crate::models::user::DEFAULT_IMAGE_URL;
use crate::models::{NewUser, User};

/// Fields for a new account.
#[derive(Debug, Clone)]
pub struct NewAccount<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub role: Role,
    /// Profile image URL. Falls back to the placeholder when `None`.
    pub image: Option<&'a str>,
}

/// Authentication service.
///
/// Borrows the user store for the duration of one request.
pub struct AuthService<'a> {
    users: &'a dyn UserStore,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(users: &'a dyn UserStore) -> Self {
        Self { users }
    }

    /// Check an identifier/password pair and build the session claim.
    ///
    /// Performs at most one lookup. Empty input, an unknown identifier and a
    /// wrong password all produce the same error.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` when the pair does not match an account.
    /// Returns `AuthError::Repository` if the lookup itself fails.
    pub async fn verify(
        &self,
        identifier: &str,
        raw_password: &str,
    ) -> Result<SessionClaim, AuthError> {
        if identifier.is_empty() || raw_password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }
        let email = Email::parse(identifier).map_err(|_| AuthError::InvalidCredentials)?;

        let record = self.users.find_credentials(&email).await?;

        // Unknown accounts still pay for one Argon2 verification.
        let hash = record
            .as_ref()
            .map_or(UNKNOWN_ACCOUNT_HASH.as_str(), |r| r.password_hash.as_str());
        let checked = verify_password(raw_password, hash);

        match (record, checked) {
            (Some(record), Ok(())) => Ok(record.user.to_claim(Utc::now())),
            _ => Err(AuthError::InvalidCredentials),
        }
    }

    /// Self sign-up. New accounts get the `user` role, the placeholder image
    /// and a slug derived from their name.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail`, `AuthError::WeakPassword` or
    /// `AuthError::InvalidName` for bad input.
    /// Returns `AuthError::UserAlreadyExists` if the name or email is taken.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<User, AuthError> {
        self.create_account(NewAccount {
            name,
            email,
            password,
            role: Role::User,
            image: None,
        })
        .await
    }

    /// Create an account of any role.
    ///
    /// Accounts with the `user` role get a public slug; administrators don't.
    ///
    /// # Errors
    ///
    /// Same as [`AuthService::register`].
    pub async fn create_account(&self, account: NewAccount<'_>) -> Result<User, AuthError> {
        let name = account.name.trim();
        if name.is_empty() {
            return Err(AuthError::InvalidName("name is required".to_owned()));
        }
        let email = Email::parse(account.email.trim())?;
        validate_password(account.password)?;

        let slug = match account.role {
            Role::User => Some(
                Slug::from_name(name).map_err(|e| AuthError::InvalidName(e.to_string()))?,
            ),
            Role::Admin => None,
        };

        if self.users.user_exists(name, &email).await? {
            return Err(AuthError::UserAlreadyExists);
        }

        let password_hash = hash_password(account.password)?;
        let user = self
            .users
            .create_user(NewUser {
                name: name.to_owned(),
                email,
                password_hash,
                role: account.role,
                image: account.image.unwrap_or(DEFAULT_IMAGE_URL).to_owned(),
                slug,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, role = %user.role, "account created");
        Ok(user)
    }

    /// Re-read the account behind a session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::AccountNotFound` if the account has been removed.
    pub async fn current_user(&self, claim: &SessionClaim) -> Result<User, AuthError> {
        self.users
            .get_user(claim.user_id)
            .await?
            .ok_or(AuthError::AccountNotFound)
    }
}

/// Argon2 hash checked against when the identifier matches no account.
static UNKNOWN_ACCOUNT_HASH: LazyLock<String> = LazyLock::new(|| {
    hash_password("no account has this password").unwrap_or_default()
});

/// Any non-empty password is accepted.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.is_empty() {
        return Err(AuthError::WeakPassword("password is required".to_owned()));
    }
    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    async fn store_with_admin() -> MemoryStore {
        let store = MemoryStore::new();
        AuthService::new(&store)
            .create_account(NewAccount {
                name: "Admin",
                email: "admin@example.com",
                password: "admin123",
                role: Role::Admin,
                image: None,
            })
            .await
            .unwrap();
        store
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong horse", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_unparseable_hash_is_invalid_credentials() {
        assert!(matches!(
            verify_password("anything", "$2b$10$legacybcrypt"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_verify_returns_claim() {
        let store = store_with_admin().await;
        let claim = AuthService::new(&store)
            .verify("admin@example.com", "admin123")
            .await
            .unwrap();

        assert_eq!(claim.email.as_str(), "admin@example.com");
        assert_eq!(claim.name, "Admin");
        assert_eq!(claim.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_verify_merges_failure_kinds() {
        let store = store_with_admin().await;
        let auth = AuthService::new(&store);

        for (identifier, password) in [
            ("admin@example.com", "wrong-password"),
            ("nobody@example.com", "admin123"),
            ("", "admin123"),
            ("admin@example.com", ""),
            ("not-an-email", "admin123"),
        ] {
            assert!(
                matches!(
                    auth.verify(identifier, password).await,
                    Err(AuthError::InvalidCredentials)
                ),
                "{identifier:?} / {password:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_verify_matches_identifier_exactly() {
        let store = store_with_admin().await;
        let auth = AuthService::new(&store);

        for identifier in [" admin@example.com", "admin@example.com ", "  admin@example.com\t"] {
            assert!(
                matches!(
                    auth.verify(identifier, "admin123").await,
                    Err(AuthError::InvalidCredentials)
                ),
                "{identifier:?}"
            );
        }
    }

    #[test]
    fn test_unknown_account_hash_costs_like_a_real_one() {
        let real = hash_password("admin123").unwrap();
        let real = PasswordHash::new(&real).unwrap();
        let unknown = PasswordHash::new(UNKNOWN_ACCOUNT_HASH.as_str()).unwrap();

        assert_eq!(unknown.algorithm, real.algorithm);
        assert_eq!(unknown.version, real.version);
        assert_eq!(unknown.params, real.params);
    }

    #[tokio::test]
    async fn test_unknown_account_never_matches_placeholder_password() {
        let store = store_with_admin().await;
        assert!(matches!(
            AuthService::new(&store)
                .verify("nobody@example.com", "no account has this password")
                .await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_register_assigns_user_role_and_slug() {
        let store = MemoryStore::new();
        let user = AuthService::new(&store)
            .register("María José", "mj@example.com", "s3cure-pass")
            .await
            .unwrap();

        assert_eq!(user.role, Role::User);
        assert_eq!(user.slug.unwrap().as_str(), "mariajose");
        assert_eq!(user.image, DEFAULT_IMAGE_URL);
    }

    #[tokio::test]
    async fn test_register_rejects_taken_name_or_email() {
        let store = store_with_admin().await;
        let auth = AuthService::new(&store);

        assert!(matches!(
            auth.register("Someone", "admin@example.com", "s3cure-pass").await,
            Err(AuthError::UserAlreadyExists)
        ));
        assert!(matches!(
            auth.register("Admin", "new@example.com", "s3cure-pass").await,
            Err(AuthError::UserAlreadyExists)
        ));
    }

    #[tokio::test]
    async fn test_register_validates_input() {
        let store = MemoryStore::new();
        let auth = AuthService::new(&store);

        assert!(matches!(
            auth.register("Ana", "ana@example.com", "").await,
            Err(AuthError::WeakPassword(_))
        ));
        assert!(auth.register("Ana", "ana@example.com", "abc").await.is_ok());
        assert!(matches!(
            auth.register("Ana", "ana-at-example", "s3cure-pass").await,
            Err(AuthError::InvalidEmail(_))
        ));
        assert!(matches!(
            auth.register("  ", "ana@example.com", "s3cure-pass").await,
            Err(AuthError::InvalidName(_))
        ));
    }
}
