//! Persistence for the podcast platform.
//!
//! ## Tables
//!
//! - `roles` - Reference data (`admin` = 1, `user` = 2)
//! - `users` - Accounts with argon2 password hashes
//! - `podcasts` - Shows owned by creators
//! - `available_slots` - Agenda time slots opened by administrators
//! - `appointments` - At most one booking per slot
//!
//! Handlers talk to the [`Repository`] trait object held in
//! [`AppState`](crate::state::AppState). [`PgStore`] backs it in production;
//! [`MemoryStore`] backs it in tests.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/web/migrations/` and run via:
//! ```bash
//! cargo run -p podcast-cli -- migrate
//! ```

pub mod memory;
pub mod postgres;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use podcast_core::{AppointmentId, AppointmentState, Email, Slug, SlotId, UserId};

use crate::models::{
    Appointment, AppointmentDetail, CredentialRecord, NewPodcast, NewTimeSlot, NewUser, Podcast,
    PodcastWithOwner, SlotWithBooking, TimeSlot, User,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Account lookups and creation.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Exact-match lookup by login identifier, including the password hash.
    async fn find_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<CredentialRecord>, RepositoryError>;

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Whether an account already uses this display name or email.
    async fn user_exists(&self, name: &str, email: &Email) -> Result<bool, RepositoryError>;

    /// Insert an account.
    ///
    /// Returns `RepositoryError::Conflict` when the name, email or slug is taken.
    async fn create_user(&self, new: NewUser) -> Result<User, RepositoryError>;

    /// All accounts ordered by name.
    async fn list_users(&self) -> Result<Vec<User>, RepositoryError>;

    /// Newest accounts first.
    async fn recent_users(&self, limit: i64) -> Result<Vec<User>, RepositoryError>;

    async fn count_users(&self) -> Result<i64, RepositoryError>;

    /// Accounts with role `user` and a public slug, ordered by name.
    async fn list_creators(&self) -> Result<Vec<User>, RepositoryError>;

    /// Creator (role `user`) owning `slug`.
    async fn find_creator(&self, slug: &Slug) -> Result<Option<User>, RepositoryError>;
}

#[async_trait]
pub trait PodcastStore: Send + Sync {
    /// Returns `RepositoryError::Conflict` when the name is taken.
    async fn create_podcast(&self, new: NewPodcast) -> Result<Podcast, RepositoryError>;

    async fn podcast_name_taken(&self, name: &str) -> Result<bool, RepositoryError>;

    /// A creator's podcasts, newest first.
    async fn podcasts_by_owner(&self, owner: UserId) -> Result<Vec<Podcast>, RepositoryError>;

    async fn recent_podcasts(&self, limit: i64) -> Result<Vec<PodcastWithOwner>, RepositoryError>;

    async fn count_podcasts(&self) -> Result<i64, RepositoryError>;
}

/// Time slots and appointments.
#[async_trait]
pub trait AgendaStore: Send + Sync {
    async fn create_slot(&self, new: NewTimeSlot) -> Result<TimeSlot, RepositoryError>;

    async fn get_slot(&self, id: SlotId) -> Result<Option<SlotWithBooking>, RepositoryError>;

    /// Every slot, earliest first.
    async fn list_slots(&self) -> Result<Vec<SlotWithBooking>, RepositoryError>;

    /// Slots a user can still book: available, starting after `now`, unbooked.
    async fn open_slots(&self, now: DateTime<Utc>) -> Result<Vec<TimeSlot>, RepositoryError>;

    /// Delete a slot and the appointment booked on it.
    async fn delete_slot(&self, id: SlotId) -> Result<(), RepositoryError>;

    /// Flip `is_available`, returning the updated slot.
    async fn toggle_slot(&self, id: SlotId) -> Result<TimeSlot, RepositoryError>;

    /// Book `slot` for `user` in the given state.
    ///
    /// Returns `RepositoryError::Conflict` when the slot is already booked.
    async fn create_appointment(
        &self,
        user: UserId,
        slot: SlotId,
        state: AppointmentState,
    ) -> Result<Appointment, RepositoryError>;

    async fn find_appointment(
        &self,
        user: UserId,
        slot: SlotId,
    ) -> Result<Option<Appointment>, RepositoryError>;

    /// All appointments, latest slot first.
    async fn list_appointments(&self) -> Result<Vec<AppointmentDetail>, RepositoryError>;

    /// One user's appointments, latest slot first.
    async fn appointments_for_user(
        &self,
        user: UserId,
    ) -> Result<Vec<AppointmentDetail>, RepositoryError>;

    async fn set_appointment_state(
        &self,
        id: AppointmentId,
        state: AppointmentState,
    ) -> Result<Appointment, RepositoryError>;
}

/// Everything the web layer needs from persistence.
#[async_trait]
pub trait Repository: UserStore + PodcastStore + AgendaStore {
    /// Check the backing store is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;
}
