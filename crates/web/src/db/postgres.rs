//! `PostgreSQL` repository.
//!
//! Queries are checked at runtime (`query_as` + `FromRow` row types) so the
//! crate builds without a live database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use podcast_core::{
    AppointmentId, AppointmentState, Email, PodcastId, Role, SlotId, Slug, UserId,
};

use super::{AgendaStore, PodcastStore, Repository, RepositoryError, UserStore};
use crate::models::{
    Appointment, AppointmentDetail, CredentialRecord, NewPodcast, NewTimeSlot, NewUser, Podcast,
    PodcastWithOwner, SlotWithBooking, TimeSlot, User,
};

// =============================================================================
// Internal Row Types
// =============================================================================

macro_rules! user_select {
    () => {
        "SELECT u.id, u.name, u.email, r.name AS role, u.image, u.slug, \
                u.created_at, u.updated_at \
         FROM users u JOIN roles r ON r.id = u.role_id"
    };
}

macro_rules! slot_select {
    () => {
        "SELECT s.id, s.starts_at, s.duration_minutes, s.description, s.is_available, \
                s.created_at, u.name AS booked_by \
         FROM available_slots s \
         LEFT JOIN appointments a ON a.slot_id = s.id \
         LEFT JOIN users u ON u.id = a.user_id"
    };
}

macro_rules! appointment_detail_select {
    () => {
        "SELECT a.id, a.user_id, a.slot_id, a.state, a.created_at, \
                u.name AS user_name, u.email AS user_email, \
                s.starts_at AS slot_starts_at, s.duration_minutes AS slot_duration_minutes, \
                s.description AS slot_description, s.is_available AS slot_is_available, \
                s.created_at AS slot_created_at \
         FROM appointments a \
         JOIN users u ON u.id = a.user_id \
         JOIN available_slots s ON s.id = a.slot_id"
    };
}

const APPOINTMENT_COLUMNS: &str = "id, user_id, slot_id, state, created_at";
const SLOT_COLUMNS: &str = "id, starts_at, duration_minutes, description, is_available, created_at";

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i32,
    name: String,
    email: String,
    role: Role,
    image: String,
    slug: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let slug = row
            .slug
            .as_deref()
            .map(Slug::parse)
            .transpose()
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid slug in database: {e}")))?;

        Ok(Self {
            id: UserId::new(row.id),
            name: row.name,
            email,
            role: row.role,
            image: row.image,
            slug,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CredentialRow {
    #[sqlx(flatten)]
    user: UserRow,
    password: String,
}

#[derive(Debug, sqlx::FromRow)]
struct PodcastRow {
    id: i32,
    name: String,
    url: String,
    description: String,
    user_id: i32,
    created_at: DateTime<Utc>,
}

impl From<PodcastRow> for Podcast {
    fn from(row: PodcastRow) -> Self {
        Self {
            id: PodcastId::new(row.id),
            name: row.name,
            url: row.url,
            description: row.description,
            user_id: UserId::new(row.user_id),
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PodcastWithOwnerRow {
    #[sqlx(flatten)]
    podcast: PodcastRow,
    owner_name: String,
}

#[derive(Debug, sqlx::FromRow)]
struct SlotRow {
    id: i32,
    starts_at: DateTime<Utc>,
    duration_minutes: i32,
    description: Option<String>,
    is_available: bool,
    created_at: DateTime<Utc>,
}

impl From<SlotRow> for TimeSlot {
    fn from(row: SlotRow) -> Self {
        Self {
            id: SlotId::new(row.id),
            starts_at: row.starts_at,
            duration_minutes: row.duration_minutes,
            description: row.description,
            is_available: row.is_available,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SlotWithBookingRow {
    #[sqlx(flatten)]
    slot: SlotRow,
    booked_by: Option<String>,
}

impl From<SlotWithBookingRow> for SlotWithBooking {
    fn from(row: SlotWithBookingRow) -> Self {
        Self {
            slot: row.slot.into(),
            booked_by: row.booked_by,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AppointmentRow {
    id: i32,
    user_id: i32,
    slot_id: i32,
    state: AppointmentState,
    created_at: DateTime<Utc>,
}

impl From<AppointmentRow> for Appointment {
    fn from(row: AppointmentRow) -> Self {
        Self {
            id: AppointmentId::new(row.id),
            user_id: UserId::new(row.user_id),
            slot_id: SlotId::new(row.slot_id),
            state: row.state,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AppointmentDetailRow {
    #[sqlx(flatten)]
    appointment: AppointmentRow,
    user_name: String,
    user_email: String,
    slot_starts_at: DateTime<Utc>,
    slot_duration_minutes: i32,
    slot_description: Option<String>,
    slot_is_available: bool,
    slot_created_at: DateTime<Utc>,
}

impl From<AppointmentDetailRow> for AppointmentDetail {
    fn from(row: AppointmentDetailRow) -> Self {
        let slot = TimeSlot {
            id: SlotId::new(row.appointment.slot_id),
            starts_at: row.slot_starts_at,
            duration_minutes: row.slot_duration_minutes,
            description: row.slot_description,
            is_available: row.slot_is_available,
            created_at: row.slot_created_at,
        };
        Self {
            appointment: row.appointment.into(),
            user_name: row.user_name,
            user_email: row.user_email,
            slot,
        }
    }
}

/// Map a unique violation to `Conflict`, everything else to `Database`.
fn conflict_or_database(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(e)
}

// =============================================================================
// Repository
// =============================================================================

/// Repository backed by a `PostgreSQL` pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<CredentialRecord>, RepositoryError> {
        let row = sqlx::query_as::<_, CredentialRow>(concat!(
            "SELECT u.id, u.name, u.email, r.name AS role, u.image, u.slug, \
                    u.created_at, u.updated_at, u.password \
             FROM users u JOIN roles r ON r.id = u.role_id",
            " WHERE u.email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| {
            Ok(CredentialRecord {
                user: r.user.try_into()?,
                password_hash: r.password,
            })
        })
        .transpose()
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(concat!(user_select!(), " WHERE u.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn user_exists(&self, name: &str, email: &Email) -> Result<bool, RepositoryError> {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM users WHERE name = $1 OR email = $2)")
                .bind(name)
                .bind(email)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn create_user(&self, new: NewUser) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            "WITH inserted AS ( \
                INSERT INTO users (name, email, password, role_id, image, slug) \
                VALUES ($1, $2, $3, $4, $5, $6) \
                RETURNING * \
             ) \
             SELECT u.id, u.name, u.email, r.name AS role, u.image, u.slug, \
                    u.created_at, u.updated_at \
             FROM inserted u JOIN roles r ON r.id = u.role_id",
        )
        .bind(&new.name)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(new.role.id())
        .bind(&new.image)
        .bind(new.slug.as_ref().map(Slug::as_str))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_or_database(e, "user"))?;

        row.try_into()
    }

    async fn list_users(&self) -> Result<Vec<User>, RepositoryError> {
        let rows = sqlx::query_as::<_, UserRow>(concat!(user_select!(), " ORDER BY u.name ASC"))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn recent_users(&self, limit: i64) -> Result<Vec<User>, RepositoryError> {
        let rows = sqlx::query_as::<_, UserRow>(concat!(
            user_select!(),
            " ORDER BY u.created_at DESC, u.id DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn count_users(&self) -> Result<i64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn list_creators(&self) -> Result<Vec<User>, RepositoryError> {
        let rows = sqlx::query_as::<_, UserRow>(concat!(
            user_select!(),
            " WHERE r.name = 'user' AND u.slug IS NOT NULL ORDER BY u.name ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn find_creator(&self, slug: &Slug) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(concat!(
            user_select!(),
            " WHERE u.slug = $1 AND r.name = 'user'"
        ))
        .bind(slug.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }
}

#[async_trait]
impl PodcastStore for PgStore {
    async fn create_podcast(&self, new: NewPodcast) -> Result<Podcast, RepositoryError> {
        let row = sqlx::query_as::<_, PodcastRow>(
            "INSERT INTO podcasts (name, url, description, user_id) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, name, url, description, user_id, created_at",
        )
        .bind(&new.name)
        .bind(&new.url)
        .bind(&new.description)
        .bind(new.user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_or_database(e, "podcast"))?;

        Ok(row.into())
    }

    async fn podcast_name_taken(&self, name: &str) -> Result<bool, RepositoryError> {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM podcasts WHERE name = $1)")
                .bind(name)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn podcasts_by_owner(&self, owner: UserId) -> Result<Vec<Podcast>, RepositoryError> {
        let rows = sqlx::query_as::<_, PodcastRow>(
            "SELECT id, name, url, description, user_id, created_at \
             FROM podcasts WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn recent_podcasts(&self, limit: i64) -> Result<Vec<PodcastWithOwner>, RepositoryError> {
        let rows = sqlx::query_as::<_, PodcastWithOwnerRow>(
            "SELECT p.id, p.name, p.url, p.description, p.user_id, p.created_at, \
                    u.name AS owner_name \
             FROM podcasts p JOIN users u ON u.id = p.user_id \
             ORDER BY p.created_at DESC, p.id DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| PodcastWithOwner {
                podcast: r.podcast.into(),
                owner_name: r.owner_name,
            })
            .collect())
    }

    async fn count_podcasts(&self) -> Result<i64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM podcasts")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl AgendaStore for PgStore {
    async fn create_slot(&self, new: NewTimeSlot) -> Result<TimeSlot, RepositoryError> {
        let row = sqlx::query_as::<_, SlotRow>(&format!(
            "INSERT INTO available_slots (starts_at, duration_minutes, description) \
             VALUES ($1, $2, $3) RETURNING {SLOT_COLUMNS}"
        ))
        .bind(new.starts_at)
        .bind(new.duration_minutes)
        .bind(new.description)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn get_slot(&self, id: SlotId) -> Result<Option<SlotWithBooking>, RepositoryError> {
        let row = sqlx::query_as::<_, SlotWithBookingRow>(concat!(slot_select!(), " WHERE s.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    async fn list_slots(&self) -> Result<Vec<SlotWithBooking>, RepositoryError> {
        let rows = sqlx::query_as::<_, SlotWithBookingRow>(concat!(
            slot_select!(),
            " ORDER BY s.starts_at ASC, s.id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn open_slots(&self, now: DateTime<Utc>) -> Result<Vec<TimeSlot>, RepositoryError> {
        let rows = sqlx::query_as::<_, SlotRow>(&format!(
            "SELECT {SLOT_COLUMNS} FROM available_slots s \
             WHERE s.is_available AND s.starts_at > $1 \
               AND NOT EXISTS (SELECT 1 FROM appointments a WHERE a.slot_id = s.id) \
             ORDER BY s.starts_at ASC, s.id ASC"
        ))
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn delete_slot(&self, id: SlotId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM available_slots WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn toggle_slot(&self, id: SlotId) -> Result<TimeSlot, RepositoryError> {
        let row = sqlx::query_as::<_, SlotRow>(&format!(
            "UPDATE available_slots SET is_available = NOT is_available \
             WHERE id = $1 RETURNING {SLOT_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    async fn create_appointment(
        &self,
        user: UserId,
        slot: SlotId,
        state: AppointmentState,
    ) -> Result<Appointment, RepositoryError> {
        let row = sqlx::query_as::<_, AppointmentRow>(&format!(
            "INSERT INTO appointments (user_id, slot_id, state) \
             VALUES ($1, $2, $3) RETURNING {APPOINTMENT_COLUMNS}"
        ))
        .bind(user)
        .bind(slot)
        .bind(state)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_or_database(e, "appointment for this slot"))?;

        Ok(row.into())
    }

    async fn find_appointment(
        &self,
        user: UserId,
        slot: SlotId,
    ) -> Result<Option<Appointment>, RepositoryError> {
        let row = sqlx::query_as::<_, AppointmentRow>(&format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE user_id = $1 AND slot_id = $2"
        ))
        .bind(user)
        .bind(slot)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn list_appointments(&self) -> Result<Vec<AppointmentDetail>, RepositoryError> {
        let rows = sqlx::query_as::<_, AppointmentDetailRow>(concat!(
            appointment_detail_select!(),
            " ORDER BY s.starts_at DESC, a.id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn appointments_for_user(
        &self,
        user: UserId,
    ) -> Result<Vec<AppointmentDetail>, RepositoryError> {
        let rows = sqlx::query_as::<_, AppointmentDetailRow>(concat!(
            appointment_detail_select!(),
            " WHERE a.user_id = $1 ORDER BY s.starts_at DESC, a.id DESC"
        ))
        .bind(user)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn set_appointment_state(
        &self,
        id: AppointmentId,
        state: AppointmentState,
    ) -> Result<Appointment, RepositoryError> {
        let row = sqlx::query_as::<_, AppointmentRow>(&format!(
            "UPDATE appointments SET state = $2 WHERE id = $1 RETURNING {APPOINTMENT_COLUMNS}"
        ))
        .bind(id)
        .bind(state)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }
}

#[async_trait]
impl Repository for PgStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
