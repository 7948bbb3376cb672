//! In-process repository.
//!
//! Mirrors the `PostgreSQL` constraints (unique names, emails, slugs and one
//! appointment per slot) so handlers behave the same against either store.
//! Used by unit and end-to-end tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use podcast_core::{
    AppointmentId, AppointmentState, Email, PodcastId, Role, SlotId, Slug, UserId,
};

use super::{AgendaStore, PodcastStore, Repository, RepositoryError, UserStore};
use crate::models::{
    Appointment, AppointmentDetail, CredentialRecord, NewPodcast, NewTimeSlot, NewUser, Podcast,
    PodcastWithOwner, SlotWithBooking, TimeSlot, User,
};

#[derive(Default)]
struct Tables {
    users: Vec<CredentialRecord>,
    podcasts: Vec<Podcast>,
    slots: Vec<TimeSlot>,
    appointments: Vec<Appointment>,
    next_id: i32,
}

impl Tables {
    const fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn user(&self, id: UserId) -> Option<&User> {
        self.users.iter().map(|c| &c.user).find(|u| u.id == id)
    }

    fn booking(&self, slot: SlotId) -> Option<&Appointment> {
        self.appointments.iter().find(|a| a.slot_id == slot)
    }

    fn with_booking(&self, slot: &TimeSlot) -> SlotWithBooking {
        let booked_by = self
            .booking(slot.id)
            .and_then(|a| self.user(a.user_id))
            .map(|u| u.name.clone());
        SlotWithBooking {
            slot: slot.clone(),
            booked_by,
        }
    }

    fn detail(&self, appointment: &Appointment) -> Option<AppointmentDetail> {
        let user = self.user(appointment.user_id)?;
        let slot = self.slots.iter().find(|s| s.id == appointment.slot_id)?;
        Some(AppointmentDetail {
            appointment: appointment.clone(),
            user_name: user.name.clone(),
            user_email: user.email.to_string(),
            slot: slot.clone(),
        })
    }
}

/// Repository holding everything in memory behind a `tokio` lock.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Newest first, with the later id winning ties.
fn newest_first<T>(items: &mut [T], key: impl Fn(&T) -> (DateTime<Utc>, i32)) {
    items.sort_by(|a, b| key(b).cmp(&key(a)));
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<CredentialRecord>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|c| &c.user.email == email).cloned())
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.tables.read().await.user(id).cloned())
    }

    async fn user_exists(&self, name: &str, email: &Email) -> Result<bool, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .any(|c| c.user.name == name || &c.user.email == email))
    }

    async fn create_user(&self, new: NewUser) -> Result<User, RepositoryError> {
        let mut tables = self.tables.write().await;
        let taken = tables.users.iter().any(|c| {
            c.user.name == new.name
                || c.user.email == new.email
                || (new.slug.is_some() && c.user.slug == new.slug)
        });
        if taken {
            return Err(RepositoryError::Conflict("user already exists".to_owned()));
        }

        let now = Utc::now();
        let user = User {
            id: UserId::new(tables.next_id()),
            name: new.name,
            email: new.email,
            role: new.role,
            image: new.image,
            slug: new.slug,
            created_at: now,
            updated_at: now,
        };
        tables.users.push(CredentialRecord {
            user: user.clone(),
            password_hash: new.password_hash,
        });
        Ok(user)
    }

    async fn list_users(&self) -> Result<Vec<User>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut users: Vec<User> = tables.users.iter().map(|c| c.user.clone()).collect();
        users.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(users)
    }

    async fn recent_users(&self, limit: i64) -> Result<Vec<User>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut users: Vec<User> = tables.users.iter().map(|c| c.user.clone()).collect();
        newest_first(&mut users, |u| (u.created_at, u.id.as_i32()));
        users.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(users)
    }

    async fn count_users(&self) -> Result<i64, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(i64::try_from(tables.users.len()).unwrap_or(i64::MAX))
    }

    async fn list_creators(&self) -> Result<Vec<User>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut creators: Vec<User> = tables
            .users
            .iter()
            .map(|c| &c.user)
            .filter(|u| u.role == Role::User && u.slug.is_some())
            .cloned()
            .collect();
        creators.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(creators)
    }

    async fn find_creator(&self, slug: &Slug) -> Result<Option<User>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .map(|c| &c.user)
            .find(|u| u.role == Role::User && u.slug.as_ref() == Some(slug))
            .cloned())
    }
}

#[async_trait]
impl PodcastStore for MemoryStore {
    async fn create_podcast(&self, new: NewPodcast) -> Result<Podcast, RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.podcasts.iter().any(|p| p.name == new.name) {
            return Err(RepositoryError::Conflict("podcast already exists".to_owned()));
        }
        if tables.user(new.user_id).is_none() {
            return Err(RepositoryError::NotFound);
        }

        let podcast = Podcast {
            id: PodcastId::new(tables.next_id()),
            name: new.name,
            url: new.url,
            description: new.description,
            user_id: new.user_id,
            created_at: Utc::now(),
        };
        tables.podcasts.push(podcast.clone());
        Ok(podcast)
    }

    async fn podcast_name_taken(&self, name: &str) -> Result<bool, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.podcasts.iter().any(|p| p.name == name))
    }

    async fn podcasts_by_owner(&self, owner: UserId) -> Result<Vec<Podcast>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut podcasts: Vec<Podcast> = tables
            .podcasts
            .iter()
            .filter(|p| p.user_id == owner)
            .cloned()
            .collect();
        newest_first(&mut podcasts, |p| (p.created_at, p.id.as_i32()));
        Ok(podcasts)
    }

    async fn recent_podcasts(&self, limit: i64) -> Result<Vec<PodcastWithOwner>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut podcasts = tables.podcasts.clone();
        newest_first(&mut podcasts, |p| (p.created_at, p.id.as_i32()));
        podcasts.truncate(usize::try_from(limit).unwrap_or(0));

        Ok(podcasts
            .into_iter()
            .map(|podcast| {
                let owner_name = tables
                    .user(podcast.user_id)
                    .map(|u| u.name.clone())
                    .unwrap_or_default();
                PodcastWithOwner {
                    podcast,
                    owner_name,
                }
            })
            .collect())
    }

    async fn count_podcasts(&self) -> Result<i64, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(i64::try_from(tables.podcasts.len()).unwrap_or(i64::MAX))
    }
}

#[async_trait]
impl AgendaStore for MemoryStore {
    async fn create_slot(&self, new: NewTimeSlot) -> Result<TimeSlot, RepositoryError> {
        let mut tables = self.tables.write().await;
        let slot = TimeSlot {
            id: SlotId::new(tables.next_id()),
            starts_at: new.starts_at,
            duration_minutes: new.duration_minutes,
            description: new.description,
            is_available: true,
            created_at: Utc::now(),
        };
        tables.slots.push(slot.clone());
        Ok(slot)
    }

    async fn get_slot(&self, id: SlotId) -> Result<Option<SlotWithBooking>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .slots
            .iter()
            .find(|s| s.id == id)
            .map(|s| tables.with_booking(s)))
    }

    async fn list_slots(&self) -> Result<Vec<SlotWithBooking>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut slots: Vec<SlotWithBooking> =
            tables.slots.iter().map(|s| tables.with_booking(s)).collect();
        slots.sort_by_key(|s| (s.slot.starts_at, s.slot.id));
        Ok(slots)
    }

    async fn open_slots(&self, now: DateTime<Utc>) -> Result<Vec<TimeSlot>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut slots: Vec<TimeSlot> = tables
            .slots
            .iter()
            .filter(|s| s.is_available && s.starts_at > now && tables.booking(s.id).is_none())
            .cloned()
            .collect();
        slots.sort_by_key(|s| (s.starts_at, s.id));
        Ok(slots)
    }

    async fn delete_slot(&self, id: SlotId) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        let before = tables.slots.len();
        tables.slots.retain(|s| s.id != id);
        if tables.slots.len() == before {
            return Err(RepositoryError::NotFound);
        }
        tables.appointments.retain(|a| a.slot_id != id);
        Ok(())
    }

    async fn toggle_slot(&self, id: SlotId) -> Result<TimeSlot, RepositoryError> {
        let mut tables = self.tables.write().await;
        let slot = tables
            .slots
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(RepositoryError::NotFound)?;
        slot.is_available = !slot.is_available;
        Ok(slot.clone())
    }

    async fn create_appointment(
        &self,
        user: UserId,
        slot: SlotId,
        state: AppointmentState,
    ) -> Result<Appointment, RepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables.slots.iter().any(|s| s.id == slot) || tables.user(user).is_none() {
            return Err(RepositoryError::NotFound);
        }
        if tables.booking(slot).is_some() {
            return Err(RepositoryError::Conflict(
                "appointment for this slot already exists".to_owned(),
            ));
        }

        let appointment = Appointment {
            id: AppointmentId::new(tables.next_id()),
            user_id: user,
            slot_id: slot,
            state,
            created_at: Utc::now(),
        };
        tables.appointments.push(appointment.clone());
        Ok(appointment)
    }

    async fn find_appointment(
        &self,
        user: UserId,
        slot: SlotId,
    ) -> Result<Option<Appointment>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .appointments
            .iter()
            .find(|a| a.user_id == user && a.slot_id == slot)
            .cloned())
    }

    async fn list_appointments(&self) -> Result<Vec<AppointmentDetail>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut details: Vec<AppointmentDetail> = tables
            .appointments
            .iter()
            .filter_map(|a| tables.detail(a))
            .collect();
        newest_first(&mut details, |d| (d.slot.starts_at, d.appointment.id.as_i32()));
        Ok(details)
    }

    async fn appointments_for_user(
        &self,
        user: UserId,
    ) -> Result<Vec<AppointmentDetail>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut details: Vec<AppointmentDetail> = tables
            .appointments
            .iter()
            .filter(|a| a.user_id == user)
            .filter_map(|a| tables.detail(a))
            .collect();
        newest_first(&mut details, |d| (d.slot.starts_at, d.appointment.id.as_i32()));
        Ok(details)
    }

    async fn set_appointment_state(
        &self,
        id: AppointmentId,
        state: AppointmentState,
    ) -> Result<Appointment, RepositoryError> {
        let mut tables = self.tables.write().await;
        let appointment = tables
            .appointments
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(RepositoryError::NotFound)?;
        appointment.state = state;
        Ok(appointment.clone())
    }
}

#[async_trait]
impl Repository for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}
