//! Domain models.
//!
//! These are validated domain objects, separate from the database row types
//! in [`crate::db::postgres`]. They serialize directly into the JSON views.

pub mod agenda;
pub mod podcast;
pub mod user;

pub use agenda::{Appointment, AppointmentDetail, NewTimeSlot, SlotWithBooking, TimeSlot};
pub use podcast::{NewPodcast, Podcast, PodcastWithOwner};
pub use user::{CredentialRecord, NewUser, User, UserWithPodcasts};
