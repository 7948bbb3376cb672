//! Agenda domain types: bookable time slots and the appointments made on them.

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

use podcast_core::{AppointmentId, AppointmentState, SlotId, UserId};

/// A window an administrator opened for recording sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeSlot {
    pub id: SlotId,
    pub starts_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub description: Option<String>,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
}

impl TimeSlot {
    #[must_use]
    pub fn ends_at(&self) -> DateTime<Utc> {
        self.starts_at + TimeDelta::minutes(i64::from(self.duration_minutes))
    }
}

#[derive(Debug, Clone)]
pub struct NewTimeSlot {
    pub starts_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub description: Option<String>,
}

/// A booking of one slot by one user. A slot holds at most one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Appointment {
    pub id: AppointmentId,
    pub user_id: UserId,
    pub slot_id: SlotId,
    pub state: AppointmentState,
    pub created_at: DateTime<Utc>,
}

/// An appointment joined with the slot it books and the requester's name.
#[derive(Debug, Clone, Serialize)]
pub struct AppointmentDetail {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub user_name: String,
    pub user_email: String,
    pub slot: TimeSlot,
}

/// A slot with the appointment booked on it, if any.
#[derive(Debug, Clone, Serialize)]
pub struct SlotWithBooking {
    #[serde(flatten)]
    pub slot: TimeSlot,
    pub booked_by: Option<String>,
}

impl SlotWithBooking {
    #[must_use]
    pub const fn is_booked(&self) -> bool {
        self.booked_by.is_some()
    }
}
