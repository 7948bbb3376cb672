//! Agenda management: opening slots and ruling on appointments.
//!
//! Actions are plain form posts that redirect back to the agenda views.

use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{Path, State},
    response::Redirect,
};
use chrono::{NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use podcast_core::{AppointmentId, AppointmentState, SlotId};

use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{AppointmentDetail, NewTimeSlot, SlotWithBooking};
use crate::routes::extract::{JsonOrForm, required};
use crate::state::AppState;

const AGENDA_PATH: &str = "/admin/agenda";
const AVAILABLE_PATH: &str = "/admin/agenda/available";

// =============================================================================
// Views
// =============================================================================

#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct AppointmentStats {
    pub approved: usize,
    pub rejected: usize,
    pub pending: usize,
    pub total: usize,
}

impl AppointmentStats {
    fn tally(appointments: &[AppointmentDetail]) -> Self {
        appointments
            .iter()
            .fold(Self::default(), |mut stats, detail| {
                match detail.appointment.state {
                    AppointmentState::Approved => stats.approved += 1,
                    AppointmentState::Rejected => stats.rejected += 1,
                    AppointmentState::Pending => stats.pending += 1,
                }
                stats.total += 1;
                stats
            })
    }
}

#[derive(Debug, Serialize)]
pub struct AgendaView {
    pub stats: AppointmentStats,
    /// Latest slot first.
    pub appointments: Vec<AppointmentDetail>,
    /// Earliest slot first.
    pub slots: Vec<SlotWithBooking>,
}

#[derive(Debug, Serialize)]
pub struct AgendaDay {
    pub date: NaiveDate,
    pub slots: Vec<SlotWithBooking>,
}

/// Appointments and slots with booking stats.
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> Result<Json<AgendaView>> {
    let appointments = state.repo().list_appointments().await?;
    let slots = state.repo().list_slots().await?;

    Ok(Json(AgendaView {
        stats: AppointmentStats::tally(&appointments),
        appointments,
        slots,
    }))
}

fn group_by_day(slots: Vec<SlotWithBooking>) -> Vec<AgendaDay> {
    let mut days: BTreeMap<NaiveDate, Vec<SlotWithBooking>> = BTreeMap::new();
    for slot in slots {
        days.entry(slot.slot.starts_at.date_naive())
            .or_default()
            .push(slot);
    }
    days.into_iter()
        .map(|(date, slots)| AgendaDay { date, slots })
        .collect()
}

/// Slots grouped by calendar day (UTC).
pub async fn available(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> Result<Json<Vec<AgendaDay>>> {
    let slots = state.repo().list_slots().await?;
    Ok(Json(group_by_day(slots)))
}

// =============================================================================
// Actions
// =============================================================================

/// New slot form. `date` is `YYYY-MM-DD`, `time` is `HH:MM` (UTC), `duration`
/// is in minutes.
#[derive(Debug, Deserialize)]
pub struct CreateSlotForm {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

fn parse_time(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .ok()
}

impl CreateSlotForm {
    fn into_new_slot(self) -> Result<NewTimeSlot> {
        let date = NaiveDate::parse_from_str(required(self.date.as_deref(), "date")?, "%Y-%m-%d")
            .map_err(|_| AppError::BadRequest("date must be YYYY-MM-DD".to_owned()))?;
        let time = parse_time(required(self.time.as_deref(), "time")?)
            .ok_or_else(|| AppError::BadRequest("time must be HH:MM".to_owned()))?;
        let duration_minutes = required(self.duration.as_deref(), "duration")?
            .parse::<i32>()
            .ok()
            .filter(|d| *d > 0)
            .ok_or_else(|| {
                AppError::BadRequest("duration must be a positive number of minutes".to_owned())
            })?;

        Ok(NewTimeSlot {
            starts_at: date.and_time(time).and_utc(),
            duration_minutes,
            description: self
                .description
                .map(|d| d.trim().to_owned())
                .filter(|d| !d.is_empty()),
        })
    }
}

/// Open a new slot. Slots cannot start in the past.
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    JsonOrForm(form): JsonOrForm<CreateSlotForm>,
) -> Result<Redirect> {
    let new = form.into_new_slot()?;
    if new.starts_at <= Utc::now() {
        return Err(AppError::BadRequest(
            "slots cannot be created in the past".to_owned(),
        ));
    }

    let slot = state.repo().create_slot(new).await?;
    tracing::info!(slot_id = %slot.id, starts_at = %slot.starts_at, "slot created");

    Ok(Redirect::to(AGENDA_PATH))
}

/// Delete a slot along with any appointment on it.
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<SlotId>,
) -> Result<Redirect> {
    state.repo().delete_slot(id).await?;
    tracing::info!(slot_id = %id, "slot deleted");
    Ok(Redirect::to(AGENDA_PATH))
}

/// Open or close a slot for booking.
pub async fn toggle(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<SlotId>,
) -> Result<Redirect> {
    let slot = state.repo().toggle_slot(id).await?;
    tracing::info!(slot_id = %id, is_available = slot.is_available, "slot toggled");
    Ok(Redirect::to(AVAILABLE_PATH))
}

async fn set_state(
    state: &AppState,
    id: AppointmentId,
    new_state: AppointmentState,
) -> Result<Redirect> {
    state.repo().set_appointment_state(id, new_state).await?;
    tracing::info!(appointment_id = %id, state = %new_state, "appointment updated");
    Ok(Redirect::to(AGENDA_PATH))
}

pub async fn approve(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<AppointmentId>,
) -> Result<Redirect> {
    set_state(&state, id, AppointmentState::Approved).await
}

pub async fn reject(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<AppointmentId>,
) -> Result<Redirect> {
    set_state(&state, id, AppointmentState::Rejected).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::models::TimeSlot;

    fn form(date: &str, time: &str, duration: &str) -> CreateSlotForm {
        CreateSlotForm {
            date: Some(date.to_owned()),
            time: Some(time.to_owned()),
            duration: Some(duration.to_owned()),
            description: Some("  ".to_owned()),
        }
    }

    #[test]
    fn test_form_parses_as_utc() {
        let slot = form("2030-03-04", "09:30", "45").into_new_slot().unwrap();
        assert_eq!(
            slot.starts_at,
            Utc.with_ymd_and_hms(2030, 3, 4, 9, 30, 0).unwrap()
        );
        assert_eq!(slot.duration_minutes, 45);
        assert_eq!(slot.description, None);
    }

    #[test]
    fn test_form_rejects_bad_input() {
        assert!(form("04/03/2030", "09:30", "45").into_new_slot().is_err());
        assert!(form("2030-03-04", "9.30", "45").into_new_slot().is_err());
        assert!(form("2030-03-04", "09:30", "0").into_new_slot().is_err());
        assert!(form("2030-03-04", "09:30", "abc").into_new_slot().is_err());
    }

    #[test]
    fn test_group_by_day() {
        let slot = |id, day, hour| SlotWithBooking {
            slot: TimeSlot {
                id: SlotId::new(id),
                starts_at: Utc.with_ymd_and_hms(2030, 1, day, hour, 0, 0).unwrap(),
                duration_minutes: 30,
                description: None,
                is_available: true,
                created_at: Utc::now(),
            },
            booked_by: None,
        };

        let days = group_by_day(vec![slot(1, 2, 9), slot(2, 1, 15), slot(3, 2, 11)]);
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2030, 1, 1).unwrap());
        assert_eq!(days[1].slots.len(), 2);
    }
}
