//! Creator agenda.

use axum::{Json, extract::State};
use chrono::Utc;
use serde::Serialize;

use crate::error::Result;
use crate::middleware::RequireSession;
use crate::models::{AppointmentDetail, TimeSlot};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct UserAgendaView {
    /// Available, in the future and not yet booked.
    pub open_slots: Vec<TimeSlot>,
    pub appointments: Vec<AppointmentDetail>,
}

pub async fn show(
    State(state): State<AppState>,
    RequireSession(claim): RequireSession,
) -> Result<Json<UserAgendaView>> {
    let repo = state.repo();
    Ok(Json(UserAgendaView {
        open_slots: repo.open_slots(Utc::now()).await?,
        appointments: repo.appointments_for_user(claim.user_id).await?,
    }))
}
