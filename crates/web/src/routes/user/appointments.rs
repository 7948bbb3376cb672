//! Appointment requests.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;

use podcast_core::{AppointmentState, SlotId};

use crate::db::RepositoryError;
use crate::error::{AppError, Result};
use crate::middleware::RequireSession;
use crate::routes::extract::{JsonOrForm, required};
use crate::services::auth::AuthError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AppointmentRequest {
    #[serde(default, alias = "horario_id")]
    pub slot_id: Option<String>,
}

fn already_booked() -> AppError {
    AppError::BadRequest("this slot is already booked".to_owned())
}

/// Book a slot for the signed-in creator.
///
/// Administrators cannot book. Requests are approved on creation.
pub async fn request(
    State(state): State<AppState>,
    RequireSession(claim): RequireSession,
    JsonOrForm(body): JsonOrForm<AppointmentRequest>,
) -> Result<Response> {
    if claim.is_admin() {
        tracing::debug!(user_id = %claim.user_id, "administrator tried to book a slot");
        return Err(AuthError::Unauthorized.into());
    }

    let slot_id: SlotId = required(body.slot_id.as_deref(), "slot_id")?
        .parse()
        .map_err(|_| AppError::BadRequest("slot_id must be a number".to_owned()))?;

    let repo = state.repo();
    let slot = repo
        .get_slot(slot_id)
        .await?
        .ok_or_else(|| AppError::NotFound("slot not found".to_owned()))?;

    if slot.is_booked() {
        return Err(already_booked());
    }
    if repo.find_appointment(claim.user_id, slot_id).await?.is_some() {
        return Err(AppError::BadRequest(
            "you have already requested this slot".to_owned(),
        ));
    }

    let appointment = repo
        .create_appointment(claim.user_id, slot_id, AppointmentState::Approved)
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => already_booked(),
            other => other.into(),
        })?;

    tracing::info!(
        appointment_id = %appointment.id,
        user_id = %claim.user_id,
        slot_id = %slot_id,
        "appointment requested"
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Appointment requested",
            "appointment": appointment,
            "ends_at": slot.slot.ends_at(),
            "slot": slot.slot,
        })),
    )
        .into_response())
}
