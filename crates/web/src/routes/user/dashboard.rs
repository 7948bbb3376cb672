//! Creator dashboard.

use axum::{Json, extract::State};

use crate::error::Result;
use crate::middleware::RequireSession;
use crate::models::UserWithPodcasts;
use crate::state::AppState;

/// The signed-in creator's profile and podcasts, newest first.
pub async fn show(
    State(state): State<AppState>,
    RequireSession(claim): RequireSession,
) -> Result<Json<UserWithPodcasts>> {
    let user = state.auth().current_user(&claim).await?;
    let podcasts = state.repo().podcasts_by_owner(user.id).await?;
    Ok(Json(UserWithPodcasts { user, podcasts }))
}
