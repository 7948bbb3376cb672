//! Administrator overview.

use axum::{Json, extract::State};
use serde::Serialize;

use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::models::{PodcastWithOwner, User};
use crate::state::AppState;

const RECENT_LIMIT: i64 = 5;

#[derive(Debug, Serialize)]
pub struct DashboardView {
    pub admin_name: String,
    pub total_users: i64,
    pub total_podcasts: i64,
    pub recent_users: Vec<User>,
    pub recent_podcasts: Vec<PodcastWithOwner>,
}

/// Totals plus the most recent accounts and podcasts.
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(claim): RequireAdmin,
) -> Result<Json<DashboardView>> {
    let repo = state.repo();

    Ok(Json(DashboardView {
        admin_name: claim.name,
        total_users: repo.count_users().await?,
        total_podcasts: repo.count_podcasts().await?,
        recent_users: repo.recent_users(RECENT_LIMIT).await?,
        recent_podcasts: repo.recent_podcasts(RECENT_LIMIT).await?,
    }))
}
