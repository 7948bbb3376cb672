//! Public creator directory.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;

use podcast_core::Slug;

use crate::error::{AppError, Result};
use crate::middleware::OptionalSession;
use crate::models::{User, UserWithPodcasts};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct DirectoryView {
    pub creators: Vec<UserWithPodcasts>,
    pub total_creators: usize,
    pub total_podcasts: usize,
}

#[derive(Debug, Serialize)]
pub struct CreatorView {
    #[serde(flatten)]
    pub creator: UserWithPodcasts,
    pub profile_url: String,
    /// The viewer is signed in as this creator.
    pub is_own_page: bool,
}

async fn with_podcasts(state: &AppState, user: User) -> Result<UserWithPodcasts> {
    let podcasts = state.repo().podcasts_by_owner(user.id).await?;
    Ok(UserWithPodcasts { user, podcasts })
}

/// Every creator with a public page, ordered by name, each with their
/// podcasts newest first.
pub async fn index(State(state): State<AppState>) -> Result<Json<DirectoryView>> {
    let users = state.repo().list_creators().await?;

    let mut creators = Vec::with_capacity(users.len());
    for user in users {
        creators.push(with_podcasts(&state, user).await?);
    }
    let total_podcasts = creators.iter().map(|c| c.podcasts.len()).sum();

    Ok(Json(DirectoryView {
        total_creators: creators.len(),
        total_podcasts,
        creators,
    }))
}

/// One creator's public page.
pub async fn show(
    State(state): State<AppState>,
    OptionalSession(viewer): OptionalSession,
    Path(raw): Path<String>,
) -> Result<Json<CreatorView>> {
    let not_found = || AppError::NotFound(format!("No creator at /podcast/{raw}"));

    let slug = Slug::parse(&raw).map_err(|_| not_found())?;
    let user = state
        .repo()
        .find_creator(&slug)
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(CreatorView {
        profile_url: state.config().profile_url(&slug),
        is_own_page: viewer.is_some_and(|claim| claim.user_id == user.id),
        creator: with_podcasts(&state, user).await?,
    }))
}
