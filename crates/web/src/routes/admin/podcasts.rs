//! Podcast management.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;

use podcast_core::{Role, UserId};

use crate::db::RepositoryError;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::NewPodcast;
use crate::routes::extract::{JsonOrForm, required};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreatePodcastRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Create a podcast owned by an existing creator.
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    JsonOrForm(body): JsonOrForm<CreatePodcastRequest>,
) -> Result<Response> {
    let name = required(body.name.as_deref(), "name")?;
    let url = required(body.url.as_deref(), "url")?;
    let description = required(body.description.as_deref(), "description")?;
    let owner_id: UserId = required(body.user_id.as_deref(), "user_id")?
        .parse()
        .map_err(|_| AppError::BadRequest("user_id must be a number".to_owned()))?;

    let repo = state.repo();
    match repo.get_user(owner_id).await? {
        Some(owner) if owner.role == Role::User => {}
        _ => {
            return Err(AppError::BadRequest(
                "owner must be an existing creator account".to_owned(),
            ));
        }
    }

    if repo.podcast_name_taken(name).await? {
        return Err(AppError::Conflict(
            "a podcast with this name already exists".to_owned(),
        ));
    }

    let podcast = repo
        .create_podcast(NewPodcast {
            name: name.to_owned(),
            url: url.to_owned(),
            description: description.to_owned(),
            user_id: owner_id,
        })
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => {
                AppError::Conflict("a podcast with this name already exists".to_owned())
            }
            other => other.into(),
        })?;

    tracing::info!(podcast_id = %podcast.id, owner_id = %owner_id, "podcast created");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "podcast": podcast })),
    )
        .into_response())
}
