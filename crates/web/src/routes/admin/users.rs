//! Account management.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;

use podcast_core::Role;

use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::routes::extract::{JsonOrForm, required};
use crate::services::auth::NewAccount;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

/// All accounts, ordered by name.
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> Result<Json<serde_json::Value>> {
    let users = state.repo().list_users().await?;
    Ok(Json(json!({ "success": true, "users": users })))
}

/// Create an account of either role.
///
/// Creators (`user` role) need a profile image and get a public page; the
/// response carries its URL.
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    JsonOrForm(body): JsonOrForm<CreateUserRequest>,
) -> Result<Response> {
    let name = required(body.name.as_deref(), "name")?;
    let email = required(body.email.as_deref(), "email")?;
    let password = body
        .password
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::BadRequest("password is required".to_owned()))?;
    let role: Role = required(body.role.as_deref(), "role")?
        .parse()
        .map_err(|e: podcast_core::RoleError| AppError::BadRequest(e.to_string()))?;

    let image = match role {
        Role::User => Some(required(body.image.as_deref(), "image")?),
        Role::Admin => body.image.as_deref().map(str::trim).filter(|i| !i.is_empty()),
    };

    let user = state
        .auth()
        .create_account(NewAccount {
            name,
            email,
            password,
            role,
            image,
        })
        .await?;

    tracing::info!(admin_id = %admin.user_id, user_id = %user.id, "account created by administrator");

    let profile_url = user.slug.as_ref().map(|slug| state.config().profile_url(slug));
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "user": user,
            "profile_url": profile_url,
        })),
    )
        .into_response())
}
