//! Authentication route handlers.
//!
//! Login and registration take JSON or form bodies and answer with JSON.
//! Logout always clears the cookie and sends the browser back to the login page.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use serde_json::json;

use podcast_core::{Email, Role, SessionClaim, SessionStore, UserId};

use super::extract::{JsonOrForm, required};
use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::gate::LOGIN_PATH;
use crate::middleware::{CookieSessionStore, RequireSession};
use crate::services::auth::AuthError;
use crate::state::AppState;

// =============================================================================
// Request / Response Types
// =============================================================================

/// Login body. `identifier` is accepted as an alias for `email`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default, alias = "identifier")]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Self sign-up body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// The public view of a session.
#[derive(Debug, Serialize)]
pub struct SessionUser {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub role: Role,
}

impl From<SessionClaim> for SessionUser {
    fn from(claim: SessionClaim) -> Self {
        Self {
            id: claim.user_id,
            name: claim.name,
            email: claim.email,
            role: claim.role,
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Verify credentials, issue a session token and set the session cookie.
///
/// # Errors
///
/// 400 when a field is missing, 401 with a generic message when the pair does
/// not match an account. No cookie is set on failure.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    JsonOrForm(body): JsonOrForm<LoginRequest>,
) -> Result<(CookieJar, Json<serde_json::Value>)> {
    let (Some(email), Some(password)) = (body.email, body.password) else {
        return Err(AppError::BadRequest(
            "email and password are required".to_owned(),
        ));
    };

    let claim = match state.auth().verify(&email, &password).await {
        Ok(claim) => claim,
        Err(AuthError::InvalidCredentials) => {
            tracing::warn!("login failed: invalid credentials");
            return Err(AuthError::InvalidCredentials.into());
        }
        Err(e) => return Err(e.into()),
    };

    let token = state.tokens().encode(&claim)?;
    let mut store = CookieSessionStore::new(jar, state.config().is_production());
    let Ok(()) = store.persist(token);

    set_sentry_user(&claim.user_id, Some(claim.email.as_str()));
    tracing::info!(user_id = %claim.user_id, role = %claim.role, "login succeeded");

    Ok((
        store.into_jar(),
        Json(json!({
            "success": true,
            "user": SessionUser::from(claim),
        })),
    ))
}

/// Clear the session cookie and return to the login page.
///
/// Works with or without a session.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> Response {
    let mut store = CookieSessionStore::new(jar, state.config().is_production());
    let Ok(()) = store.clear();
    clear_sentry_user();

    (store.into_jar(), Redirect::to(LOGIN_PATH)).into_response()
}

/// Self sign-up as a `user`.
///
/// # Errors
///
/// 400 on missing or invalid fields, 409 when the name or email is taken.
pub async fn register(
    State(state): State<AppState>,
    JsonOrForm(body): JsonOrForm<RegisterRequest>,
) -> Result<Response> {
    let name = required(body.name.as_deref(), "name")?;
    let email = required(body.email.as_deref(), "email")?;
    let password = body
        .password
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::BadRequest("password is required".to_owned()))?;

    let user = state.auth().register(name, email, password).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Account created",
            "user_id": user.id,
        })),
    )
        .into_response())
}

/// The account behind the current session.
///
/// # Errors
///
/// 401 when the account no longer exists.
pub async fn me(
    State(state): State<AppState>,
    RequireSession(claim): RequireSession,
) -> Result<Json<serde_json::Value>> {
    let user = state.auth().current_user(&claim).await?;
    Ok(Json(json!({
        "success": true,
        "user": user,
        "expires_at": claim.expires_at(),
    })))
}
