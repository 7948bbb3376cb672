//! Authorization gate.
//!
//! Runs once per request, before any handler. It reads the session cookie,
//! decodes the token, classifies the path, and either lets the request through
//! (with the decoded [`SessionClaim`] in its extensions) or turns it away:
//! pages are redirected to the login page, `/api/*` calls get a 401.
//!
//! | paths | access |
//! |---|---|
//! | `/admin*`, `/api/admin/*` | `admin` role |
//! | `/user*` | `user` role |
//! | `/dashboard*`, `/api/user/*` | any session |
//! | everything else | public |

use axum::{
    Json,
    extract::{FromRequestParts, OriginalUri, Request, State},
    http::{StatusCode, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde_json::json;

use podcast_core::{Role, SessionClaim, SessionStore};

use super::session::CookieSessionStore;
use crate::state::AppState;

/// Where unauthenticated page requests are sent.
pub const LOGIN_PATH: &str = "/password/login";

/// What a path requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    /// Any valid session.
    Authenticated,
    /// A valid session with exactly this role.
    Role(Role),
}

/// Outcome of [`authorize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    RedirectTo(&'static str),
}

/// `path` equals `prefix` or lies below it.
fn under(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Classify a request path.
#[must_use]
pub fn classify(path: &str) -> Access {
    if under(path, "/admin") || under(path, "/api/admin") {
        Access::Role(Role::Admin)
    } else if under(path, "/user") {
        Access::Role(Role::User)
    } else if under(path, "/dashboard") || under(path, "/api/user") {
        Access::Authenticated
    } else {
        Access::Public
    }
}

/// Decide whether a request with `claim` may reach a resource needing `access`.
///
/// `claim` must already be decoded and unexpired; pass `None` otherwise.
#[must_use]
pub fn authorize(claim: Option<&SessionClaim>, access: Access) -> Decision {
    let allowed = match access {
        Access::Public => true,
        Access::Authenticated => claim.is_some(),
        Access::Role(role) => claim.is_some_and(|c| c.role == role),
    };

    if allowed {
        Decision::Allow
    } else {
        Decision::RedirectTo(LOGIN_PATH)
    }
}

fn is_api(path: &str) -> bool {
    path.starts_with("/api/")
}

fn unauthorized_json() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "success": false, "message": "Not authenticated" })),
    )
        .into_response()
}

/// Middleware applying [`classify`] and [`authorize`] to every request.
pub async fn session_gate(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let store = CookieSessionStore::new(jar, state.config().is_production());

    let claim = store.retrieve().and_then(|token| {
        state
            .tokens()
            .decode(&token)
            .inspect_err(|e| tracing::debug!(error = %e, "rejected session token"))
            .ok()
    });

    let path = request.uri().path().to_owned();
    match authorize(claim.as_ref(), classify(&path)) {
        Decision::Allow => {
            if let Some(claim) = claim {
                request.extensions_mut().insert(claim);
            }
            next.run(request).await
        }
        Decision::RedirectTo(target) => {
            tracing::debug!(path = %path, "session required");
            if is_api(&path) {
                unauthorized_json()
            } else {
                Redirect::to(target).into_response()
            }
        }
    }
}

// =============================================================================
// Extractors
// =============================================================================

/// Error returned when a handler needs a session the request does not have.
pub enum AuthRejection {
    /// Redirect to login page (for page requests).
    RedirectToLogin,
    /// Unauthorized response (for API requests).
    Unauthorized,
}

impl AuthRejection {
    /// Nested routers see a stripped `uri`, so prefer the original one.
    fn for_request(parts: &Parts) -> Self {
        let path = parts
            .extensions
            .get::<OriginalUri>()
            .map_or_else(|| parts.uri.path(), |uri| uri.0.path());
        if is_api(path) {
            Self::Unauthorized
        } else {
            Self::RedirectToLogin
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to(LOGIN_PATH).into_response(),
            Self::Unauthorized => unauthorized_json(),
        }
    }
}

/// Extractor for the session the gate decoded.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireSession(claim): RequireSession,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", claim.name)
/// }
/// ```
pub struct RequireSession(pub SessionClaim);

impl<S> FromRequestParts<S> for RequireSession
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionClaim>()
            .cloned()
            .map(Self)
            .ok_or_else(|| AuthRejection::for_request(parts))
    }
}

/// Extractor that optionally gets the current session.
pub struct OptionalSession(pub Option<SessionClaim>);

impl<S> FromRequestParts<S> for OptionalSession
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<SessionClaim>().cloned()))
    }
}

/// Extractor requiring an administrator session.
///
/// A session with another role is treated like no session at all.
pub struct RequireAdmin(pub SessionClaim);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let RequireSession(claim) = RequireSession::from_request_parts(parts, state).await?;
        if claim.role != Role::Admin {
            return Err(AuthRejection::for_request(parts));
        }
        Ok(Self(claim))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use podcast_core::{Email, UserId};

    use super::*;

    fn claim(role: Role) -> SessionClaim {
        SessionClaim::new(
            UserId::new(1),
            Email::parse("someone@example.com").unwrap(),
            "Someone".to_owned(),
            role,
            Utc::now(),
        )
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("/"), Access::Public);
        assert_eq!(classify("/podcast"), Access::Public);
        assert_eq!(classify("/podcast/josenunez"), Access::Public);
        assert_eq!(classify("/password/login"), Access::Public);
        assert_eq!(classify("/api/auth/login"), Access::Public);
        assert_eq!(classify("/health"), Access::Public);

        assert_eq!(classify("/admin"), Access::Role(Role::Admin));
        assert_eq!(classify("/admin/dashboard"), Access::Role(Role::Admin));
        assert_eq!(classify("/api/admin/users/create"), Access::Role(Role::Admin));
        assert_eq!(classify("/user/dashboard"), Access::Role(Role::User));
        assert_eq!(classify("/dashboard"), Access::Authenticated);
        assert_eq!(classify("/api/user/appointments/request"), Access::Authenticated);
    }

    #[test]
    fn test_classify_matches_whole_segments() {
        assert_eq!(classify("/administrator"), Access::Public);
        assert_eq!(classify("/users-guide"), Access::Public);
    }

    #[test]
    fn test_public_allows_without_session() {
        assert_eq!(authorize(None, Access::Public), Decision::Allow);
    }

    #[test]
    fn test_protected_requires_session() {
        assert_eq!(
            authorize(None, Access::Authenticated),
            Decision::RedirectTo(LOGIN_PATH)
        );
        assert_eq!(
            authorize(Some(&claim(Role::User)), Access::Authenticated),
            Decision::Allow
        );
    }

    #[test]
    fn test_role_mismatch_redirects_to_login() {
        assert_eq!(
            authorize(Some(&claim(Role::User)), Access::Role(Role::Admin)),
            Decision::RedirectTo(LOGIN_PATH)
        );
        assert_eq!(
            authorize(Some(&claim(Role::Admin)), Access::Role(Role::User)),
            Decision::RedirectTo(LOGIN_PATH)
        );
        assert_eq!(
            authorize(Some(&claim(Role::Admin)), Access::Role(Role::Admin)),
            Decision::Allow
        );
    }
}
