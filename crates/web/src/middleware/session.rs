//! Cookie-backed session store.
//!
//! The session token lives in a single `HttpOnly`, `SameSite=Lax` cookie
//! scoped to `/`. Nothing is kept server-side.

use std::convert::Infallible;

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;

use podcast_core::{SESSION_TTL_SECONDS, SessionStore};

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "session-token";

/// Session cookie carrying `token`, valid for the full session lifetime.
#[must_use]
pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(Duration::seconds(SESSION_TTL_SECONDS))
        .build()
}

/// Empty, already-expired session cookie that makes the browser drop it.
#[must_use]
pub fn clear_session_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, String::new()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(Duration::seconds(0))
        .build()
}

/// [`SessionStore`] over a request's cookie jar.
///
/// Changes are staged in the jar; return [`CookieSessionStore::into_jar`]
/// from the handler so the `Set-Cookie` headers reach the client.
#[derive(Debug, Clone, Default)]
pub struct CookieSessionStore {
    jar: CookieJar,
    secure: bool,
}

impl CookieSessionStore {
    /// Wrap a jar. `secure` sets the `Secure` attribute (production only).
    #[must_use]
    pub const fn new(jar: CookieJar, secure: bool) -> Self {
        Self { jar, secure }
    }

    #[must_use]
    pub fn into_jar(self) -> CookieJar {
        self.jar
    }
}

impl SessionStore for CookieSessionStore {
    type Value = String;
    type Error = Infallible;

    fn persist(&mut self, token: String) -> Result<(), Infallible> {
        let jar = std::mem::take(&mut self.jar);
        self.jar = jar.add(session_cookie(token, self.secure));
        Ok(())
    }

    fn retrieve(&self) -> Option<String> {
        self.jar
            .get(SESSION_COOKIE_NAME)
            .map(|c| c.value().to_owned())
            .filter(|v| !v.is_empty())
    }

    fn clear(&mut self) -> Result<(), Infallible> {
        let jar = std::mem::take(&mut self.jar);
        self.jar = jar.add(clear_session_cookie(self.secure));
        Ok(())
    }
}
