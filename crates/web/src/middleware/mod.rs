//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, error capture)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID
//! 4. Security headers
//! 5. Session gate (decode cookie, classify path, allow or turn away)

pub mod gate;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use gate::{OptionalSession, RequireAdmin, RequireSession, session_gate};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::{CookieSessionStore, SESSION_COOKIE_NAME};
