//! Role-neutral dashboard entry point.

use axum::response::Redirect;

use podcast_core::Role;

use crate::middleware::RequireSession;

/// Send the session holder to their role's dashboard.
pub async fn dashboard(RequireSession(claim): RequireSession) -> Redirect {
    match claim.role {
        Role::Admin => Redirect::to("/admin/dashboard"),
        Role::User => Redirect::to("/user/dashboard"),
    }
}
