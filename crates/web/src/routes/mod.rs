//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                                   - Redirect to /podcast
//! GET  /password/login, /register         - Static entry pages
//!
//! # Auth API
//! POST /api/auth/login                     - Verify credentials, set session cookie
//! POST /api/auth/logout                    - Clear session cookie
//! POST /api/auth/register                  - Self sign-up
//! GET  /api/auth/me                        - Current account
//!
//! # Public
//! GET  /podcast                            - Creator directory
//! GET  /podcast/{slug}                     - Creator page
//!
//! # Any session
//! GET  /dashboard                          - Redirect to the role's dashboard
//! POST /api/user/appointments/request      - Book a slot
//!
//! # Admin
//! GET  /admin/dashboard                    - Totals and recent activity
//! GET  /admin/agenda                       - Appointments and slots
//! GET  /admin/agenda/available             - Slots by day
//! GET  /api/admin/users                    - List accounts
//! POST /api/admin/users/create             - Create account
//! POST /api/admin/podcasts/create          - Create podcast
//! POST /api/admin/agenda/create            - Open slot
//! POST /api/admin/agenda/{id}/delete       - Delete slot
//! POST /api/admin/agenda/{id}/toggle       - Open/close slot
//! POST /api/admin/appointments/{id}/approve
//! POST /api/admin/appointments/{id}/reject
//!
//! # User
//! GET  /user/dashboard                     - Own podcasts
//! GET  /user/agenda                        - Open slots and own appointments
//! ```

pub mod admin;
pub mod auth;
pub mod dashboard;
pub mod extract;
pub mod podcasts;
pub mod user;

use axum::{
    Router,
    response::Redirect,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the auth API router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/register", post(auth::register))
        .route("/me", get(auth::me))
}

/// Create the public podcast directory router.
pub fn podcast_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(podcasts::index))
        .route("/{slug}", get(podcasts::show))
}

/// Create the admin page router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(admin::dashboard::show))
        .route("/agenda", get(admin::agenda::index))
        .route("/agenda/available", get(admin::agenda::available))
}

/// Create the admin API router.
pub fn admin_api_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(admin::users::list))
        .route("/users/create", post(admin::users::create))
        .route("/podcasts/create", post(admin::podcasts::create))
        .route("/agenda/create", post(admin::agenda::create))
        .route("/agenda/{id}/delete", post(admin::agenda::delete))
        .route("/agenda/{id}/toggle", post(admin::agenda::toggle))
        .route(
            "/appointments/{id}/approve",
            post(admin::agenda::approve),
        )
        .route("/appointments/{id}/reject", post(admin::agenda::reject))
}

/// Create the creator page router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(user::dashboard::show))
        .route("/agenda", get(user::agenda::show))
}

/// Create all application routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { Redirect::to("/podcast") }))
        .route("/dashboard", get(dashboard::dashboard))
        .nest("/api/auth", auth_routes())
        .nest("/podcast", podcast_routes())
        .nest("/admin", admin_routes())
        .nest("/api/admin", admin_api_routes())
        .nest("/user", user_routes())
        .route(
            "/api/user/appointments/request",
            post(user::appointments::request),
        )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::{
        Router,
        body::Body,
        http::{Request, Response, StatusCode, header},
    };
    use chrono::{TimeDelta, Utc};
    use secrecy::SecretString;
    use tower::ServiceExt;
    use url::Url;

    use podcast_core::{AppointmentState, Role, SESSION_TTL_SECONDS, SlotId};

    use crate::config::{Environment, WebConfig};
    use crate::db::{AgendaStore, MemoryStore};
    use crate::middleware::SESSION_COOKIE_NAME;
    use crate::models::{NewTimeSlot, User};
    use crate::services::auth::{AuthService, NewAccount};
    use crate::state::AppState;

    fn config() -> WebConfig {
        WebConfig {
            database_url: SecretString::from("postgres://unused"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: Url::parse("http://localhost:3000").unwrap(),
            session_secret: SecretString::from("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6e"),
            environment: Environment::Development,
            sentry_dsn: None,
        }
    }

    struct Harness {
        state: AppState,
        store: Arc<MemoryStore>,
        admin: User,
        creator: User,
    }

    impl Harness {
        async fn new() -> Self {
            let store = Arc::new(MemoryStore::new());
            let auth = AuthService::new(store.as_ref());
            let admin = auth
                .create_account(NewAccount {
                    name: "Admin",
                    email: "admin@example.com",
                    password: "admin123",
                    role: Role::Admin,
                    image: None,
                })
                .await
                .unwrap();
            let creator = auth
                .register("José Núñez", "jose@example.com", "s3cure-pass")
                .await
                .unwrap();

            let state = AppState::new(config(), store.clone());
            Self {
                state,
                store,
                admin,
                creator,
            }
        }

        fn app(&self) -> Router {
            crate::app(self.state.clone())
        }

        fn cookie_for(&self, user: &User) -> String {
            let token = self.state.tokens().encode(&user.to_claim(Utc::now())).unwrap();
            format!("{SESSION_COOKIE_NAME}={token}")
        }

        async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
            let mut req = Request::builder().uri(uri);
            if let Some(cookie) = cookie {
                req = req.header(header::COOKIE, cookie);
            }
            self.app()
                .oneshot(req.body(Body::empty()).unwrap())
                .await
                .unwrap()
        }

        async fn post_form(&self, uri: &str, body: &str, cookie: Option<&str>) -> Response<Body> {
            let mut req = Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
            if let Some(cookie) = cookie {
                req = req.header(header::COOKIE, cookie);
            }
            self.app()
                .oneshot(req.body(Body::from(body.to_owned())).unwrap())
                .await
                .unwrap()
        }

        async fn future_slot(&self) -> SlotId {
            self.store
                .create_slot(NewTimeSlot {
                    starts_at: Utc::now() + TimeDelta::days(3),
                    duration_minutes: 60,
                    description: Some("Grabación".to_owned()),
                })
                .await
                .unwrap()
                .id
        }
    }

    fn location(response: &Response<Body>) -> &str {
        response
            .headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap()
    }

    async fn json(response: Response<Body>) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_root_redirects_to_directory() {
        let h = Harness::new().await;
        let response = h.get("/", None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/podcast");
    }

    #[tokio::test]
    async fn test_public_directory_without_session() {
        let h = Harness::new().await;
        let response = h.get("/podcast", None).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json(response).await;
        assert_eq!(body["total_creators"], 1);
        assert_eq!(body["creators"][0]["slug"], "josenunez");
    }

    #[tokio::test]
    async fn test_creator_page() {
        let h = Harness::new().await;
        let response = h.get("/podcast/josenunez", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["name"], "José Núñez");
        assert_eq!(body["profile_url"], "http://localhost:3000/podcast/josenunez");
        assert_eq!(body["is_own_page"], false);

        let own = h
            .get("/podcast/josenunez", Some(&h.cookie_for(&h.creator)))
            .await;
        assert_eq!(json(own).await["is_own_page"], true);

        let response = h.get("/podcast/nobody", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_protected_page_without_session_redirects() {
        let h = Harness::new().await;
        for path in ["/admin/dashboard", "/user/dashboard", "/dashboard"] {
            let response = h.get(path, None).await;
            assert_eq!(response.status(), StatusCode::SEE_OTHER, "{path}");
            assert_eq!(location(&response), "/password/login", "{path}");
        }
    }

    #[tokio::test]
    async fn test_protected_api_without_session_is_401() {
        let h = Harness::new().await;
        let response = h.get("/api/admin/users", None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json(response).await["success"], false);
    }

    #[tokio::test]
    async fn test_role_mismatch_redirects_to_login() {
        let h = Harness::new().await;
        let creator = h.cookie_for(&h.creator);
        let admin = h.cookie_for(&h.admin);

        let response = h.get("/admin/dashboard", Some(&creator)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/password/login");

        let response = h.get("/user/dashboard", Some(&admin)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/password/login");
    }

    #[tokio::test]
    async fn test_tampered_cookie_is_no_session() {
        let h = Harness::new().await;
        let mut cookie = h.cookie_for(&h.admin);
        cookie.push('x');

        let response = h.get("/admin/dashboard", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }

    #[tokio::test]
    async fn test_expired_cookie_is_no_session() {
        let h = Harness::new().await;
        let issued = Utc::now() - TimeDelta::seconds(SESSION_TTL_SECONDS + 1);
        let token = h.state.tokens().encode(&h.admin.to_claim(issued)).unwrap();
        let cookie = format!("{SESSION_COOKIE_NAME}={token}");

        let response = h.get("/admin/dashboard", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/password/login");

        let response = h.get("/api/auth/me", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_login_sets_cookie_and_opens_admin_area() {
        let h = Harness::new().await;
        let response = h
            .post_form(
                "/api/auth/login",
                "email=admin%40example.com&password=admin123",
                None,
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_owned();
        assert!(set_cookie.starts_with("session-token="));
        assert!(set_cookie.contains("HttpOnly"));

        let body = json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["user"]["role"], "admin");
        assert_eq!(body["user"]["email"], "admin@example.com");

        let cookie = set_cookie.split(';').next().unwrap();
        let response = h.get("/admin/dashboard", Some(cookie)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await["total_users"], 2);
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let h = Harness::new().await;
        let response = h
            .post_form(
                "/api/auth/login",
                "email=admin%40example.com&password=nope",
                None,
            )
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
        assert_eq!(json(response).await["message"], "Invalid credentials");
    }

    #[tokio::test]
    async fn test_login_padded_identifier_is_401() {
        let h = Harness::new().await;
        let response = h
            .post_form(
                "/api/auth/login",
                "email=%20%20admin%40example.com%09&password=admin123",
                None,
            )
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn test_login_missing_field_is_400() {
        let h = Harness::new().await;
        let response = h
            .post_form("/api/auth/login", "email=admin%40example.com", None)
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_logout_clears_cookie() {
        let h = Harness::new().await;
        let response = h.post_form("/api/auth/logout", "", None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/password/login");

        let set_cookie = response.headers().get(header::SET_COOKIE).unwrap();
        assert!(set_cookie.to_str().unwrap().contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn test_dashboard_redirects_by_role() {
        let h = Harness::new().await;

        let response = h.get("/dashboard", Some(&h.cookie_for(&h.admin))).await;
        assert_eq!(location(&response), "/admin/dashboard");

        let response = h.get("/dashboard", Some(&h.cookie_for(&h.creator))).await;
        assert_eq!(location(&response), "/user/dashboard");
    }

    #[tokio::test]
    async fn test_appointment_request_rules() {
        let h = Harness::new().await;
        let creator = h.cookie_for(&h.creator);
        let slot = h.future_slot().await;
        let uri = "/api/user/appointments/request";

        let response = h
            .post_form(uri, &format!("slot_id={slot}"), Some(&h.cookie_for(&h.admin)))
            .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(json(response).await["message"], "Not authorized");

        let response = h.post_form(uri, "", Some(&creator)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = h.post_form(uri, "slot_id=9999", Some(&creator)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = h
            .post_form(uri, &format!("horario_id={slot}"), Some(&creator))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json(response).await;
        assert_eq!(body["appointment"]["state"], "approved");

        let response = h
            .post_form(uri, &format!("slot_id={slot}"), Some(&creator))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_admin_agenda_actions() {
        let h = Harness::new().await;
        let admin = h.cookie_for(&h.admin);
        let slot = h.future_slot().await;
        let appointment = h
            .store
            .create_appointment(h.creator.id, slot, AppointmentState::Approved)
            .await
            .unwrap();

        let response = h
            .post_form(
                &format!("/api/admin/appointments/{}/reject", appointment.id),
                "",
                Some(&admin),
            )
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/admin/agenda");

        let body = json(h.get("/admin/agenda", Some(&admin)).await).await;
        assert_eq!(body["stats"]["rejected"], 1);
        assert_eq!(body["stats"]["total"], 1);

        let response = h
            .post_form(&format!("/api/admin/agenda/{slot}/toggle"), "", Some(&admin))
            .await;
        assert_eq!(location(&response), "/admin/agenda/available");

        let response = h
            .post_form(&format!("/api/admin/agenda/{slot}/delete"), "", Some(&admin))
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let response = h
            .post_form(&format!("/api/admin/agenda/{slot}/delete"), "", Some(&admin))
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_admin_creates_slot_and_rejects_past() {
        let h = Harness::new().await;
        let admin = h.cookie_for(&h.admin);

        let response = h
            .post_form(
                "/api/admin/agenda/create",
                "date=2000-01-01&time=10:00&duration=30",
                Some(&admin),
            )
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let date = (Utc::now() + TimeDelta::days(10)).format("%Y-%m-%d");
        let response = h
            .post_form(
                "/api/admin/agenda/create",
                &format!("date={date}&time=10:00&duration=30&description=Entrevista"),
                Some(&admin),
            )
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/admin/agenda");

        let days = json(h.get("/admin/agenda/available", Some(&admin)).await).await;
        assert_eq!(days.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_admin_creates_user_and_podcast() {
        let h = Harness::new().await;
        let admin = h.cookie_for(&h.admin);

        let response = h
            .post_form(
                "/api/admin/users/create",
                "name=Ana%20Ruiz&email=ana%40example.com&password=s3cure-pass&role=user",
                Some(&admin),
            )
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "image is required");

        let response = h
            .post_form(
                "/api/admin/users/create",
                "name=Ana%20Ruiz&email=ana%40example.com&password=s3cure-pass&role=user\
                 &image=https%3A%2F%2Fcdn.example.com%2Fana.png",
                Some(&admin),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json(response).await;
        assert_eq!(body["profile_url"], "http://localhost:3000/podcast/anaruiz");
        let ana_id = body["user"]["id"].as_i64().unwrap();

        let podcast = format!(
            "name=Charlas&url=https%3A%2F%2Fpod.example.com&description=Semanal&user_id={ana_id}"
        );
        let response = h
            .post_form("/api/admin/podcasts/create", &podcast, Some(&admin))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = h
            .post_form("/api/admin/podcasts/create", &podcast, Some(&admin))
            .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let owner_is_admin = format!(
            "name=Otro&url=https%3A%2F%2Fpod.example.com&description=x&user_id={}",
            h.admin.id
        );
        let response = h
            .post_form("/api/admin/podcasts/create", &owner_is_admin, Some(&admin))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_user_agenda_lists_open_slots() {
        let h = Harness::new().await;
        h.future_slot().await;

        let body = json(h.get("/user/agenda", Some(&h.cookie_for(&h.creator))).await).await;
        assert_eq!(body["open_slots"].as_array().unwrap().len(), 1);
        assert_eq!(body["appointments"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_health_and_static_pages() {
        let h = Harness::new().await;
        assert_eq!(h.get("/health", None).await.status(), StatusCode::OK);
        assert_eq!(h.get("/health/ready", None).await.status(), StatusCode::OK);
        assert_eq!(h.get("/password/login", None).await.status(), StatusCode::OK);
    }
}
