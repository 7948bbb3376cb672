//! End-to-end tests for the podcast platform.
//!
//! Each test spawns the full application on an ephemeral port, backed by an
//! in-memory repository, and talks to it over HTTP with `reqwest`.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p podcast-integration-tests
//! ```
//!
//! No database or external service is needed.

use std::sync::Arc;

use chrono::{TimeDelta, Utc};
use reqwest::{Client, Response, redirect};
use secrecy::SecretString;
use url::Url;

use podcast_core::{Role, SlotId};
use podcast_web::config::{Environment, WebConfig};
use podcast_web::db::{AgendaStore, MemoryStore};
use podcast_web::models::{NewTimeSlot, User};
use podcast_web::services::auth::{AuthService, NewAccount};
use podcast_web::state::AppState;

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "admin123";
pub const CREATOR_EMAIL: &str = "jose@example.com";
pub const CREATOR_PASSWORD: &str = "s3cure-pass";

/// A running server plus handles on its state.
pub struct TestContext {
    pub base_url: String,
    pub store: Arc<MemoryStore>,
    pub admin: User,
    pub creator: User,
}

fn test_config() -> WebConfig {
    WebConfig {
        database_url: SecretString::from("postgres://unused"),
        host: "127.0.0.1".parse().expect("valid address"),
        port: 0,
        base_url: Url::parse("http://localhost:3000").expect("valid url"),
        session_secret: SecretString::from("Zq8#vN2!kL5@xR9$mT3&bW7^cY1*hJ4e"),
        environment: Environment::Development,
        sentry_dsn: None,
    }
}

impl TestContext {
    /// Seed an administrator and a creator, then serve the app on
    /// `127.0.0.1:0` in the background.
    pub async fn spawn() -> Self {
        let store = Arc::new(MemoryStore::new());
        let auth = AuthService::new(store.as_ref());

        let admin = auth
            .create_account(NewAccount {
                name: "Admin",
                email: ADMIN_EMAIL,
                password: ADMIN_PASSWORD,
                role: Role::Admin,
                image: None,
            })
            .await
            .expect("seed admin");
        let creator = auth
            .register("José Núñez", CREATOR_EMAIL, CREATOR_PASSWORD)
            .await
            .expect("seed creator");

        let state = AppState::new(test_config(), store.clone());
        let app = podcast_web::app(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral port");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("server error");
        });

        Self {
            base_url: format!("http://{addr}"),
            store,
            admin,
            creator,
        }
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// A browser-like client: keeps cookies, never follows redirects.
    #[must_use]
    pub fn client() -> Client {
        Client::builder()
            .cookie_store(true)
            .redirect(redirect::Policy::none())
            .build()
            .expect("Failed to create HTTP client")
    }

    /// POST the login form.
    pub async fn login(&self, client: &Client, email: &str, password: &str) -> Response {
        client
            .post(self.url("/api/auth/login"))
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("login request")
    }

    /// A client already holding a session for the given account.
    pub async fn logged_in(&self, email: &str, password: &str) -> Client {
        let client = Self::client();
        let response = self.login(&client, email, password).await;
        assert!(response.status().is_success(), "login as {email} failed");
        client
    }

    /// A bookable slot three days out.
    pub async fn future_slot(&self) -> SlotId {
        self.store
            .create_slot(NewTimeSlot {
                starts_at: Utc::now() + TimeDelta::days(3),
                duration_minutes: 60,
                description: None,
            })
            .await
            .expect("create slot")
            .id
    }
}

/// `Location` header of a redirect.
#[must_use]
pub fn location(response: &Response) -> Option<&str> {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
}
