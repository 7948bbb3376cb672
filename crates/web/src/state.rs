//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::WebConfig;
use crate::db::Repository;
use crate::services::auth::{AuthService, TokenCodec};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the repository, the token codec and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: WebConfig,
    repo: Arc<dyn Repository>,
    tokens: TokenCodec,
}

impl AppState {
    /// Create a new application state.
    ///
    /// The token codec is keyed once here from `config.session_secret` and
    /// never changes for the life of the process.
    #[must_use]
    pub fn new(config: WebConfig, repo: Arc<dyn Repository>) -> Self {
        let tokens = TokenCodec::new(&config.session_secret);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                repo,
                tokens,
            }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &WebConfig {
        &self.inner.config
    }

    /// Get a reference to the repository.
    #[must_use]
    pub fn repo(&self) -> &dyn Repository {
        self.inner.repo.as_ref()
    }

    /// Get a reference to the session token codec.
    #[must_use]
    pub fn tokens(&self) -> &TokenCodec {
        &self.inner.tokens
    }

    /// Authentication service over this state's repository.
    #[must_use]
    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(self.repo())
    }
}
