//! Application state

use std::sync::Arc;

use time::Duration;

use crate::{
    auth::{AuthState, JwtManager, SessionManager},
    config::Config,
    directory::UserDirectory,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub directory: Arc<dyn UserDirectory>,
    pub sessions: SessionManager,
    pub jwt: JwtManager,
    pub config: Config,
}

impl AppState {
    pub fn new(directory: Arc<dyn UserDirectory>, config: Config) -> Self {
        let jwt = JwtManager::new(
            &config.access_token_secret,
            &config.refresh_token_secret,
            Duration::minutes(config.access_token_expiry_minutes),
            Duration::days(config.refresh_token_expiry_days),
        );
        let sessions = SessionManager::new(directory.clone(), jwt.clone());

        Self {
            directory,
            sessions,
            jwt,
            config,
        }
    }

    /// Get auth state for middleware
    pub fn auth_state(&self) -> AuthState {
        AuthState {
            jwt: self.jwt.clone(),
            directory: self.directory.clone(),
        }
    }
}
