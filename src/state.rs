//! Shared application state handed to every handler.

use axum::extract::FromRef;
use chrono::Duration;

use crate::{
    config::{Config, ConfigError},
    db::DbPool,
    services::mail_service::Mailer,
};

#[derive(Debug, Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub mailer: Mailer,

    /// Lifetime of a login session
    pub session_ttl: Duration,
}

impl AppState {
    pub fn new(pool: DbPool, mailer: Mailer, config: &Config) -> Result<Self, ConfigError> {
        Ok(Self {
            pool,
            mailer,
            session_ttl: config.session_ttl()?,
        })
    }
}

impl FromRef<AppState> for DbPool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Mailer {
    fn from_ref(state: &AppState) -> Self {
        state.mailer.clone()
    }
}
