//! Application configuration management.
//!
//! This module handles loading configuration from environment variables.
//! It uses the `envy` crate to automatically deserialize environment variables into a type-safe struct.

use chrono::Duration;
use serde::Deserialize;

/// Longest accepted session lifetime (one year).
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 366;

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `DATABASE_URL` (required): PostgreSQL connection string
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3000
/// - `SESSION_TTL_HOURS` (optional): login session lifetime, defaults to 24
/// - `MAIL_FROM` (optional): sender address for notification emails
/// - `MAIL_RELAY_URL` (optional): HTTP endpoint that accepts outbound mail
/// - `MAIL_RELAY_SECRET` (optional): HMAC key used to sign relay requests
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,

    #[serde(default = "default_port")]
    pub server_port: u16,

    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: i64,

    #[serde(default = "default_mail_from")]
    pub mail_from: String,

    #[serde(default)]
    pub mail_relay_url: Option<String>,

    #[serde(default)]
    pub mail_relay_secret: Option<String>,
}

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Env(#[from] envy::Error),

    #[error("MAIL_RELAY_URL is invalid: {0}")]
    InvalidRelayUrl(String),

    #[error("SESSION_TTL_HOURS must be between 1 and {}", MAX_SESSION_TTL_HOURS)]
    InvalidSessionTtl,
}

/// Default port if SERVER_PORT environment variable is not set.
fn default_port() -> u16 {
    3000
}

fn default_session_ttl_hours() -> i64 {
    24
}

fn default_mail_from() -> String {
    "no-reply@bank.local".to_string()
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This method first attempts to load a `.env` file (which is optional),
    /// then reads environment variables and deserializes them into a Config struct.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing (e.g., DATABASE_URL)
    /// - Environment variable values cannot be parsed into expected types
    /// - The mail relay URL is not an http(s) URL
    pub fn from_env() -> Result<Self, ConfigError> {
        // Try to load .env file if it exists (does nothing if not found)
        dotenvy::dotenv().ok();

        // Field names are automatically converted: database_url -> DATABASE_URL
        let config = envy::from_env::<Config>()?;
        config.validate()?;

        Ok(config)
    }

    /// Login session lifetime.
    pub fn session_ttl(&self) -> Result<Duration, ConfigError> {
        if !(1..=MAX_SESSION_TTL_HOURS).contains(&self.session_ttl_hours) {
            return Err(ConfigError::InvalidSessionTtl);
        }

        Duration::try_hours(self.session_ttl_hours).ok_or(ConfigError::InvalidSessionTtl)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.session_ttl()?;

        if let Some(ref relay) = self.mail_relay_url {
            let parsed =
                url::Url::parse(relay).map_err(|e| ConfigError::InvalidRelayUrl(e.to_string()))?;

            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ConfigError::InvalidRelayUrl(
                    "URL must use HTTP or HTTPS".to_string(),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            database_url: "postgres://localhost/bank".to_string(),
            server_port: default_port(),
            session_ttl_hours: default_session_ttl_hours(),
            mail_from: default_mail_from(),
            mail_relay_url: None,
            mail_relay_secret: None,
        }
    }

    #[test]
    fn defaults_are_valid() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn rejects_non_http_relay() {
        let mut config = config();
        config.mail_relay_url = Some("smtp://mail.example.com".to_string());

        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidRelayUrl(_))
        ));
    }

    #[test]
    fn rejects_zero_session_ttl() {
        let mut config = config();
        config.session_ttl_hours = 0;

        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSessionTtl)
        ));
    }

    #[test]
    fn rejects_session_ttl_beyond_a_year() {
        let mut config = config();

        config.session_ttl_hours = i64::MAX;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSessionTtl)
        ));

        config.session_ttl_hours = MAX_SESSION_TTL_HOURS + 1;
        assert!(config.session_ttl().is_err());

        config.session_ttl_hours = MAX_SESSION_TTL_HOURS;
        assert_eq!(
            config.session_ttl().expect("ttl"),
            Duration::hours(MAX_SESSION_TTL_HOURS)
        );
    }
}
