//! Configuration for the Session API service.

use std::time::Duration;

use warden_auth_core::{AuthConfig, PasswordSchemeKind};
use warden_store::LockoutPolicy;

/// Session API configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub http_port: u16,

    /// Base URL of the user directory service
    pub user_directory_url: String,

    /// Session subsystem configuration
    pub auth: AuthConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let http_port = std::env::var("HTTP_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("HTTP_PORT"))?;

        let user_directory_url = std::env::var("USER_DIRECTORY_URL")
            .map_err(|_| ConfigError::Missing("USER_DIRECTORY_URL"))?;

        // Signing secrets (minimum 32 bytes, must differ)
        let access_secret = std::env::var("ACCESS_TOKEN_SECRET")
            .map_err(|_| ConfigError::Missing("ACCESS_TOKEN_SECRET"))?;
        let refresh_secret = std::env::var("REFRESH_TOKEN_SECRET")
            .map_err(|_| ConfigError::Missing("REFRESH_TOKEN_SECRET"))?;

        if access_secret.len() < 32 {
            return Err(ConfigError::Invalid(
                "ACCESS_TOKEN_SECRET must be at least 32 characters",
            ));
        }
        if refresh_secret.len() < 32 {
            return Err(ConfigError::Invalid(
                "REFRESH_TOKEN_SECRET must be at least 32 characters",
            ));
        }

        let access_ttl = env_secs("ACCESS_TOKEN_TTL_SECS", 15 * 60)?;
        let refresh_ttl = env_secs("REFRESH_TOKEN_TTL_SECS", 7 * 24 * 3600)?;
        let session_ttl = env_secs("SESSION_TTL_SECS", 7 * 24 * 3600)?;

        let used_token_history: usize = env_parse("USED_TOKEN_HISTORY", 10)?;

        let lockout = LockoutPolicy {
            threshold: env_parse("LOCKOUT_THRESHOLD", 5)?,
            window: env_secs("ATTEMPT_WINDOW_SECS", 15 * 60)?,
            lock_duration: env_secs("LOCKOUT_DURATION_SECS", 15 * 60)?,
        };

        let refresh_rate_threshold: u64 = env_parse("REFRESH_RATE_THRESHOLD", 100)?;

        let password_scheme: PasswordSchemeKind = std::env::var("PASSWORD_SCHEME")
            .unwrap_or_else(|_| "argon2".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("PASSWORD_SCHEME"))?;

        let mut auth = AuthConfig::new(access_secret, refresh_secret)
            .with_access_ttl(access_ttl)
            .with_refresh_ttl(refresh_ttl)
            .with_session_ttl(session_ttl)
            .with_used_token_history(used_token_history)
            .with_lockout(lockout)
            .with_refresh_rate_threshold(refresh_rate_threshold);
        auth.password_scheme = password_scheme;

        Ok(Self {
            http_port,
            user_directory_url,
            auth,
        })
    }
}

fn env_parse<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(default),
    }
}

fn env_secs(name: &'static str, default_secs: u64) -> Result<Duration, ConfigError> {
    Ok(Duration::from_secs(env_parse(name, default_secs)?))
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
