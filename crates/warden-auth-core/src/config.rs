//! Configuration types for the session subsystem

use std::time::Duration;

use warden_store::LockoutPolicy;

/// Password verification scheme, selected by configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PasswordSchemeKind {
    /// Argon2id (PHC string format)
    #[default]
    Argon2,
}

impl std::str::FromStr for PasswordSchemeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "argon2" | "argon2id" => Ok(Self::Argon2),
            other => Err(format!("unknown password scheme: {other}")),
        }
    }
}

/// Session subsystem configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Access token signing secret (min 32 bytes)
    pub access_secret: String,
    /// Refresh token signing secret (min 32 bytes, distinct from access)
    pub refresh_secret: String,
    /// Access token lifetime
    pub access_ttl: Duration,
    /// Refresh token lifetime
    pub refresh_ttl: Duration,
    /// Session record lifetime (sliding, refreshed on each mutation)
    pub session_ttl: Duration,
    /// Cap on retained rotated-away token hashes
    pub used_token_history: usize,
    /// Failed-login lockout policy
    pub lockout: LockoutPolicy,
    /// Refreshes per session above which the anomaly detector fires
    pub refresh_rate_threshold: u64,
    /// Password verification scheme
    pub password_scheme: PasswordSchemeKind,
}

impl AuthConfig {
    /// Create a config with defaults for everything but the secrets
    pub fn new(access_secret: impl Into<String>, refresh_secret: impl Into<String>) -> Self {
        Self {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
            access_ttl: Duration::from_secs(15 * 60),
            refresh_ttl: Duration::from_secs(7 * 24 * 60 * 60),
            session_ttl: Duration::from_secs(7 * 24 * 60 * 60),
            used_token_history: 10,
            lockout: LockoutPolicy::default(),
            refresh_rate_threshold: 100,
            password_scheme: PasswordSchemeKind::default(),
        }
    }

    /// Set access token lifetime
    pub fn with_access_ttl(mut self, ttl: Duration) -> Self {
        self.access_ttl = ttl;
        self
    }

    /// Set refresh token lifetime
    pub fn with_refresh_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_ttl = ttl;
        self
    }

    /// Set session record lifetime
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Set the used-token history cap
    pub fn with_used_token_history(mut self, max: usize) -> Self {
        self.used_token_history = max;
        self
    }

    /// Set the lockout policy
    pub fn with_lockout(mut self, policy: LockoutPolicy) -> Self {
        self.lockout = policy;
        self
    }

    /// Set the excessive-refresh threshold
    pub fn with_refresh_rate_threshold(mut self, threshold: u64) -> Self {
        self.refresh_rate_threshold = threshold;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AuthConfig::new("a".repeat(32), "b".repeat(32));
        assert_eq!(config.access_ttl, Duration::from_secs(900));
        assert_eq!(config.refresh_ttl, Duration::from_secs(7 * 24 * 3600));
        assert_eq!(config.used_token_history, 10);
        assert_eq!(config.lockout.threshold, 5);
        assert_eq!(config.refresh_rate_threshold, 100);
    }

    #[test]
    fn test_scheme_parse() {
        assert_eq!(
            "argon2".parse::<PasswordSchemeKind>().unwrap(),
            PasswordSchemeKind::Argon2
        );
        assert_eq!(
            "argon2id".parse::<PasswordSchemeKind>().unwrap(),
            PasswordSchemeKind::Argon2
        );
        assert!("bcrypt".parse::<PasswordSchemeKind>().is_err());
    }

    #[test]
    fn test_builders() {
        let config = AuthConfig::new("a".repeat(32), "b".repeat(32))
            .with_access_ttl(Duration::from_secs(60))
            .with_used_token_history(3)
            .with_refresh_rate_threshold(5);
        assert_eq!(config.access_ttl, Duration::from_secs(60));
        assert_eq!(config.used_token_history, 3);
        assert_eq!(config.refresh_rate_threshold, 5);
    }
}
