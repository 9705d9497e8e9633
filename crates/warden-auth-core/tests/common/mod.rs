//! Shared test fixtures

pub mod mock_directory;

pub use mock_directory::MockUserDirectory;

use std::sync::Arc;
use std::time::Duration;

use warden_auth_core::{AuthConfig, SessionService};
use warden_store::{LockoutPolicy, MemoryKvStore};

/// Config with test-friendly knobs (small history, tight lockout window)
pub fn test_config() -> AuthConfig {
    AuthConfig::new("a".repeat(32), "b".repeat(32))
        .with_session_ttl(Duration::from_secs(600))
        .with_used_token_history(5)
        .with_lockout(LockoutPolicy {
            threshold: 3,
            window: Duration::from_secs(60),
            lock_duration: Duration::from_secs(60),
        })
        .with_refresh_rate_threshold(100)
}

/// Service over a fresh in-memory store and mock directory
pub fn test_service(
    config: AuthConfig,
    directory: Arc<MockUserDirectory>,
) -> SessionService<MemoryKvStore, MockUserDirectory> {
    SessionService::new(config, Arc::new(MemoryKvStore::new()), directory).unwrap()
}
