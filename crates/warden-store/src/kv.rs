//! Key-value store capability
//!
//! The shared store is the single source of truth for session validity,
//! token history, and lockout counters. Implementations provide single-key
//! atomicity only; there are no cross-key transactions.

use async_trait::async_trait;
use std::time::Duration;

use warden_types::{SessionId, UserId};

use crate::error::StoreResult;

/// Shared key-value store interface
///
/// Every operation is a potentially remote call; callers must not hold
/// in-process locks across these awaits.
#[async_trait]
pub trait KeyValueStore: Send + Sync + 'static {
    /// Read a key. Expired keys read as absent.
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Write a key, replacing any previous value. `ttl = None` persists
    /// until deleted.
    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> StoreResult<()>;

    /// Conditionally replace a key: succeeds only if the current value
    /// equals `expected`. Returns `false` (leaving the store unchanged)
    /// when the value differs or the key is absent/expired.
    async fn compare_and_swap(
        &self,
        key: &str,
        expected: &[u8],
        value: &[u8],
        ttl: Option<Duration>,
    ) -> StoreResult<bool>;

    /// Atomically increment an integer counter, creating it at 1 with the
    /// given TTL when absent. The TTL is applied only on creation, so the
    /// counter forms a fixed window.
    async fn incr(&self, key: &str, ttl: Option<Duration>) -> StoreResult<i64>;

    /// Reset the TTL of an existing key. Returns `false` if the key is
    /// absent or already expired.
    async fn expire(&self, key: &str, ttl: Duration) -> StoreResult<bool>;

    /// Remove a key. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> StoreResult<()>;

    /// List live keys starting with `prefix`.
    async fn scan_prefix(&self, prefix: &str) -> StoreResult<Vec<String>>;
}

/// Key for a session record
pub fn session_key(user_id: UserId, session_id: SessionId) -> String {
    format!("session:{user_id}:{session_id}")
}

/// Key prefix covering all sessions of one user
pub fn session_prefix(user_id: UserId) -> String {
    format!("session:{user_id}:")
}

/// Key for the lock flag of a credential identifier
pub fn lockout_key(identifier: &str) -> String {
    format!("lockout:{identifier}")
}

/// Key for the failed-attempt counter of a credential identifier
pub fn attempts_key(identifier: &str) -> String {
    format!("login_attempts:{identifier}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        let user = UserId::new();
        let session = SessionId::new();

        let key = session_key(user, session);
        assert_eq!(key, format!("session:{user}:{session}"));
        assert!(key.starts_with(&session_prefix(user)));

        assert_eq!(lockout_key("a@b.c"), "lockout:a@b.c");
        assert_eq!(attempts_key("a@b.c"), "login_attempts:a@b.c");
    }
}
