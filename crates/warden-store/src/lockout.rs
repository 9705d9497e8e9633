//! Failed-login counters and account lockout flags
//!
//! Counters use the store's atomic increment so concurrent failures from
//! the same identifier are never lost. Locks are TTL-only; there is no
//! explicit unlock.

use std::sync::Arc;
use std::time::Duration;

use crate::error::StoreResult;
use crate::kv::{attempts_key, lockout_key, KeyValueStore};

/// Lockout policy knobs
#[derive(Debug, Clone)]
pub struct LockoutPolicy {
    /// Consecutive failures that trigger a lock
    pub threshold: u32,
    /// Window over which failures accumulate
    pub window: Duration,
    /// How long a triggered lock lasts
    pub lock_duration: Duration,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            threshold: 5,
            window: Duration::from_secs(15 * 60),
            lock_duration: Duration::from_secs(15 * 60),
        }
    }
}

/// Result of recording a failed attempt
#[derive(Debug, Clone, Copy)]
pub struct FailureOutcome {
    /// Failures accumulated in the current window, this one included
    pub attempts: i64,
    /// Whether this failure triggered the lock
    pub locked: bool,
}

/// Per-identifier lockout state over the key-value capability
pub struct LockoutStore<K: KeyValueStore> {
    kv: Arc<K>,
    policy: LockoutPolicy,
}

impl<K: KeyValueStore> Clone for LockoutStore<K> {
    fn clone(&self) -> Self {
        Self {
            kv: Arc::clone(&self.kv),
            policy: self.policy.clone(),
        }
    }
}

impl<K: KeyValueStore> LockoutStore<K> {
    /// Create a lockout store with the given policy
    pub fn new(kv: Arc<K>, policy: LockoutPolicy) -> Self {
        Self { kv, policy }
    }

    /// Whether the identifier is currently locked
    pub async fn is_locked(&self, identifier: &str) -> StoreResult<bool> {
        Ok(self.kv.get(&lockout_key(identifier)).await?.is_some())
    }

    /// Count a failed attempt; sets the lock flag when the threshold is hit
    pub async fn record_failure(&self, identifier: &str) -> StoreResult<FailureOutcome> {
        let attempts = self
            .kv
            .incr(&attempts_key(identifier), Some(self.policy.window))
            .await?;

        let locked = attempts >= i64::from(self.policy.threshold);
        if locked {
            self.kv
                .set(
                    &lockout_key(identifier),
                    b"1",
                    Some(self.policy.lock_duration),
                )
                .await?;
        }

        Ok(FailureOutcome { attempts, locked })
    }

    /// Reset the failure counter after a successful verification
    pub async fn clear(&self, identifier: &str) -> StoreResult<()> {
        self.kv.delete(&attempts_key(identifier)).await
    }
}
