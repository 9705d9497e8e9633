//! In-process key-value store
//!
//! TTL-honoring implementation over `DashMap`. Used by tests and
//! single-node deployments; shared deployments inject their own
//! [`KeyValueStore`] backed by an external store.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::time::{Duration, Instant};

use crate::error::{StoreError, StoreResult};
use crate::kv::KeyValueStore;

#[derive(Debug, Clone)]
struct StoredValue {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

impl StoredValue {
    fn new(value: Vec<u8>, ttl: Option<Duration>) -> Self {
        Self {
            value,
            expires_at: ttl.map(|t| Instant::now() + t),
        }
    }

    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

/// In-memory key-value store with per-key TTL
#[derive(Default, Clone)]
pub struct MemoryKvStore {
    entries: std::sync::Arc<DashMap<String, StoredValue>>,
}

impl MemoryKvStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (non-expired) keys
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| !e.value().is_expired()).count()
    }

    /// Whether the store holds no live keys
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn parse_counter(key: &str, raw: &[u8]) -> StoreResult<i64> {
        std::str::from_utf8(raw)
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .ok_or_else(|| StoreError::Corrupt(key.to_string()))
    }
}

#[async_trait]
impl KeyValueStore for MemoryKvStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        // Lazily drop expired entries on read
        if let Entry::Occupied(occupied) = self.entries.entry(key.to_string()) {
            if occupied.get().is_expired() {
                occupied.remove();
                return Ok(None);
            }
            return Ok(Some(occupied.get().value.clone()));
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> StoreResult<()> {
        self.entries
            .insert(key.to_string(), StoredValue::new(value.to_vec(), ttl));
        Ok(())
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: &[u8],
        value: &[u8],
        ttl: Option<Duration>,
    ) -> StoreResult<bool> {
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_expired() {
                    occupied.remove();
                    return Ok(false);
                }
                if occupied.get().value != expected {
                    return Ok(false);
                }
                occupied.insert(StoredValue::new(value.to_vec(), ttl));
                Ok(true)
            }
            Entry::Vacant(_) => Ok(false),
        }
    }

    async fn incr(&self, key: &str, ttl: Option<Duration>) -> StoreResult<i64> {
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_expired() {
                    occupied.insert(StoredValue::new(b"1".to_vec(), ttl));
                    return Ok(1);
                }
                let next = Self::parse_counter(key, &occupied.get().value)? + 1;
                // Keep the original expiry: the window is fixed, not sliding
                occupied.get_mut().value = next.to_string().into_bytes();
                Ok(next)
            }
            Entry::Vacant(vacant) => {
                vacant.insert(StoredValue::new(b"1".to_vec(), ttl));
                Ok(1)
            }
        }
    }

    async fn expire(&self, key: &str, ttl: Duration) -> StoreResult<bool> {
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_expired() {
                    occupied.remove();
                    return Ok(false);
                }
                occupied.get_mut().expires_at = Some(Instant::now() + ttl);
                Ok(true)
            }
            Entry::Vacant(_) => Ok(false),
        }
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.entries.remove(key);
        Ok(())
    }

    async fn scan_prefix(&self, prefix: &str) -> StoreResult<Vec<String>> {
        Ok(self
            .entries
            .iter()
            .filter(|e| e.key().starts_with(prefix) && !e.value().is_expired())
            .map(|e| e.key().clone())
            .collect())
    }
}
