//! Session persistence over the key-value capability
//!
//! One record per (user, session) at `session:{user}:{session}`. All writes
//! replace the whole record; the rotation path uses compare-and-swap against
//! the bytes previously read so concurrent rotations have a single winner.

use std::sync::Arc;
use std::time::Duration;

use warden_types::{DeviceFingerprint, SessionId, UserId};

use crate::error::StoreResult;
use crate::kv::{session_key, session_prefix, KeyValueStore};
use crate::model::SessionRecord;

/// A record together with the raw bytes it was read from, the witness for
/// conditional writes
#[derive(Debug, Clone)]
pub struct StoredSession {
    pub record: SessionRecord,
    raw: Vec<u8>,
}

/// Result of a conditional rotation write
#[derive(Debug)]
pub enum RotationWrite {
    /// The update landed; contains the record as written
    Applied(SessionRecord),
    /// Another writer rotated this session first; nothing was changed
    Conflict,
}

/// Session store with a sliding TTL and bounded token history
pub struct SessionStore<K: KeyValueStore> {
    kv: Arc<K>,
    session_ttl: Duration,
    max_history: usize,
}

impl<K: KeyValueStore> Clone for SessionStore<K> {
    fn clone(&self) -> Self {
        Self {
            kv: Arc::clone(&self.kv),
            session_ttl: self.session_ttl,
            max_history: self.max_history,
        }
    }
}

impl<K: KeyValueStore> SessionStore<K> {
    /// Create a session store
    ///
    /// # Arguments
    /// * `session_ttl` - record lifetime, refreshed on every mutation
    /// * `max_history` - cap on retained rotated-away token hashes
    pub fn new(kv: Arc<K>, session_ttl: Duration, max_history: usize) -> Self {
        Self {
            kv,
            session_ttl,
            max_history,
        }
    }

    /// Initialize a record for a freshly issued session
    pub async fn create(
        &self,
        user_id: UserId,
        session_id: SessionId,
        refresh_hash: &str,
        device: DeviceFingerprint,
    ) -> StoreResult<SessionRecord> {
        let record = SessionRecord::new(user_id, session_id, refresh_hash, device);
        let bytes = serde_json::to_vec(&record)?;
        self.kv
            .set(
                &session_key(user_id, session_id),
                &bytes,
                Some(self.session_ttl),
            )
            .await?;
        Ok(record)
    }

    /// Load a record. Absent or expired records read as `None`.
    pub async fn get(
        &self,
        user_id: UserId,
        session_id: SessionId,
    ) -> StoreResult<Option<StoredSession>> {
        let Some(raw) = self.kv.get(&session_key(user_id, session_id)).await? else {
            return Ok(None);
        };
        let record: SessionRecord = serde_json::from_slice(&raw)?;
        Ok(Some(StoredSession { record, raw }))
    }

    /// Commit a rotation: retire the current hash into history, install the
    /// new one, bump `last_used_at`, and refresh the TTL. Conditional on the
    /// record being unchanged since `prev` was read.
    pub async fn update_after_rotation(
        &self,
        prev: &StoredSession,
        new_refresh_hash: &str,
    ) -> StoreResult<RotationWrite> {
        let mut record = prev.record.clone();
        record.rotate_hash(new_refresh_hash, self.max_history);

        let bytes = serde_json::to_vec(&record)?;
        let swapped = self
            .kv
            .compare_and_swap(
                &session_key(record.user_id, record.session_id),
                &prev.raw,
                &bytes,
                Some(self.session_ttl),
            )
            .await?;

        if swapped {
            Ok(RotationWrite::Applied(record))
        } else {
            Ok(RotationWrite::Conflict)
        }
    }

    /// Persist the latest fingerprint and bump the refresh counter.
    ///
    /// Advisory data: written unconditionally, a lost update here only
    /// costs one counter tick.
    pub async fn record_fingerprint(
        &self,
        user_id: UserId,
        session_id: SessionId,
        device: &DeviceFingerprint,
    ) -> StoreResult<()> {
        let Some(stored) = self.get(user_id, session_id).await? else {
            return Ok(());
        };
        let mut record = stored.record;
        record.device = device.clone();
        record.refresh_count += 1;

        let bytes = serde_json::to_vec(&record)?;
        self.kv
            .set(
                &session_key(user_id, session_id),
                &bytes,
                Some(self.session_ttl),
            )
            .await
    }

    /// Mark a session invalid. The record stays in the store for its
    /// remaining TTL so replays against a closed session stay detectable.
    /// Returns `false` when no record exists.
    pub async fn invalidate(&self, user_id: UserId, session_id: SessionId) -> StoreResult<bool> {
        let Some(stored) = self.get(user_id, session_id).await? else {
            return Ok(false);
        };
        let mut record = stored.record;
        record.is_valid = false;

        let bytes = serde_json::to_vec(&record)?;
        self.kv
            .set(
                &session_key(user_id, session_id),
                &bytes,
                Some(self.session_ttl),
            )
            .await?;
        Ok(true)
    }

    /// Invalidate every still-valid session of a user; returns how many
    /// were flipped
    pub async fn invalidate_all(&self, user_id: UserId) -> StoreResult<u64> {
        let mut count = 0;
        for key in self.kv.scan_prefix(&session_prefix(user_id)).await? {
            let Some(session_id) = key
                .rsplit(':')
                .next()
                .and_then(|s| SessionId::parse(s).ok())
            else {
                tracing::warn!(key = %key, "skipping malformed session key");
                continue;
            };
            match self.get(user_id, session_id).await? {
                Some(stored) if stored.record.is_valid => {
                    self.invalidate(user_id, session_id).await?;
                    count += 1;
                }
                _ => {}
            }
        }
        Ok(count)
    }

    /// All live records of a user, most recently used first
    pub async fn list(&self, user_id: UserId) -> StoreResult<Vec<SessionRecord>> {
        let mut records = Vec::new();
        for key in self.kv.scan_prefix(&session_prefix(user_id)).await? {
            if let Some(raw) = self.kv.get(&key).await? {
                records.push(serde_json::from_slice::<SessionRecord>(&raw)?);
            }
        }
        records.sort_by(|a, b| b.last_used_at.cmp(&a.last_used_at));
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryKvStore;

    fn store() -> SessionStore<MemoryKvStore> {
        SessionStore::new(Arc::new(MemoryKvStore::new()), Duration::from_secs(600), 10)
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let sessions = store();
        let user = UserId::new();
        let sid = SessionId::new();

        sessions
            .create(user, sid, "h0", DeviceFingerprint::default())
            .await
            .unwrap();

        let stored = sessions.get(user, sid).await.unwrap().unwrap();
        assert_eq!(stored.record.current_refresh_hash, "h0");
        assert!(stored.record.is_valid);

        assert!(sessions.get(user, SessionId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rotation_write_applies_once() {
        let sessions = store();
        let user = UserId::new();
        let sid = SessionId::new();

        sessions
            .create(user, sid, "h0", DeviceFingerprint::default())
            .await
            .unwrap();
        let stored = sessions.get(user, sid).await.unwrap().unwrap();

        // First writer wins
        let first = sessions.update_after_rotation(&stored, "h1").await.unwrap();
        let RotationWrite::Applied(record) = first else {
            panic!("first rotation must apply");
        };
        assert_eq!(record.current_refresh_hash, "h1");
        assert_eq!(record.used_token_hashes, vec!["h0".to_string()]);

        // Second writer with the same witness loses
        let second = sessions.update_after_rotation(&stored, "h2").await.unwrap();
        assert!(matches!(second, RotationWrite::Conflict));

        let current = sessions.get(user, sid).await.unwrap().unwrap();
        assert_eq!(current.record.current_refresh_hash, "h1");
    }

    #[tokio::test]
    async fn test_invalidate_keeps_record() {
        let sessions = store();
        let user = UserId::new();
        let sid = SessionId::new();

        sessions
            .create(user, sid, "h0", DeviceFingerprint::default())
            .await
            .unwrap();
        assert!(sessions.invalidate(user, sid).await.unwrap());

        let stored = sessions.get(user, sid).await.unwrap().unwrap();
        assert!(!stored.record.is_valid);
        assert_eq!(stored.record.current_refresh_hash, "h0");

        assert!(!sessions.invalidate(user, SessionId::new()).await.unwrap());
    }

    #[tokio::test]
    async fn test_invalidate_all_flags_every_session() {
        let sessions = store();
        let user = UserId::new();
        let other = UserId::new();

        for _ in 0..3 {
            sessions
                .create(user, SessionId::new(), "h", DeviceFingerprint::default())
                .await
                .unwrap();
        }
        sessions
            .create(other, SessionId::new(), "h", DeviceFingerprint::default())
            .await
            .unwrap();

        assert_eq!(sessions.invalidate_all(user).await.unwrap(), 3);

        assert!(sessions.list(user).await.unwrap().iter().all(|r| !r.is_valid));
        assert!(sessions.list(other).await.unwrap().iter().all(|r| r.is_valid));
    }

    #[tokio::test]
    async fn test_record_fingerprint_updates_device_and_counter() {
        let sessions = store();
        let user = UserId::new();
        let sid = SessionId::new();

        sessions
            .create(user, sid, "h0", DeviceFingerprint::default())
            .await
            .unwrap();

        let device = DeviceFingerprint::new(Some("10.0.0.9".into()), Some("cli".into()));
        sessions.record_fingerprint(user, sid, &device).await.unwrap();
        sessions.record_fingerprint(user, sid, &device).await.unwrap();

        let stored = sessions.get(user, sid).await.unwrap().unwrap();
        assert_eq!(stored.record.device, device);
        assert_eq!(stored.record.refresh_count, 2);

        // Recording against a missing session is a no-op
        sessions
            .record_fingerprint(user, SessionId::new(), &device)
            .await
            .unwrap();
    }
}
