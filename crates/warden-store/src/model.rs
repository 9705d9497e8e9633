//! Stored record models
//!
//! These types are serialized to JSON and written whole; the store never
//! mutates individual fields in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use warden_types::{DeviceFingerprint, SessionId, SessionSummary, UserId};

/// One record per active login on one device
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub user_id: UserId,
    pub session_id: SessionId,
    /// Hash of the refresh token currently valid for this session
    pub current_refresh_hash: String,
    /// Hashes rotated away from, oldest first; bounded, replay detection only
    pub used_token_hashes: Vec<String>,
    /// False after logout/invalidate; the record is kept until TTL expiry
    pub is_valid: bool,
    /// Last known device descriptor
    pub device: DeviceFingerprint,
    pub created_at: DateTime<Utc>,
    /// Updated on every successful refresh
    pub last_used_at: DateTime<Utc>,
    /// Successful refreshes over the session lifetime
    pub refresh_count: u64,
}

impl SessionRecord {
    /// Create a fresh record for a just-issued session
    pub fn new(
        user_id: UserId,
        session_id: SessionId,
        refresh_hash: impl Into<String>,
        device: DeviceFingerprint,
    ) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            session_id,
            current_refresh_hash: refresh_hash.into(),
            used_token_hashes: Vec::new(),
            is_valid: true,
            device,
            created_at: now,
            last_used_at: now,
            refresh_count: 0,
        }
    }

    /// Move the current hash into history (capped FIFO) and install a new one
    pub fn rotate_hash(&mut self, new_hash: impl Into<String>, max_history: usize) {
        let old = std::mem::replace(&mut self.current_refresh_hash, new_hash.into());
        self.used_token_hashes.push(old);
        while self.used_token_hashes.len() > max_history {
            self.used_token_hashes.remove(0);
        }
        self.last_used_at = Utc::now();
    }

    /// Summary for listing endpoints
    pub fn summary(&self, current: Option<SessionId>) -> SessionSummary {
        SessionSummary {
            session_id: self.session_id,
            device: self.device.clone(),
            created_at: self.created_at,
            last_used_at: self.last_used_at,
            is_valid: self.is_valid,
            is_current: current == Some(self.session_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> SessionRecord {
        SessionRecord::new(
            UserId::new(),
            SessionId::new(),
            "h0",
            DeviceFingerprint::default(),
        )
    }

    #[test]
    fn test_new_record_is_valid_and_historyless() {
        let r = record();
        assert!(r.is_valid);
        assert!(r.used_token_hashes.is_empty());
        assert_eq!(r.refresh_count, 0);
    }

    #[test]
    fn test_rotate_hash_moves_current_into_history() {
        let mut r = record();
        r.rotate_hash("h1", 10);
        assert_eq!(r.current_refresh_hash, "h1");
        assert_eq!(r.used_token_hashes, vec!["h0".to_string()]);
    }

    #[test]
    fn test_history_evicts_oldest_first() {
        let mut r = record();
        for i in 1..=13 {
            r.rotate_hash(format!("h{i}"), 10);
        }
        assert_eq!(r.used_token_hashes.len(), 10);
        // h0..h2 were evicted; h3 is now the oldest retained entry
        assert_eq!(r.used_token_hashes.first().unwrap(), "h3");
        assert_eq!(r.used_token_hashes.last().unwrap(), "h12");
        assert_eq!(r.current_refresh_hash, "h13");
    }

    #[test]
    fn test_summary_flags_current_session() {
        let r = record();
        assert!(r.summary(Some(r.session_id)).is_current);
        assert!(!r.summary(Some(SessionId::new())).is_current);
        assert!(!r.summary(None).is_current);
    }
}
