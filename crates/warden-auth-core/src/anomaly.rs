//! Device and usage anomaly detection
//!
//! Compares the fingerprint presented on a refresh with the last one the
//! session saw and watches the per-session refresh rate. Advisory only:
//! the rotation engine's reuse check never depends on the outcome here.

use warden_store::{KeyValueStore, SessionStore};
use warden_types::{DeviceFingerprint, SessionId, UserId};

use crate::error::AuthError;

/// Independent anomaly signals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnomalySignal {
    /// IP address differs from the last recorded fingerprint
    IpChanged,
    /// User agent differs from the last recorded fingerprint
    UserAgentChanged,
    /// Refresh count exceeded the configured threshold
    ExcessiveRefreshRate,
}

impl std::fmt::Display for AnomalySignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IpChanged => write!(f, "ip_changed"),
            Self::UserAgentChanged => write!(f, "user_agent_changed"),
            Self::ExcessiveRefreshRate => write!(f, "excessive_refresh_rate"),
        }
    }
}

/// Severity of a flagged anomaly
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Medium,
    High,
}

/// Outcome of an anomaly check
#[derive(Debug, Clone)]
pub struct AnomalyReport {
    pub is_anomaly: bool,
    pub signals: Vec<AnomalySignal>,
    pub severity: Option<Severity>,
}

impl AnomalyReport {
    /// A report with nothing flagged
    pub fn clear() -> Self {
        Self {
            is_anomaly: false,
            signals: Vec::new(),
            severity: None,
        }
    }

    fn from_signals(signals: Vec<AnomalySignal>) -> Self {
        let severity = match signals.len() {
            0 => None,
            1 => Some(Severity::Medium),
            _ => Some(Severity::High),
        };
        Self {
            is_anomaly: !signals.is_empty(),
            signals,
            severity,
        }
    }
}

/// Flags suspicious fingerprint changes and refresh bursts
pub struct AnomalyDetector<K: KeyValueStore> {
    sessions: SessionStore<K>,
    refresh_rate_threshold: u64,
}

impl<K: KeyValueStore> Clone for AnomalyDetector<K> {
    fn clone(&self) -> Self {
        Self {
            sessions: self.sessions.clone(),
            refresh_rate_threshold: self.refresh_rate_threshold,
        }
    }
}

impl<K: KeyValueStore> AnomalyDetector<K> {
    /// Create a detector over the session store
    pub fn new(sessions: SessionStore<K>, refresh_rate_threshold: u64) -> Self {
        Self {
            sessions,
            refresh_rate_threshold,
        }
    }

    /// Compare a presented fingerprint with the session's last known one.
    ///
    /// IP and user-agent changes are independent signals; two or more at
    /// once raise severity to `High`. An excessive refresh rate is an
    /// anomaly on its own.
    pub async fn check(
        &self,
        user_id: UserId,
        session_id: SessionId,
        fingerprint: &DeviceFingerprint,
    ) -> Result<AnomalyReport, AuthError> {
        let Some(stored) = self.sessions.get(user_id, session_id).await? else {
            return Ok(AnomalyReport::clear());
        };
        let known = &stored.record.device;

        let mut signals = Vec::new();

        if changed(&known.ip_address, &fingerprint.ip_address) {
            signals.push(AnomalySignal::IpChanged);
        }
        if changed(&known.user_agent, &fingerprint.user_agent) {
            signals.push(AnomalySignal::UserAgentChanged);
        }
        if stored.record.refresh_count > self.refresh_rate_threshold {
            signals.push(AnomalySignal::ExcessiveRefreshRate);
        }

        let report = AnomalyReport::from_signals(signals);
        if report.is_anomaly {
            tracing::warn!(
                user_id = %user_id,
                session_id = %session_id,
                signals = ?report.signals,
                severity = ?report.severity,
                "Refresh anomaly detected"
            );
        }
        Ok(report)
    }

    /// Persist the latest fingerprint and bump the refresh counter.
    ///
    /// Called after every successful rotation regardless of the check
    /// outcome.
    pub async fn record(
        &self,
        user_id: UserId,
        session_id: SessionId,
        fingerprint: &DeviceFingerprint,
    ) -> Result<(), AuthError> {
        self.sessions
            .record_fingerprint(user_id, session_id, fingerprint)
            .await?;
        Ok(())
    }
}

/// A signal fires only when both sides are known and differ; a client that
/// starts or stops sending a field is not a change
fn changed(known: &Option<String>, presented: &Option<String>) -> bool {
    matches!((known, presented), (Some(a), Some(b)) if a != b)
}

impl<K: KeyValueStore> std::fmt::Debug for AnomalyDetector<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnomalyDetector")
            .field("refresh_rate_threshold", &self.refresh_rate_threshold)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use warden_store::MemoryKvStore;

    fn detector(threshold: u64) -> AnomalyDetector<MemoryKvStore> {
        let sessions = SessionStore::new(Arc::new(MemoryKvStore::new()), Duration::from_secs(600), 10);
        AnomalyDetector::new(sessions, threshold)
    }

    fn fp(ip: &str, ua: &str) -> DeviceFingerprint {
        DeviceFingerprint::new(Some(ip.to_string()), Some(ua.to_string()))
    }

    async fn seed(
        detector: &AnomalyDetector<MemoryKvStore>,
        device: DeviceFingerprint,
    ) -> (UserId, SessionId) {
        let user = UserId::new();
        let session = SessionId::new();
        detector
            .sessions
            .create(user, session, "h0", device)
            .await
            .unwrap();
        (user, session)
    }

    #[tokio::test]
    async fn test_same_fingerprint_is_clear() {
        let detector = detector(100);
        let (user, session) = seed(&detector, fp("10.0.0.1", "cli")).await;

        let report = detector.check(user, session, &fp("10.0.0.1", "cli")).await.unwrap();
        assert!(!report.is_anomaly);
        assert!(report.severity.is_none());
    }

    #[tokio::test]
    async fn test_single_change_is_medium() {
        let detector = detector(100);
        let (user, session) = seed(&detector, fp("10.0.0.1", "cli")).await;

        let report = detector.check(user, session, &fp("10.9.9.9", "cli")).await.unwrap();
        assert!(report.is_anomaly);
        assert_eq!(report.signals, vec![AnomalySignal::IpChanged]);
        assert_eq!(report.severity, Some(Severity::Medium));
    }

    #[tokio::test]
    async fn test_two_signals_are_high() {
        let detector = detector(100);
        let (user, session) = seed(&detector, fp("10.0.0.1", "cli")).await;

        let report = detector
            .check(user, session, &fp("10.9.9.9", "browser"))
            .await
            .unwrap();
        assert_eq!(report.severity, Some(Severity::High));
        assert_eq!(report.signals.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_field_is_not_a_change() {
        let detector = detector(100);
        let (user, session) = seed(
            &detector,
            DeviceFingerprint::new(None, Some("cli".into())),
        )
        .await;

        let report = detector.check(user, session, &fp("10.0.0.1", "cli")).await.unwrap();
        assert!(!report.is_anomaly);
    }

    #[tokio::test]
    async fn test_refresh_rate_alone_flags() {
        let detector = detector(3);
        let device = fp("10.0.0.1", "cli");
        let (user, session) = seed(&detector, device.clone()).await;

        for _ in 0..4 {
            detector.record(user, session, &device).await.unwrap();
        }

        let report = detector.check(user, session, &device).await.unwrap();
        assert!(report.is_anomaly);
        assert_eq!(report.signals, vec![AnomalySignal::ExcessiveRefreshRate]);
        assert_eq!(report.severity, Some(Severity::Medium));
    }

    #[tokio::test]
    async fn test_unknown_session_is_clear() {
        let detector = detector(100);
        let report = detector
            .check(UserId::new(), SessionId::new(), &fp("10.0.0.1", "cli"))
            .await
            .unwrap();
        assert!(!report.is_anomaly);
    }
}
