//! Session lifecycle service - ties together credential verification,
//! token rotation, and anomaly detection

use std::sync::Arc;

use warden_store::{
    DirectoryUser, KeyValueStore, LockoutStore, SessionStore, UserDirectory,
};
use warden_types::{DeviceFingerprint, SessionId, SessionSummary, TokenPair, UserId};

use crate::anomaly::{AnomalyDetector, AnomalyReport, Severity};
use crate::codec::{TokenCodec, TokenKind};
use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::rotation::RotationEngine;
use crate::verifier::{scheme_for, CredentialVerifier};

/// Identity proven by a verified access token
///
/// Stateless: produced from the token alone, no store lookup.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
    pub session_id: SessionId,
    /// The access token's `jti`
    pub token_id: String,
}

/// Result of a successful login
#[derive(Debug)]
pub struct LoginOutcome {
    pub user_id: UserId,
    pub session_id: SessionId,
    pub pair: TokenPair,
}

/// Result of a successful refresh
#[derive(Debug)]
pub struct RefreshOutcome {
    pub user_id: UserId,
    pub session_id: SessionId,
    pub pair: TokenPair,
    /// Advisory; callers may force re-authentication on `High`
    pub anomaly: AnomalyReport,
}

/// Listing filter and pagination
#[derive(Debug, Clone, Default)]
pub struct SessionQuery {
    /// Drop invalidated sessions from the listing
    pub active_only: bool,
    /// Session the caller authenticated with, for the `is_current` flag
    pub current: Option<SessionId>,
    pub offset: usize,
    /// Page size; clamped to 100, defaults to 20 when zero
    pub limit: usize,
}

/// One page of session summaries
#[derive(Debug)]
pub struct SessionPage {
    pub sessions: Vec<SessionSummary>,
    /// Total matching records before pagination
    pub total: usize,
}

/// Session lifecycle service
///
/// The only entry point external callers use: composes the credential
/// verifier, rotation engine, anomaly detector, and session store over a
/// shared key-value capability and an external user directory.
pub struct SessionService<K: KeyValueStore, U: UserDirectory> {
    directory: Arc<U>,
    codec: Arc<TokenCodec>,
    sessions: SessionStore<K>,
    rotation: RotationEngine<K>,
    anomaly: AnomalyDetector<K>,
    verifier: CredentialVerifier<K>,
}

impl<K: KeyValueStore, U: UserDirectory> SessionService<K, U> {
    /// Create a session service
    ///
    /// # Errors
    /// Returns `Configuration` when the token secrets are unusable.
    pub fn new(config: AuthConfig, kv: Arc<K>, directory: Arc<U>) -> Result<Self, AuthError> {
        let codec = Arc::new(TokenCodec::new(&config)?);
        let sessions = SessionStore::new(
            Arc::clone(&kv),
            config.session_ttl,
            config.used_token_history,
        );
        let rotation = RotationEngine::new(Arc::clone(&codec), sessions.clone());
        let anomaly = AnomalyDetector::new(sessions.clone(), config.refresh_rate_threshold);
        let verifier = CredentialVerifier::new(
            LockoutStore::new(kv, config.lockout.clone()),
            scheme_for(config.password_scheme),
        );

        Ok(Self {
            directory,
            codec,
            sessions,
            rotation,
            anomaly,
            verifier,
        })
    }

    // =========================================================================
    // Login / Refresh / Logout
    // =========================================================================

    /// Authenticate credentials and open a new session.
    ///
    /// Unknown identifiers, wrong passwords, and active lockouts all
    /// surface as the same 401; a disabled account is the one distinction
    /// callers may see, and only after the password verified.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        device: DeviceFingerprint,
    ) -> Result<LoginOutcome, AuthError> {
        let Some(user) = self.directory.find_by_email(email).await? else {
            tracing::debug!(identifier = email, "Login for unknown identifier");
            return Err(AuthError::InvalidCredentials);
        };

        self.verifier
            .verify(email, password, &user.password_hash)
            .await?;

        if !user.active {
            tracing::warn!(user_id = %user.id, "Login for disabled account");
            return Err(AuthError::AccountDisabled);
        }

        let issued = self.rotation.issue(user.id, device).await?;
        Ok(LoginOutcome {
            user_id: issued.user_id,
            session_id: issued.session_id,
            pair: issued.pair,
        })
    }

    /// Rotate a refresh token and run the anomaly side-check.
    ///
    /// Reuse detection happens inside the rotation engine and is already
    /// logged as a security alert by the time it surfaces here; the
    /// default policy keeps the session open (log-only), so the error is
    /// propagated without escalation.
    pub async fn refresh(
        &self,
        refresh_token: &str,
        device: DeviceFingerprint,
    ) -> Result<RefreshOutcome, AuthError> {
        let rotated = match self.rotation.rotate(refresh_token).await {
            Ok(rotated) => rotated,
            Err(e) => {
                // Diagnostics only: the token failed verification, so its
                // claims are untrusted and authorize nothing
                if matches!(e, AuthError::TokenExpired) {
                    if let Some(claims) = TokenCodec::decode_unverified(refresh_token) {
                        tracing::debug!(session_id = %claims.sid, "Expired refresh token presented");
                    }
                }
                return Err(e);
            }
        };

        // Advisory path: a detector failure degrades to "indeterminate",
        // it never blocks the refresh that already committed
        let anomaly = match self
            .anomaly
            .check(rotated.user_id, rotated.session_id, &device)
            .await
        {
            Ok(report) => report,
            Err(e) => {
                tracing::error!(
                    session_id = %rotated.session_id,
                    "Anomaly check failed: {}", e
                );
                AnomalyReport::clear()
            }
        };

        if anomaly.severity == Some(Severity::High) {
            tracing::warn!(
                user_id = %rotated.user_id,
                session_id = %rotated.session_id,
                "High-severity refresh anomaly; caller may force re-authentication"
            );
        }

        if let Err(e) = self
            .anomaly
            .record(rotated.user_id, rotated.session_id, &device)
            .await
        {
            tracing::error!(session_id = %rotated.session_id, "Fingerprint record failed: {}", e);
        }

        Ok(RefreshOutcome {
            user_id: rotated.user_id,
            session_id: rotated.session_id,
            pair: rotated.pair,
            anomaly,
        })
    }

    /// Verify an access token. Stateless; ordinary requests never hit the
    /// store.
    pub fn authenticate(&self, access_token: &str) -> Result<AuthenticatedUser, AuthError> {
        let claims = self.codec.verify(TokenKind::Access, access_token)?;
        Ok(AuthenticatedUser {
            user_id: claims.user_id()?,
            session_id: claims.session_id()?,
            token_id: claims.jti,
        })
    }

    /// Invalidate the session the presented access token belongs to
    pub async fn logout(&self, access_token: &str) -> Result<(), AuthError> {
        let user = self.authenticate(access_token)?;
        self.sessions
            .invalidate(user.user_id, user.session_id)
            .await?;
        tracing::info!(user_id = %user.user_id, session_id = %user.session_id, "Session closed");
        Ok(())
    }

    // =========================================================================
    // Session administration
    // =========================================================================

    /// List a user's sessions with filtering and pagination
    pub async fn list_sessions(
        &self,
        user_id: UserId,
        query: &SessionQuery,
    ) -> Result<SessionPage, AuthError> {
        let records = self.sessions.list(user_id).await?;

        let matching: Vec<SessionSummary> = records
            .iter()
            .filter(|r| !query.active_only || r.is_valid)
            .map(|r| r.summary(query.current))
            .collect();

        let total = matching.len();
        let limit = match query.limit {
            0 => 20,
            n => n.min(100),
        };
        let sessions = matching
            .into_iter()
            .skip(query.offset)
            .take(limit)
            .collect();

        Ok(SessionPage { sessions, total })
    }

    /// Invalidate one session; `NotFound` on an unknown id (admin surface)
    pub async fn close_session(
        &self,
        user_id: UserId,
        session_id: SessionId,
    ) -> Result<(), AuthError> {
        if !self.sessions.invalidate(user_id, session_id).await? {
            return Err(AuthError::SessionNotFound);
        }
        tracing::info!(user_id = %user_id, session_id = %session_id, "Session closed");
        Ok(())
    }

    /// Invalidate every session of a user; returns how many were closed
    pub async fn close_all_sessions(&self, user_id: UserId) -> Result<u64, AuthError> {
        let count = self.sessions.invalidate_all(user_id).await?;
        tracing::info!(user_id = %user_id, count, "All sessions closed");
        Ok(count)
    }

    // =========================================================================
    // Account checks (the second guard)
    // =========================================================================

    /// Load the directory entry behind a verified identity, refusing
    /// disabled accounts.
    ///
    /// Fails closed: a valid token whose user has vanished reads as an
    /// invalid token, not as a 404.
    pub async fn require_active(&self, user_id: UserId) -> Result<DirectoryUser, AuthError> {
        let Some(user) = self.directory.find_by_id(user_id).await? else {
            tracing::warn!(user_id = %user_id, "Valid token for unknown user");
            return Err(AuthError::InvalidToken);
        };
        if !user.active {
            return Err(AuthError::AccountDisabled);
        }
        Ok(user)
    }
}

impl<K: KeyValueStore, U: UserDirectory> std::fmt::Debug for SessionService<K, U> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionService").finish_non_exhaustive()
    }
}
