//! Refresh-token rotation
//!
//! The state machine at the heart of the subsystem. Each session holds one
//! valid refresh token; presenting it rotates it away and issues a new
//! pair. Presenting a rotated-away token is replay and fails closed.

use std::sync::Arc;

use warden_store::{KeyValueStore, RotationWrite, SessionRecord, SessionStore};
use warden_types::{DeviceFingerprint, SessionId, TokenPair, UserId};

use crate::codec::{TokenCodec, TokenKind};
use crate::crypto::{constant_time_str_eq, hash_token};
use crate::error::AuthError;

/// A freshly issued session and its token pair
#[derive(Debug)]
pub struct IssuedSession {
    pub user_id: UserId,
    pub session_id: SessionId,
    pub pair: TokenPair,
}

/// Result of a successful rotation
#[derive(Debug)]
pub struct RotatedSession {
    pub user_id: UserId,
    pub session_id: SessionId,
    pub pair: TokenPair,
    pub record: SessionRecord,
}

/// Issues token pairs and rotates refresh tokens against the session store
pub struct RotationEngine<K: KeyValueStore> {
    codec: Arc<TokenCodec>,
    sessions: SessionStore<K>,
}

impl<K: KeyValueStore> Clone for RotationEngine<K> {
    fn clone(&self) -> Self {
        Self {
            codec: Arc::clone(&self.codec),
            sessions: self.sessions.clone(),
        }
    }
}

impl<K: KeyValueStore> RotationEngine<K> {
    /// Create a rotation engine
    pub fn new(codec: Arc<TokenCodec>, sessions: SessionStore<K>) -> Self {
        Self { codec, sessions }
    }

    fn pair(&self, access: String, refresh: String) -> TokenPair {
        TokenPair::bearer(access, refresh, self.codec.ttl(TokenKind::Access).as_secs())
    }

    /// Open a new session for a user and issue its first token pair.
    ///
    /// The store write is the commit point: if it fails, the generated
    /// tokens are dropped and never reach the caller.
    pub async fn issue(
        &self,
        user_id: UserId,
        device: DeviceFingerprint,
    ) -> Result<IssuedSession, AuthError> {
        let session_id = SessionId::new();
        let access = self.codec.issue(TokenKind::Access, user_id, session_id)?;
        let refresh = self.codec.issue(TokenKind::Refresh, user_id, session_id)?;

        self.sessions
            .create(user_id, session_id, &hash_token(&refresh.token), device)
            .await?;

        tracing::info!(user_id = %user_id, session_id = %session_id, "Session created");

        Ok(IssuedSession {
            user_id,
            session_id,
            pair: self.pair(access.token, refresh.token),
        })
    }

    /// Rotate a presented refresh token.
    ///
    /// Signature and expiry are checked before any store lookup; reuse
    /// detection relies solely on hash membership, never on wall-clock
    /// ordering.
    pub async fn rotate(&self, refresh_token: &str) -> Result<RotatedSession, AuthError> {
        // Fail fast: an unverifiable token never touches the store
        let claims = self.codec.verify(TokenKind::Refresh, refresh_token)?;
        let user_id = claims.user_id()?;
        let session_id = claims.session_id()?;

        let Some(stored) = self.sessions.get(user_id, session_id).await? else {
            tracing::debug!(user_id = %user_id, session_id = %session_id, "Refresh against unknown session");
            return Err(AuthError::InvalidToken);
        };

        if !stored.record.is_valid {
            // Stale client or an attacker retrying after closure; the
            // response must not distinguish the two
            tracing::warn!(
                user_id = %user_id,
                session_id = %session_id,
                "Refresh against invalidated session"
            );
            return Err(AuthError::SessionInvalid);
        }

        let presented = hash_token(refresh_token);

        if constant_time_str_eq(&presented, &stored.record.current_refresh_hash) {
            let access = self.codec.issue(TokenKind::Access, user_id, session_id)?;
            let refresh = self.codec.issue(TokenKind::Refresh, user_id, session_id)?;

            return match self
                .sessions
                .update_after_rotation(&stored, &hash_token(&refresh.token))
                .await?
            {
                RotationWrite::Applied(record) => Ok(RotatedSession {
                    user_id,
                    session_id,
                    pair: self.pair(access.token, refresh.token),
                    record,
                }),
                RotationWrite::Conflict => {
                    // A concurrent rotation consumed this token first; the
                    // generated pair is dropped, the loser gets nothing
                    tracing::debug!(
                        user_id = %user_id,
                        session_id = %session_id,
                        "Lost rotation race"
                    );
                    Err(AuthError::InvalidToken)
                }
            };
        }

        if stored
            .record
            .used_token_hashes
            .iter()
            .any(|used| constant_time_str_eq(used, &presented))
        {
            // A previously rotated-away token is being replayed: the
            // classic stolen-refresh-token pattern after the legitimate
            // client already rotated
            tracing::warn!(
                user_id = %user_id,
                session_id = %session_id,
                jti = %claims.jti,
                "SECURITY ALERT: refresh token reuse detected"
            );
            return Err(AuthError::RefreshReuse);
        }

        tracing::debug!(user_id = %user_id, session_id = %session_id, "Foreign refresh token");
        Err(AuthError::InvalidToken)
    }
}

impl<K: KeyValueStore> std::fmt::Debug for RotationEngine<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotationEngine").finish_non_exhaustive()
    }
}
