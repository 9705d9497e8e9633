//! Token signing and verification
//!
//! Access and refresh tokens are HS256 JWTs signed with distinct secrets
//! and lifetimes. Verification pins the algorithm before touching the
//! signature so downgraded tokens are rejected outright.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use jsonwebtoken::{
    decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use warden_types::{SessionId, TokenId, UserId};

use crate::config::AuthConfig;
use crate::error::AuthError;

/// Minimum signing secret length in bytes
pub const MIN_SECRET_LENGTH: usize = 32;

/// Which of the two token families a codec call targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Short-lived, verified statelessly on ordinary requests
    Access,
    /// Long-lived, every use checked against the session store
    Refresh,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Access => write!(f, "access"),
            Self::Refresh => write!(f, "refresh"),
        }
    }
}

/// Claims carried by both token families
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Session ID
    pub sid: String,
    /// Unique token ID, fresh per issuance
    pub jti: String,
    /// Issued at (seconds since epoch)
    pub iat: i64,
    /// Expiration (seconds since epoch)
    pub exp: i64,
}

impl Claims {
    /// Parse the subject claim as a user ID
    pub fn user_id(&self) -> Result<UserId, AuthError> {
        UserId::parse(&self.sub).map_err(|_| AuthError::InvalidToken)
    }

    /// Parse the session claim as a session ID
    pub fn session_id(&self) -> Result<SessionId, AuthError> {
        SessionId::parse(&self.sid).map_err(|_| AuthError::InvalidToken)
    }
}

/// A signed token together with the claims that went into it
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

/// Signs and verifies access/refresh tokens
///
/// Pure over its inputs and configured keys; never touches the store.
pub struct TokenCodec {
    algorithm: Algorithm,
    access: KeyPair,
    refresh: KeyPair,
}

impl TokenCodec {
    /// Build a codec from configuration
    ///
    /// # Errors
    /// Returns `Configuration` if either secret is shorter than 32 bytes
    /// or the two secrets are identical.
    pub fn new(config: &AuthConfig) -> Result<Self, AuthError> {
        for (name, secret) in [
            ("access secret", &config.access_secret),
            ("refresh secret", &config.refresh_secret),
        ] {
            if secret.len() < MIN_SECRET_LENGTH {
                return Err(AuthError::Configuration(format!(
                    "{name} must be at least {MIN_SECRET_LENGTH} bytes"
                )));
            }
        }
        if config.access_secret == config.refresh_secret {
            return Err(AuthError::Configuration(
                "access and refresh secrets must differ".to_string(),
            ));
        }

        Ok(Self {
            algorithm: Algorithm::HS256,
            access: KeyPair {
                encoding: EncodingKey::from_secret(config.access_secret.as_bytes()),
                decoding: DecodingKey::from_secret(config.access_secret.as_bytes()),
                ttl: config.access_ttl,
            },
            refresh: KeyPair {
                encoding: EncodingKey::from_secret(config.refresh_secret.as_bytes()),
                decoding: DecodingKey::from_secret(config.refresh_secret.as_bytes()),
                ttl: config.refresh_ttl,
            },
        })
    }

    fn keys(&self, kind: TokenKind) -> &KeyPair {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    /// Lifetime of tokens of the given kind
    pub fn ttl(&self, kind: TokenKind) -> Duration {
        self.keys(kind).ttl
    }

    /// Sign a new token for the given user and session
    pub fn issue(
        &self,
        kind: TokenKind,
        user_id: UserId,
        session_id: SessionId,
    ) -> Result<IssuedToken, AuthError> {
        let keys = self.keys(kind);
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            sid: session_id.to_string(),
            jti: TokenId::new().to_string(),
            iat: now,
            exp: now + keys.ttl.as_secs() as i64,
        };

        let token = encode(&Header::new(self.algorithm), &claims, &keys.encoding)
            .map_err(|e| AuthError::Internal(format!("token signing failed: {e}")))?;

        Ok(IssuedToken { token, claims })
    }

    /// Verify a token and return its claims
    ///
    /// Rejects tokens whose header algorithm differs from the configured
    /// one before any signature work, and tokens missing any of the
    /// `sub`/`sid`/`jti` claims.
    pub fn verify(&self, kind: TokenKind, token: &str) -> Result<Claims, AuthError> {
        let header = decode_header(token).map_err(|e| {
            tracing::debug!(kind = %kind, "Failed to decode token header: {}", e);
            AuthError::InvalidToken
        })?;

        if header.alg != self.algorithm {
            tracing::debug!(kind = %kind, alg = ?header.alg, "Unexpected token algorithm");
            return Err(AuthError::InvalidToken);
        }

        let mut validation = Validation::new(self.algorithm);
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data =
            decode::<Claims>(token, &self.keys(kind).decoding, &validation).map_err(|e| {
                tracing::debug!(kind = %kind, "Token validation failed: {}", e);
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                    _ => AuthError::InvalidToken,
                }
            })?;

        let claims = data.claims;
        if claims.sub.is_empty() || claims.sid.is_empty() || claims.jti.is_empty() {
            tracing::debug!(kind = %kind, "Token missing identity claims");
            return Err(AuthError::InvalidToken);
        }

        Ok(claims)
    }

    /// Decode claims without verifying the signature.
    ///
    /// For diagnostic paths only, where the token is already known to be
    /// untrusted; must never be used to authorize anything.
    pub fn decode_unverified(token: &str) -> Option<Claims> {
        let payload = token.split('.').nth(1)?;
        let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
        serde_json::from_slice(&bytes).ok()
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> TokenCodec {
        TokenCodec::new(&AuthConfig::new("a".repeat(32), "b".repeat(32))).unwrap()
    }

    #[test]
    fn test_short_secret_rejected() {
        let result = TokenCodec::new(&AuthConfig::new("short", "b".repeat(32)));
        assert!(matches!(result, Err(AuthError::Configuration(_))));
    }

    #[test]
    fn test_identical_secrets_rejected() {
        let result = TokenCodec::new(&AuthConfig::new("a".repeat(32), "a".repeat(32)));
        assert!(matches!(result, Err(AuthError::Configuration(_))));
    }

    #[test]
    fn test_issue_verify_roundtrip() {
        let codec = codec();
        let user = UserId::new();
        let session = SessionId::new();

        let issued = codec.issue(TokenKind::Access, user, session).unwrap();
        let claims = codec.verify(TokenKind::Access, &issued.token).unwrap();

        assert_eq!(claims.user_id().unwrap(), user);
        assert_eq!(claims.session_id().unwrap(), session);
        assert_eq!(claims.jti, issued.claims.jti);
    }

    #[test]
    fn test_jti_unique_per_issuance() {
        let codec = codec();
        let user = UserId::new();
        let session = SessionId::new();

        let a = codec.issue(TokenKind::Refresh, user, session).unwrap();
        let b = codec.issue(TokenKind::Refresh, user, session).unwrap();
        assert_ne!(a.claims.jti, b.claims.jti);
    }

    #[test]
    fn test_kinds_are_not_interchangeable() {
        let codec = codec();
        let issued = codec
            .issue(TokenKind::Access, UserId::new(), SessionId::new())
            .unwrap();

        // Access tokens must not verify as refresh tokens
        let result = codec.verify(TokenKind::Refresh, &issued.token);
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_expired_token_reported_as_expired() {
        let codec = codec();
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: UserId::new().to_string(),
            sid: SessionId::new().to_string(),
            jti: TokenId::new().to_string(),
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret("a".repeat(32).as_bytes()),
        )
        .unwrap();

        let result = codec.verify(TokenKind::Access, &token);
        assert!(matches!(result, Err(AuthError::TokenExpired)));
    }

    #[test]
    fn test_algorithm_downgrade_rejected() {
        let codec = codec();
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: UserId::new().to_string(),
            sid: SessionId::new().to_string(),
            jti: TokenId::new().to_string(),
            iat: now,
            exp: now + 3600,
        };
        // Same secret, different algorithm in the header
        let token = encode(
            &Header::new(Algorithm::HS384),
            &claims,
            &EncodingKey::from_secret("a".repeat(32).as_bytes()),
        )
        .unwrap();

        let result = codec.verify(TokenKind::Access, &token);
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_missing_claims_rejected() {
        #[derive(Serialize)]
        struct Partial {
            sub: String,
            iat: i64,
            exp: i64,
        }
        let codec = codec();
        let now = Utc::now().timestamp();
        let token = encode(
            &Header::new(Algorithm::HS256),
            &Partial {
                sub: UserId::new().to_string(),
                iat: now,
                exp: now + 3600,
            },
            &EncodingKey::from_secret("a".repeat(32).as_bytes()),
        )
        .unwrap();

        let result = codec.verify(TokenKind::Access, &token);
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_malformed_tokens_rejected() {
        let codec = codec();
        for garbage in ["", "nodots", "a.b", "a.b.c.d", "!!!.???.###"] {
            assert!(
                matches!(
                    codec.verify(TokenKind::Access, garbage),
                    Err(AuthError::InvalidToken)
                ),
                "expected rejection for {garbage:?}"
            );
        }
    }

    #[test]
    fn test_decode_unverified_ignores_signature() {
        let codec = codec();
        let issued = codec
            .issue(TokenKind::Refresh, UserId::new(), SessionId::new())
            .unwrap();

        // Break the signature; unverified decode still reads the claims
        let mut tampered = issued.token.clone();
        tampered.push('x');
        let claims = TokenCodec::decode_unverified(&tampered).unwrap();
        assert_eq!(claims.jti, issued.claims.jti);

        assert!(TokenCodec::decode_unverified("garbage").is_none());
    }
}
