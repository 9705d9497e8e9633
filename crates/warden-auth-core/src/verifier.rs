//! Credential verification with account lockout
//!
//! Password verification runs behind a swappable scheme; the lockout
//! counters live in the shared store so concurrent failures from the same
//! identifier are counted exactly once each.

use std::sync::Arc;

use argon2::password_hash::PasswordHash;
use argon2::{Argon2, PasswordVerifier};

use warden_store::{KeyValueStore, LockoutStore};

use crate::config::PasswordSchemeKind;
use crate::error::AuthError;

/// Password verification scheme
///
/// Implementations verify a plaintext password against a stored hash.
/// Scheme selection is a configuration value.
pub trait PasswordScheme: Send + Sync {
    /// Verify a password against a stored hash.
    ///
    /// A hash that cannot be parsed is an internal data problem, not a
    /// mismatch; it must not count as a failed attempt.
    fn verify(&self, password: &str, stored_hash: &str) -> Result<bool, AuthError>;

    /// Scheme name for logs
    fn name(&self) -> &'static str;
}

/// Argon2id scheme over PHC-formatted hashes
#[derive(Debug, Default, Clone)]
pub struct Argon2Scheme;

impl PasswordScheme for Argon2Scheme {
    fn verify(&self, password: &str, stored_hash: &str) -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(stored_hash).map_err(|e| {
            tracing::error!("Stored password hash is malformed: {}", e);
            AuthError::Internal("malformed stored credential".to_string())
        })?;

        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    fn name(&self) -> &'static str {
        "argon2"
    }
}

/// Build the scheme selected by configuration
pub fn scheme_for(kind: PasswordSchemeKind) -> Arc<dyn PasswordScheme> {
    match kind {
        PasswordSchemeKind::Argon2 => Arc::new(Argon2Scheme),
    }
}

/// Verifies submitted credentials and tracks failures per identifier
pub struct CredentialVerifier<K: KeyValueStore> {
    lockouts: LockoutStore<K>,
    scheme: Arc<dyn PasswordScheme>,
}

impl<K: KeyValueStore> Clone for CredentialVerifier<K> {
    fn clone(&self) -> Self {
        Self {
            lockouts: self.lockouts.clone(),
            scheme: Arc::clone(&self.scheme),
        }
    }
}

impl<K: KeyValueStore> CredentialVerifier<K> {
    /// Create a verifier with the given lockout store and scheme
    pub fn new(lockouts: LockoutStore<K>, scheme: Arc<dyn PasswordScheme>) -> Self {
        Self { lockouts, scheme }
    }

    /// Verify a password for an identifier, failing closed while locked.
    ///
    /// A mismatch counts toward the lockout threshold; a match clears the
    /// counter. A lock, once set, expires only by TTL.
    pub async fn verify(
        &self,
        identifier: &str,
        password: &str,
        stored_hash: &str,
    ) -> Result<(), AuthError> {
        if self.lockouts.is_locked(identifier).await? {
            tracing::warn!(identifier, "Verification attempt while locked out");
            return Err(AuthError::AccountLocked);
        }

        if self.scheme.verify(password, stored_hash)? {
            self.lockouts.clear(identifier).await?;
            return Ok(());
        }

        let outcome = self.lockouts.record_failure(identifier).await?;
        if outcome.locked {
            tracing::warn!(
                identifier,
                attempts = outcome.attempts,
                "Identifier locked after repeated failures"
            );
        } else {
            tracing::debug!(identifier, attempts = outcome.attempts, "Failed verification");
        }
        Err(AuthError::InvalidCredentials)
    }
}

impl<K: KeyValueStore> std::fmt::Debug for CredentialVerifier<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialVerifier")
            .field("scheme", &self.scheme.name())
            .finish_non_exhaustive()
    }
}
