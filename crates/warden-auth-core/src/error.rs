//! Auth errors

use thiserror::Error;

/// Authentication errors
///
/// Security-relevant branches all fail closed; the HTTP layer folds the
/// 401 bucket into one generic message, keeping the internal distinction
/// for logs and for callers that escalate on reuse.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Invalid token (malformed, bad signature, unexpected algorithm,
    /// missing claims, or unknown to the store)
    #[error("invalid token")]
    InvalidToken,

    /// Token has expired; safe to surface so clients can refresh
    #[error("token expired")]
    TokenExpired,

    /// Session was explicitly invalidated
    #[error("session invalid")]
    SessionInvalid,

    /// A rotated-away refresh token was presented again
    #[error("refresh token reuse detected")]
    RefreshReuse,

    /// Invalid credentials (wrong password, unknown identifier)
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Identifier is locked out after repeated failures
    #[error("account locked")]
    AccountLocked,

    /// Account exists and credentials verify, but the account is disabled
    #[error("account disabled")]
    AccountDisabled,

    /// Referenced session absent during an administrative lookup
    #[error("session not found")]
    SessionNotFound,

    /// Store error
    #[error("store error: {0}")]
    Store(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidToken
            | Self::TokenExpired
            | Self::SessionInvalid
            | Self::RefreshReuse
            | Self::InvalidCredentials
            | Self::AccountLocked => 401,
            Self::AccountDisabled => 403,
            Self::SessionNotFound => 404,
            Self::Store(_) | Self::Configuration(_) | Self::Internal(_) => 500,
        }
    }

    /// Get error code for logs and internal consumers
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidToken => "INVALID_TOKEN",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::SessionInvalid => "SESSION_INVALID",
            Self::RefreshReuse => "REFRESH_REUSE",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::AccountLocked => "ACCOUNT_LOCKED",
            Self::AccountDisabled => "ACCOUNT_DISABLED",
            Self::SessionNotFound => "SESSION_NOT_FOUND",
            Self::Store(_) => "STORE_ERROR",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<warden_store::StoreError> for AuthError {
    fn from(err: warden_store::StoreError) -> Self {
        tracing::error!("Store error: {}", err);
        Self::Store(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_bucket_maps_to_401() {
        for err in [
            AuthError::InvalidToken,
            AuthError::TokenExpired,
            AuthError::SessionInvalid,
            AuthError::RefreshReuse,
            AuthError::InvalidCredentials,
            AuthError::AccountLocked,
        ] {
            assert_eq!(err.status_code(), 401, "{err}");
        }
        assert_eq!(AuthError::AccountDisabled.status_code(), 403);
        assert_eq!(AuthError::SessionNotFound.status_code(), 404);
        assert_eq!(AuthError::Store("x".into()).status_code(), 500);
    }

    #[test]
    fn test_reuse_keeps_distinct_code() {
        // The orchestrator escalates on this code; it must not collapse
        assert_eq!(AuthError::RefreshReuse.error_code(), "REFRESH_REUSE");
        assert_ne!(
            AuthError::RefreshReuse.error_code(),
            AuthError::InvalidToken.error_code()
        );
    }
}
