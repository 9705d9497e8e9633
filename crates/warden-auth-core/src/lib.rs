//! Warden Auth Core - Session and refresh-token lifecycle
//!
//! Core functionality: token signing and verification, refresh-token
//! rotation with replay detection, device/IP anomaly checks, and
//! credential verification with account lockout.

pub mod anomaly;
pub mod codec;
pub mod config;
pub mod crypto;
pub mod error;
pub mod rotation;
pub mod service;
pub mod verifier;

pub use anomaly::{AnomalyDetector, AnomalyReport, AnomalySignal, Severity};
pub use codec::{Claims, TokenCodec, TokenKind};
pub use config::{AuthConfig, PasswordSchemeKind};
pub use crypto::{constant_time_eq, constant_time_str_eq, hash_token};
pub use error::AuthError;
pub use rotation::{IssuedSession, RotatedSession, RotationEngine};
pub use service::{
    AuthenticatedUser, LoginOutcome, RefreshOutcome, SessionPage, SessionQuery, SessionService,
};
pub use verifier::{Argon2Scheme, CredentialVerifier, PasswordScheme};
