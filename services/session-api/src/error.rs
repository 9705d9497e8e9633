//! Error types for the Session API service.
//!
//! Token and credential failures are folded into one generic 401 on the
//! wire; the internal distinction (expired vs. malformed vs. reused) only
//! reaches the logs. The exception is the benign expired-token case, which
//! is surfaced so clients know to refresh and retry.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use warden_auth_core::AuthError;

/// API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

/// API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Auth error")]
    Auth(#[from] AuthError),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Auth(err) => {
                StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }

    /// Externally visible (code, message); internal detail stays in logs
    fn public_detail(&self) -> (&'static str, String) {
        match self {
            Self::BadRequest(msg) => ("BAD_REQUEST", msg.clone()),
            Self::Auth(AuthError::TokenExpired) => {
                ("TOKEN_EXPIRED", "Token expired, please refresh".to_string())
            }
            Self::Auth(AuthError::AccountDisabled) => {
                ("FORBIDDEN", "Account is disabled".to_string())
            }
            Self::Auth(AuthError::SessionNotFound) => {
                ("NOT_FOUND", "Session not found".to_string())
            }
            Self::Auth(err) if err.status_code() == 401 => {
                ("UNAUTHORIZED", "Invalid credentials or token".to_string())
            }
            Self::Auth(_) => ("INTERNAL_ERROR", "Internal error".to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            Self::Auth(err) if err.status_code() >= 500 => {
                tracing::error!(code = err.error_code(), error = ?err, "Internal API error");
            }
            Self::Auth(err) => {
                tracing::debug!(code = err.error_code(), "Request refused");
            }
            Self::BadRequest(_) => {}
        }

        let (code, message) = self.public_detail();
        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
