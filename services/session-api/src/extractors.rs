//! Axum extractors for authentication
//!
//! The first of the two request guards: verifies the access token
//! statelessly via the codec. The second guard (account-active check
//! against the directory) runs explicitly in the handlers that need it.

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use warden_types::{SessionId, UserId};

use crate::state::AppState;

/// Authenticated identity extracted from the request's access token
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: UserId,
    pub session_id: SessionId,
    /// Raw bearer token, needed by logout
    pub token: String,
}

/// Error response for auth failures
#[derive(Debug, Serialize)]
struct AuthErrorResponse {
    error: AuthErrorDetail,
}

#[derive(Debug, Serialize)]
struct AuthErrorDetail {
    code: &'static str,
    message: &'static str,
}

/// Auth rejection type
pub struct AuthRejection {
    status: StatusCode,
    code: &'static str,
    message: &'static str,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let body = AuthErrorResponse {
            error: AuthErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let token = extract_bearer(parts)?;

        let identity = app_state.service.authenticate(&token).map_err(|e| {
            tracing::debug!(code = e.error_code(), "Access token rejected");
            match e {
                warden_auth_core::AuthError::TokenExpired => AuthRejection {
                    status: StatusCode::UNAUTHORIZED,
                    code: "TOKEN_EXPIRED",
                    message: "Token expired, please refresh",
                },
                _ => AuthRejection {
                    status: StatusCode::UNAUTHORIZED,
                    code: "UNAUTHORIZED",
                    message: "Invalid credentials or token",
                },
            }
        })?;

        Ok(AuthUser {
            user_id: identity.user_id,
            session_id: identity.session_id,
            token,
        })
    }
}

/// Extract the bearer token from the Authorization header
pub fn extract_bearer(parts: &Parts) -> Result<String, AuthRejection> {
    let Some(auth_header) = parts.headers.get(header::AUTHORIZATION) else {
        return Err(AuthRejection {
            status: StatusCode::UNAUTHORIZED,
            code: "MISSING_TOKEN",
            message: "No authentication token provided",
        });
    };

    let auth_str = auth_header.to_str().map_err(|_| AuthRejection {
        status: StatusCode::BAD_REQUEST,
        code: "INVALID_HEADER",
        message: "Invalid Authorization header encoding",
    })?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.is_empty() => Ok(token.to_string()),
        _ => Err(AuthRejection {
            status: StatusCode::UNAUTHORIZED,
            code: "MISSING_TOKEN",
            message: "No authentication token provided",
        }),
    }
}
