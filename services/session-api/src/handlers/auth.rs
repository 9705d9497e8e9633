//! Authentication handlers (login, refresh, logout, me)

use axum::extract::{ConnectInfo, State};
use axum::http::{header, HeaderMap};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use warden_types::DeviceFingerprint;

use crate::error::{ApiError, ApiResult};
use crate::extractors::AuthUser;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub user_id: String,
    pub session_id: String,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
    pub token_type: String,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: UserInfo,
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: String,
    pub email: String,
    pub role: String,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

// ============================================================================
// Handlers
// ============================================================================

/// Client descriptor for anomaly tracking
pub fn fingerprint(addr: SocketAddr, headers: &HeaderMap) -> DeviceFingerprint {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    DeviceFingerprint::new(Some(addr.ip().to_string()), user_agent)
}

/// POST /api/v1/auth/login
///
/// Verify credentials and open a new session
pub async fn login(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    if req.email.is_empty() || req.password.is_empty() {
        return Err(ApiError::BadRequest(
            "email and password are required".to_string(),
        ));
    }

    let outcome = state
        .service
        .login(&req.email, &req.password, fingerprint(addr, &headers))
        .await?;

    Ok(Json(TokenResponse {
        user_id: outcome.user_id.to_string(),
        session_id: outcome.session_id.to_string(),
        access_token: outcome.pair.access_token,
        refresh_token: outcome.pair.refresh_token,
        expires_in: outcome.pair.expires_in,
        token_type: outcome.pair.token_type,
    }))
}

/// POST /api/v1/auth/refresh
///
/// Rotate a refresh token and return a fresh pair
pub async fn refresh(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<TokenResponse>> {
    if req.refresh_token.is_empty() {
        return Err(ApiError::BadRequest("refresh_token is required".to_string()));
    }

    let outcome = state
        .service
        .refresh(&req.refresh_token, fingerprint(addr, &headers))
        .await?;

    Ok(Json(TokenResponse {
        user_id: outcome.user_id.to_string(),
        session_id: outcome.session_id.to_string(),
        access_token: outcome.pair.access_token,
        refresh_token: outcome.pair.refresh_token,
        expires_in: outcome.pair.expires_in,
        token_type: outcome.pair.token_type,
    }))
}

/// POST /api/v1/auth/logout
///
/// Invalidate the session the presented access token belongs to
pub async fn logout(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<LogoutResponse>> {
    state.service.logout(&auth.token).await?;
    Ok(Json(LogoutResponse { success: true }))
}

/// GET /api/v1/auth/me
///
/// Current identity; the account-active check is the second guard
pub async fn me(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<MeResponse>> {
    let user = state.service.require_active(auth.user_id).await?;

    Ok(Json(MeResponse {
        user: UserInfo {
            id: user.id.to_string(),
            email: user.email,
            role: user.role,
        },
        session_id: auth.session_id.to_string(),
    }))
}
