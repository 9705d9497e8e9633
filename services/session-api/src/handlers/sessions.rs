//! Session administration handlers (list, close, close-all)

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use warden_auth_core::SessionQuery;
use warden_types::{SessionId, SessionSummary};

use crate::error::ApiResult;
use crate::extractors::AuthUser;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub active_only: bool,
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub limit: usize,
}

#[derive(Debug, Serialize)]
pub struct SessionListResponse {
    pub sessions: Vec<SessionSummary>,
    pub total: usize,
    pub offset: usize,
}

#[derive(Debug, Serialize)]
pub struct ClosedResponse {
    pub closed: u64,
}

#[derive(Debug, Serialize)]
pub struct CloseResponse {
    pub success: bool,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/sessions
///
/// List the caller's sessions with device and last-used metadata
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<SessionListResponse>> {
    let page = state
        .service
        .list_sessions(
            auth.user_id,
            &SessionQuery {
                active_only: query.active_only,
                current: Some(auth.session_id),
                offset: query.offset,
                limit: query.limit,
            },
        )
        .await?;

    Ok(Json(SessionListResponse {
        sessions: page.sessions,
        total: page.total,
        offset: query.offset,
    }))
}

/// DELETE /api/v1/sessions/{id}
///
/// Close one of the caller's sessions
pub async fn close(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<CloseResponse>> {
    state
        .service
        .close_session(auth.user_id, SessionId::from(id))
        .await?;
    Ok(Json(CloseResponse { success: true }))
}

/// DELETE /api/v1/sessions
///
/// Close every session of the caller, this one included
pub async fn close_all(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<ClosedResponse>> {
    let closed = state.service.close_all_sessions(auth.user_id).await?;
    Ok(Json(ClosedResponse { closed }))
}
