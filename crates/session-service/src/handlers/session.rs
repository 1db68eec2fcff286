//! Session endpoints: refresh, logout, revoke, session lookup and
//! long-lived token issuance.

use crate::errors::SessionError;
use crate::models::{
    AccessTokenResponse, LogoutRequest, RefreshRequest, RevokeRequest, RevokeResponse,
    SessionResponse, TokenPairResponse,
};
use crate::routes::AppState;
use crate::services::AuthenticatedSubject;
use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use std::sync::Arc;
use tracing::instrument;

/// Redeem a refresh token for a new access/refresh pair.
///
/// POST /api/v1/auth/refresh
#[instrument(skip_all, name = "session.handler.refresh")]
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<Json<TokenPairResponse>, SessionError> {
    let Json(payload) = payload?;
    let pair = state.manager.refresh(&payload.refresh_token).await?;
    Ok(Json(TokenPairResponse::from_pair(pair, now_unix())))
}

/// End the caller's session.
///
/// Revokes the presented access credential and, when the body carries one,
/// the matching refresh credential.
///
/// POST /api/v1/auth/logout
#[instrument(skip_all, name = "session.handler.logout")]
pub async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<AuthenticatedSubject>,
    payload: Option<Json<LogoutRequest>>,
) -> Result<Json<RevokeResponse>, SessionError> {
    let request = payload.map(|Json(p)| p).unwrap_or_default();
    let deleted = state
        .manager
        .logout(&session, request.refresh_token.as_deref())
        .await?;
    Ok(Json(RevokeResponse { deleted }))
}

/// Revoke a single access or refresh credential.
///
/// POST /api/v1/auth/revoke
#[instrument(skip_all, name = "session.handler.revoke")]
pub async fn revoke(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RevokeRequest>, JsonRejection>,
) -> Result<Json<RevokeResponse>, SessionError> {
    let Json(payload) = payload?;
    let deleted = state.manager.revoke(&payload.token).await?;
    Ok(Json(RevokeResponse { deleted }))
}

/// GET /api/v1/auth/session
pub async fn current_session(
    Extension(session): Extension<AuthenticatedSubject>,
) -> Json<SessionResponse> {
    Json(SessionResponse {
        subject_id: session.subject_id.into_inner(),
    })
}

/// Issue a long-lived access token for the caller's own subject.
///
/// POST /api/v1/auth/long-lived-token
#[instrument(skip_all, name = "session.handler.long_lived")]
pub async fn issue_long_lived(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<AuthenticatedSubject>,
) -> Result<Json<AccessTokenResponse>, SessionError> {
    let issued = state.manager.issue_long_lived(&session.subject_id).await?;
    Ok(Json(AccessTokenResponse::from_issued(issued, now_unix())))
}

fn now_unix() -> i64 {
    chrono::Utc::now().timestamp()
}
