//! Health check handlers.
//!
//! - `/health`: Liveness probe - returns OK if the process is running
//! - `/ready`: Readiness probe - pings the credential store

use crate::models::ReadinessResponse;
use crate::routes::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use std::sync::Arc;

/// Liveness probe handler. Does not check any dependencies.
pub async fn health_check() -> &'static str {
    "OK"
}

/// Readiness probe handler.
///
/// Returns 200 when the credential store answers a ping, 503 otherwise.
/// The error message is generic; the actual failure is logged server-side.
#[tracing::instrument(skip_all, name = "session.health.readiness")]
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    if let Err(e) = state.manager.store().ping().await {
        tracing::warn!(
            target: "session.health",
            error = %e,
            "Readiness check failed: credential store unavailable"
        );
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadinessResponse {
                status: "not_ready".to_string(),
                store: Some("unhealthy".to_string()),
                error: Some("Service dependencies unavailable".to_string()),
            }),
        );
    }

    (
        StatusCode::OK,
        Json(ReadinessResponse {
            status: "ready".to_string(),
            store: Some("healthy".to_string()),
            error: None,
        }),
    )
}
