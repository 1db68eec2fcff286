//! HTTP routes for the session service.
//!
//! Defines the Axum router and application state.

use crate::handlers;
use crate::middleware::{require_session, RequestAuthenticator};
use crate::services::SessionManager;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Session Manager over the configured credential store.
    pub manager: SessionManager,
}

/// Build the application routes.
///
/// - `/health`, `/ready`, `/metrics` - operational endpoints, unversioned
/// - `/api/v1/auth/refresh`, `/api/v1/auth/revoke` - public, the token in
///   the body is the credential
/// - `/api/v1/auth/logout`, `/api/v1/auth/session`,
///   `/api/v1/auth/long-lived-token` - require a bearer access token
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let authenticator = Arc::new(RequestAuthenticator::new(state.manager.clone()));

    let public_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/api/v1/auth/refresh", post(handlers::refresh))
        .route("/api/v1/auth/revoke", post(handlers::revoke))
        .with_state(state.clone());

    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    let protected_routes = Router::new()
        .route("/api/v1/auth/logout", post(handlers::logout))
        .route("/api/v1/auth/session", get(handlers::current_session))
        .route(
            "/api/v1/auth/long-lived-token",
            post(handlers::issue_long_lived),
        )
        .route_layer(middleware::from_fn_with_state(
            authenticator,
            require_session,
        ))
        .with_state(state);

    public_routes
        .merge(metrics_routes)
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
}
