//! Request Authenticator and the bearer authentication middleware.
//!
//! `require_session` guards protected routes: it extracts the Bearer token
//! from the Authorization header, validates it through the Session Manager,
//! and injects the `AuthenticatedSubject` into request extensions.

use crate::errors::SessionError;
use crate::services::{AuthenticatedSubject, SessionManager};
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::IntoResponse,
};
use common::jwt::extract_bearer_token;
use common::types::SubjectId;
use std::sync::Arc;
use tracing::instrument;

/// Stateless adapter from an `Authorization` header value to a subject.
#[derive(Clone)]
pub struct RequestAuthenticator {
    manager: SessionManager,
}

impl RequestAuthenticator {
    pub fn new(manager: SessionManager) -> Self {
        Self { manager }
    }

    /// Authenticate a raw `Authorization` header value.
    ///
    /// # Errors
    ///
    /// - `MissingCredential` if the header is absent or not `Bearer <token>`
    /// - any `SessionManager::validate` error for the token itself
    pub async fn authenticate(&self, header: Option<&str>) -> Result<SubjectId, SessionError> {
        self.authenticate_session(header)
            .await
            .map(|session| session.subject_id)
    }

    /// Like [`RequestAuthenticator::authenticate`], keeping the credential id
    /// so logout can revoke the presented access credential.
    pub async fn authenticate_session(
        &self,
        header: Option<&str>,
    ) -> Result<AuthenticatedSubject, SessionError> {
        let header = header.ok_or_else(|| {
            tracing::debug!(target: "session.middleware.auth", "Missing Authorization header");
            SessionError::MissingCredential
        })?;

        let token = extract_bearer_token(header).map_err(|e| {
            tracing::debug!(target: "session.middleware.auth", error = %e, "Invalid Authorization header format");
            SessionError::MissingCredential
        })?;

        self.manager.authenticate_token(token).await
    }
}

/// Authentication middleware for session-protected routes.
///
/// # Response
///
/// - 401 with a `WWW-Authenticate: Bearer` challenge for any credential failure
/// - 503 if the credential store is unavailable
/// - Continues with `AuthenticatedSubject` in extensions otherwise
#[instrument(skip_all, name = "session.middleware.auth")]
pub async fn require_session(
    State(authenticator): State<Arc<RequestAuthenticator>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, SessionError> {
    let header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let session = authenticator.authenticate_session(header).await?;

    req.extensions_mut().insert(session);

    Ok(next.run(req).await)
}
