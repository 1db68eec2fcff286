//! Session service error types.
//!
//! `SessionError` is what the Session Manager and the Request Authenticator
//! return. All token and credential failures collapse into one uniform
//! `401` response so a client cannot tell which validation step failed;
//! store outages stay a distinct, retryable `503`.

use crate::store::StoreError;
use crate::token::TokenError;
use axum::{
    extract::rejection::JsonRejection,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Message returned for every authentication failure.
pub const UNAUTHORIZED_MESSAGE: &str = "The access token is invalid or expired";

/// `WWW-Authenticate` challenge attached to every 401.
pub const BEARER_CHALLENGE: &str = "Bearer realm=\"session\", error=\"invalid_token\"";

/// Session layer error taxonomy.
///
/// Maps to HTTP status codes:
/// - MalformedToken, InvalidSignature, Expired, Unauthorized, MissingCredential: 401
/// - InvalidSubject, InvalidRequest: 400
/// - StoreUnavailable: 503
/// - Encoding: 500
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Token is not a parseable JWT or its claims are missing/wrongly typed.
    #[error("Malformed token")]
    MalformedToken,

    /// Signature mismatch, wrong secret, or unexpected algorithm.
    #[error("Invalid token signature")]
    InvalidSignature,

    /// The `exp` claim has passed.
    #[error("Token expired")]
    Expired,

    /// Credential not live in the store, already redeemed, subject mismatch,
    /// or subject no longer active.
    #[error("Unauthorized")]
    Unauthorized,

    /// The credential store could not be reached within its retry budget.
    #[error("Credential store unavailable: {0}")]
    StoreUnavailable(String),

    /// No usable `Authorization: Bearer <token>` header.
    #[error("Missing or malformed Authorization header")]
    MissingCredential,

    /// Issuance was requested for an empty subject identifier.
    #[error("Invalid subject identifier")]
    InvalidSubject,

    /// Request body missing, not JSON, or the wrong shape.
    #[error("Invalid request body: {0}")]
    InvalidRequest(String),

    /// Claims could not be serialized or signed.
    #[error("Token encoding failed: {0}")]
    Encoding(String),
}

impl SessionError {
    /// True only for transient infrastructure faults the caller may retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SessionError::StoreUnavailable(_))
    }

    /// HTTP status code for this error (also used for metrics).
    pub fn status_code(&self) -> StatusCode {
        match self {
            SessionError::MalformedToken
            | SessionError::InvalidSignature
            | SessionError::Expired
            | SessionError::Unauthorized
            | SessionError::MissingCredential => StatusCode::UNAUTHORIZED,
            SessionError::InvalidSubject | SessionError::InvalidRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            SessionError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            SessionError::Encoding(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<TokenError> for SessionError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::MalformedToken => SessionError::MalformedToken,
            TokenError::InvalidSignature => SessionError::InvalidSignature,
            TokenError::Expired => SessionError::Expired,
            TokenError::Encoding(reason) => SessionError::Encoding(reason),
            TokenError::EmptySecret => {
                SessionError::Encoding("signing secret is empty".to_string())
            }
        }
    }
}

impl From<StoreError> for SessionError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidTtl(_) => SessionError::Encoding(err.to_string()),
            StoreError::Unavailable(_) | StoreError::Timeout(_) => {
                SessionError::StoreUnavailable(err.to_string())
            }
        }
    }
}

impl From<JsonRejection> for SessionError {
    fn from(rejection: JsonRejection) -> Self {
        SessionError::InvalidRequest(rejection.body_text())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (code, message) = match &self {
            SessionError::MalformedToken
            | SessionError::InvalidSignature
            | SessionError::Expired
            | SessionError::Unauthorized
            | SessionError::MissingCredential => ("UNAUTHORIZED", UNAUTHORIZED_MESSAGE.to_string()),
            SessionError::InvalidSubject => {
                ("BAD_REQUEST", "Subject identifier must not be empty".to_string())
            }
            SessionError::InvalidRequest(reason) => {
                tracing::debug!(target: "session.handler", reason = %reason, "Rejected request body");
                ("BAD_REQUEST", "Request body is invalid".to_string())
            }
            SessionError::StoreUnavailable(reason) => {
                // Log actual reason server-side
                tracing::warn!(target: "session.availability", reason = %reason, "Credential store unavailable");
                (
                    "SERVICE_UNAVAILABLE",
                    "Service temporarily unavailable".to_string(),
                )
            }
            SessionError::Encoding(reason) => {
                tracing::error!(target: "session.codec", reason = %reason, "Token encoding failed");
                ("INTERNAL_ERROR", "An internal error occurred".to_string())
            }
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        let mut response = (status, Json(error_response)).into_response();

        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static(BEARER_CHALLENGE),
            );
        }

        response
    }
}
