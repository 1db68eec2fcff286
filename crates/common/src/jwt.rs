//! JWT framing utilities shared by the session crates.
//!
//! This module provides the token-independent checks that run before (or
//! around) signature verification:
//! - Size limits for DoS prevention
//! - Reading the `alg` header so algorithm substitution can be rejected
//! - Clock skew constants and `iat` validation
//! - `Authorization: Bearer <token>` header parsing
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing
//! - Nothing here verifies a signature; callers must still verify
//! - Error messages are generic to prevent information leakage
//!
//! ```rust,ignore
//! use common::jwt::{extract_alg, extract_bearer_token, EXPECTED_ALGORITHM};
//!
//! let token = extract_bearer_token(header_value)?;
//! if extract_alg(token)? != EXPECTED_ALGORITHM {
//!     return Err(InvalidSignature);
//! }
//! ```

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Maximum allowed JWT size in bytes (8KB).
///
/// Session tokens are ~250 bytes (HS256, four or five short claims). Larger
/// inputs are rejected BEFORE base64 decoding or HMAC computation.
pub const MAX_JWT_SIZE_BYTES: usize = 8192; // 8KB

/// The only signing algorithm session tokens may carry.
pub const EXPECTED_ALGORITHM: &str = "HS256";

/// Default JWT clock skew tolerance (5 minutes).
///
/// Tokens with an `iat` more than this far in the future are rejected.
pub const DEFAULT_CLOCK_SKEW: Duration = Duration::from_secs(300);

/// Maximum allowed JWT clock skew tolerance (10 minutes).
pub const MAX_CLOCK_SKEW: Duration = Duration::from_secs(600);

/// Authentication scheme expected in the `Authorization` header.
pub const BEARER_SCHEME: &str = "Bearer";

// =============================================================================
// Error Types
// =============================================================================

/// Errors from JWT framing checks.
///
/// Note: Error messages are intentionally generic to prevent information leakage.
/// Detailed information is logged at debug level for troubleshooting.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JwtValidationError {
    /// Token size exceeds maximum allowed.
    #[error("The access token is invalid or expired")]
    TokenTooLarge,

    /// Token format is invalid (not a valid JWT structure).
    #[error("The access token is invalid or expired")]
    MalformedToken,

    /// Token header has no usable `alg` field.
    #[error("The access token is invalid or expired")]
    MissingAlg,

    /// Token `iat` claim is too far in the future.
    #[error("The access token is invalid or expired")]
    IatTooFarInFuture,

    /// Authorization header is absent or not `Bearer <token>`.
    #[error("Missing or malformed Authorization header")]
    MissingBearer,
}

// =============================================================================
// Functions
// =============================================================================

/// Extract the `alg` value from a JWT header without verifying the signature.
///
/// Used to reject tokens whose declared algorithm is not the expected
/// symmetric scheme before any key material is involved.
///
/// # Errors
///
/// - `TokenTooLarge` - Token exceeds `MAX_JWT_SIZE_BYTES`
/// - `MalformedToken` - Not three dot-separated parts, bad base64, or invalid JSON
/// - `MissingAlg` - Header has no `alg`, or `alg` is not a non-empty string
pub fn extract_alg(token: &str) -> Result<String, JwtValidationError> {
    // Check token size first (DoS prevention)
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "common.jwt",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(JwtValidationError::TokenTooLarge);
    }

    // JWT format: header.payload.signature
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        tracing::debug!(
            target: "common.jwt",
            parts = parts.len(),
            "Token rejected: invalid JWT format"
        );
        return Err(JwtValidationError::MalformedToken);
    }

    let header_part = parts.first().ok_or(JwtValidationError::MalformedToken)?;
    let header_bytes = URL_SAFE_NO_PAD.decode(header_part).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to decode JWT header base64");
        JwtValidationError::MalformedToken
    })?;

    let header: serde_json::Value = serde_json::from_slice(&header_bytes).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to parse JWT header JSON");
        JwtValidationError::MalformedToken
    })?;

    header
        .get("alg")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .ok_or(JwtValidationError::MissingAlg)
}

/// Validate the `iat` (issued-at) claim with clock skew tolerance.
///
/// # Errors
///
/// Returns `JwtValidationError::IatTooFarInFuture` if the iat timestamp is more than
/// `clock_skew` in the future.
pub fn validate_iat(iat: i64, clock_skew: Duration) -> Result<(), JwtValidationError> {
    let now = chrono::Utc::now().timestamp();
    validate_iat_at(iat, clock_skew, now)
}

/// Deterministic `iat` validation against an explicit `now` timestamp.
///
/// Prefer [`validate_iat`] in production code.
///
/// # Errors
///
/// Same as [`validate_iat`].
pub fn validate_iat_at(
    iat: i64,
    clock_skew: Duration,
    now: i64,
) -> Result<(), JwtValidationError> {
    // Safe cast: clock_skew is bounded to MAX_CLOCK_SKEW (600 seconds) by config validation
    #[allow(clippy::cast_possible_wrap)]
    let clock_skew_secs = clock_skew.as_secs() as i64;
    let max_iat = now.saturating_add(clock_skew_secs);

    if iat > max_iat {
        tracing::debug!(
            target: "common.jwt",
            iat = iat,
            now = now,
            max_allowed = max_iat,
            clock_skew_secs = clock_skew_secs,
            "Token rejected: iat too far in the future"
        );
        return Err(JwtValidationError::IatTooFarInFuture);
    }

    Ok(())
}

/// Extract the token from an `Authorization` header value.
///
/// The header must consist of exactly two space-separated segments, the
/// first being the `Bearer` scheme (case-insensitive per RFC 6750) and the
/// second a non-empty token.
///
/// # Errors
///
/// Returns `JwtValidationError::MissingBearer` for any other shape.
pub fn extract_bearer_token(header: &str) -> Result<&str, JwtValidationError> {
    let segments: Vec<&str> = header.split(' ').collect();
    match segments.as_slice() {
        [scheme, token] if scheme.eq_ignore_ascii_case(BEARER_SCHEME) && !token.is_empty() => {
            Ok(token)
        }
        _ => {
            tracing::debug!(
                target: "common.jwt",
                segments = segments.len(),
                "Authorization header rejected: expected 'Bearer <token>'"
            );
            Err(JwtValidationError::MissingBearer)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
