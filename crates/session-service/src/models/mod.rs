use crate::services::{IssuedToken, TokenPair};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Token type reported in token responses (RFC 6750).
pub const TOKEN_TYPE_BEARER: &str = "Bearer";

/// POST /api/v1/auth/refresh body
#[derive(Clone, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

impl fmt::Debug for RefreshRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshRequest")
            .field("refresh_token", &"[REDACTED]")
            .finish()
    }
}

/// POST /api/v1/auth/logout body (optional)
#[derive(Clone, Default, Deserialize)]
pub struct LogoutRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl fmt::Debug for LogoutRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogoutRequest")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// POST /api/v1/auth/revoke body
#[derive(Clone, Deserialize)]
pub struct RevokeRequest {
    pub token: String,
}

impl fmt::Debug for RevokeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RevokeRequest")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// Access/refresh pair response
#[derive(Clone, Serialize, Deserialize)]
pub struct TokenPairResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Seconds until the access token expires
    pub expires_in: u64,
}

impl TokenPairResponse {
    pub fn from_pair(pair: TokenPair, now: i64) -> Self {
        Self {
            expires_in: seconds_until(pair.access_expires_at, now),
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            token_type: TOKEN_TYPE_BEARER.to_string(),
        }
    }
}

impl fmt::Debug for TokenPairResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPairResponse")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// Single access token response (long-lived tokens)
#[derive(Clone, Serialize, Deserialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

impl AccessTokenResponse {
    pub fn from_issued(issued: IssuedToken, now: i64) -> Self {
        Self {
            expires_in: seconds_until(issued.expires_at, now),
            access_token: issued.token,
            token_type: TOKEN_TYPE_BEARER.to_string(),
        }
    }
}

impl fmt::Debug for AccessTokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessTokenResponse")
            .field("access_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// Revocation/logout result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevokeResponse {
    pub deleted: u64,
}

/// GET /api/v1/auth/session response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub subject_id: String,
}

/// Readiness probe response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn seconds_until(expires_at: i64, now: i64) -> u64 {
    u64::try_from(expires_at.saturating_sub(now)).unwrap_or(0)
}
