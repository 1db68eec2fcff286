//! Custom test assertions for expressive tests
//!
//! Decodes session tokens without verifying them, for checking shape and
//! claims in tests.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde_json::Value;

fn segment(token: &str, index: usize) -> Value {
    let parts: Vec<_> = token.split('.').collect();
    assert_eq!(
        parts.len(),
        3,
        "JWT must have 3 parts (header.payload.signature), got {}",
        parts.len()
    );
    let bytes = URL_SAFE_NO_PAD
        .decode(parts[index])
        .expect("Failed to base64 decode JWT segment");
    serde_json::from_slice(&bytes).expect("Failed to parse JWT segment JSON")
}

/// Decoded payload of a token, without verification.
pub fn decode_claims(token: &str) -> Value {
    segment(token, 1)
}

/// Custom assertions for session tokens
///
/// # Example
/// ```rust,ignore
/// pair.access_token
///     .assert_access_token()
///     .assert_for_subject("user-42")
///     .assert_expires_in(900);
/// ```
pub trait TokenAssertions {
    /// Assert an HS256 JWT carrying access claims with `authorized: true`
    fn assert_access_token(&self) -> &Self;

    /// Assert an HS256 JWT carrying refresh claims
    fn assert_refresh_token(&self) -> &Self;

    /// Assert that the token expires within the specified seconds (5s tolerance)
    fn assert_expires_in(&self, seconds: u64) -> &Self;

    /// Assert that the token is for the specified subject
    fn assert_for_subject(&self, subject: &str) -> &Self;
}

impl TokenAssertions for String {
    fn assert_access_token(&self) -> &Self {
        let header = segment(self, 0);
        assert_eq!(header["alg"], "HS256", "Expected HS256 algorithm");

        let claims = decode_claims(self);
        assert_eq!(claims["authorized"], true, "Access token must be authorized");
        assert!(claims["access_uuid"].is_string(), "Missing access_uuid claim");
        assert!(claims["iat"].is_i64(), "Missing iat claim");
        self
    }

    fn assert_refresh_token(&self) -> &Self {
        let header = segment(self, 0);
        assert_eq!(header["alg"], "HS256", "Expected HS256 algorithm");

        let claims = decode_claims(self);
        assert!(claims["refresh_uuid"].is_string(), "Missing refresh_uuid claim");
        assert!(claims.get("authorized").is_none(), "Refresh token must not carry authorized");
        self
    }

    fn assert_expires_in(&self, seconds: u64) -> &Self {
        let claims = decode_claims(self);
        let exp = claims["exp"].as_i64().expect("Missing exp claim");
        let expires_in = exp - chrono::Utc::now().timestamp();

        assert!(
            (expires_in - seconds as i64).abs() <= 5,
            "Expected token to expire in {} seconds, but expires in {} seconds",
            seconds,
            expires_in
        );
        self
    }

    fn assert_for_subject(&self, subject: &str) -> &Self {
        let claims = decode_claims(self);
        assert_eq!(
            claims["user_id"], subject,
            "Expected subject '{}', got {}",
            subject, claims["user_id"]
        );
        self
    }
}
