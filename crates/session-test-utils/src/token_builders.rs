//! Builder patterns for test data construction
//!
//! `TestTokenBuilder` forges session tokens with arbitrary claims, secrets
//! and algorithms so tests can exercise every rejection path of the codec.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::test_ids::{TEST_ACCESS_SECRET, TEST_REFRESH_SECRET};

/// Which token shape to forge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Builder for forged session tokens
///
/// # Example
/// ```rust,ignore
/// let token = TestTokenBuilder::access()
///     .for_subject("user-alice")
///     .expires_in(-60)
///     .sign();
/// ```
pub struct TestTokenBuilder {
    kind: TokenKind,
    credential_id: Uuid,
    subject: String,
    authorized: bool,
    exp: i64,
    iat: i64,
    algorithm: Algorithm,
    secret: String,
    omitted: Vec<&'static str>,
}

impl TestTokenBuilder {
    /// Access token signed with the test access secret, valid for an hour.
    pub fn access() -> Self {
        Self::new(TokenKind::Access, TEST_ACCESS_SECRET)
    }

    /// Refresh token signed with the test refresh secret, valid for an hour.
    pub fn refresh() -> Self {
        Self::new(TokenKind::Refresh, TEST_REFRESH_SECRET)
    }

    fn new(kind: TokenKind, secret: &str) -> Self {
        let now = Utc::now();
        Self {
            kind,
            credential_id: Uuid::new_v4(),
            subject: "test-subject".to_string(),
            authorized: true,
            exp: (now + Duration::seconds(3600)).timestamp(),
            iat: now.timestamp(),
            algorithm: Algorithm::HS256,
            secret: secret.to_string(),
            omitted: Vec::new(),
        }
    }

    pub fn for_subject(mut self, subject: &str) -> Self {
        self.subject = subject.to_string();
        self
    }

    pub fn with_credential_id(mut self, id: Uuid) -> Self {
        self.credential_id = id;
        self
    }

    /// Set the `authorized` claim (access tokens only).
    pub fn authorized(mut self, authorized: bool) -> Self {
        self.authorized = authorized;
        self
    }

    /// Set expiration in seconds from now (negative for already expired).
    pub fn expires_in(mut self, seconds: i64) -> Self {
        self.exp = (Utc::now() + Duration::seconds(seconds)).timestamp();
        self
    }

    /// Set issued-at timestamp
    pub fn issued_at(mut self, timestamp: i64) -> Self {
        self.iat = timestamp;
        self
    }

    pub fn signed_with(mut self, secret: &str) -> Self {
        self.secret = secret.to_string();
        self
    }

    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Drop a claim from the payload.
    pub fn without_claim(mut self, claim: &'static str) -> Self {
        self.omitted.push(claim);
        self
    }

    pub fn credential_id(&self) -> Uuid {
        self.credential_id
    }

    /// Build the claims as a JSON value
    pub fn build(&self) -> Value {
        let mut claims = match self.kind {
            TokenKind::Access => json!({
                "authorized": self.authorized,
                "access_uuid": self.credential_id,
                "user_id": self.subject,
                "exp": self.exp,
                "iat": self.iat,
            }),
            TokenKind::Refresh => json!({
                "refresh_uuid": self.credential_id,
                "user_id": self.subject,
                "exp": self.exp,
                "iat": self.iat,
            }),
        };
        if let Some(map) = claims.as_object_mut() {
            for claim in &self.omitted {
                map.remove(*claim);
            }
        }
        claims
    }

    /// Sign the claims with the configured secret and HMAC algorithm.
    pub fn sign(&self) -> String {
        encode(
            &Header::new(self.algorithm),
            &self.build(),
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .expect("HMAC signing of test claims should not fail")
    }

    /// Unsecured JWT (`alg: none`, empty signature segment).
    pub fn sign_unsecured(&self) -> String {
        let header = json!({ "alg": "none", "typ": "JWT" });
        format!(
            "{}.{}.",
            URL_SAFE_NO_PAD.encode(header.to_string()),
            URL_SAFE_NO_PAD.encode(self.build().to_string())
        )
    }
}

/// Token whose header and payload segments are arbitrary JSON objects,
/// with a garbage signature.
pub fn raw_token(header: &Map<String, Value>, payload: &Map<String, Value>) -> String {
    format!(
        "{}.{}.c2lnbmF0dXJl",
        URL_SAFE_NO_PAD.encode(Value::Object(header.clone()).to_string()),
        URL_SAFE_NO_PAD.encode(Value::Object(payload.clone()).to_string())
    )
}
