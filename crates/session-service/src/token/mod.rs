//! Token Codec: HS256 signing and verification of session tokens.
//!
//! Access and refresh tokens are signed with two independent secrets.
//! Verification order matters and is fixed:
//!
//! 1. Size limit (before any decoding)
//! 2. Header `alg` must be `HS256` (algorithm substitution is rejected as a
//!    signature failure and logged as a potential attack)
//! 3. Signature, then `exp` with zero leeway
//! 4. `iat` not further in the future than the configured clock skew
//!
//! Because the signature is checked before expiry, a token signed with the
//! wrong secret always fails with `InvalidSignature`, never `Expired`.

pub mod claims;

pub use claims::{AccessClaims, RefreshClaims, TokenClaims};

use common::jwt::{
    extract_alg, validate_iat, JwtValidationError, EXPECTED_ALGORITHM, MAX_JWT_SIZE_BYTES,
};
use common::secret::{is_blank, ExposeSecret, SecretString};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::instrument;

/// Token Codec errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// A signing secret is empty. Fatal misconfiguration.
    #[error("Signing secret must not be empty")]
    EmptySecret,

    #[error("Token encoding failed: {0}")]
    Encoding(String),

    #[error("Malformed token")]
    MalformedToken,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token expired")]
    Expired,
}

/// Sign `claims` with HS256 using `secret`.
///
/// # Errors
///
/// - `EmptySecret` if the secret is blank
/// - `Encoding` if the claims cannot be serialized
#[instrument(skip_all)]
pub fn sign<C: Serialize>(claims: &C, secret: &SecretString) -> Result<String, TokenError> {
    if is_blank(secret) {
        return Err(TokenError::EmptySecret);
    }

    let header = Header::new(Algorithm::HS256);
    let encoding_key = EncodingKey::from_secret(secret.expose_secret().as_bytes());

    encode(&header, claims, &encoding_key).map_err(|e| {
        tracing::error!(target: "session.codec", error = %e, "JWT signing operation failed");
        TokenError::Encoding(format!("JWT signing operation failed: {e}"))
    })
}

/// Verify an HS256 token signed with `secret` and decode its claims.
///
/// # Errors
///
/// - `MalformedToken` - oversized, structurally broken, missing/wrongly typed
///   claims, blank subject, or `iat` too far in the future
/// - `InvalidSignature` - wrong secret, tampered payload, or non-HS256 `alg`
/// - `Expired` - `exp` has passed
#[instrument(skip_all)]
pub fn verify<C>(token: &str, secret: &SecretString, clock_skew: Duration) -> Result<C, TokenError>
where
    C: DeserializeOwned + TokenClaims,
{
    // Check token size BEFORE any parsing or cryptographic operations
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "session.codec",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(TokenError::MalformedToken);
    }

    let alg = extract_alg(token).map_err(|e| {
        tracing::debug!(target: "session.codec", error = ?e, "Token rejected: unreadable header");
        TokenError::MalformedToken
    })?;

    if alg != EXPECTED_ALGORITHM {
        tracing::warn!(
            target: "session.codec",
            alg = %alg,
            "Token rejected: unexpected signing algorithm (possible substitution attempt)"
        );
        return Err(TokenError::InvalidSignature);
    }

    if is_blank(secret) {
        return Err(TokenError::EmptySecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.expose_secret().as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.validate_exp = true;
    validation.validate_aud = false;
    validation.set_required_spec_claims(&["exp"]);

    let token_data = decode::<C>(token, &decoding_key, &validation).map_err(|e| {
        let mapped = match e.kind() {
            ErrorKind::InvalidSignature
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::InvalidAlgorithmName => TokenError::InvalidSignature,
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::MalformedToken,
        };
        if mapped == TokenError::InvalidSignature {
            tracing::warn!(target: "session.codec", error = %e, "Token signature verification failed");
        } else {
            tracing::debug!(target: "session.codec", error = %e, "Token verification failed");
        }
        mapped
    })?;

    let claims = token_data.claims;

    validate_iat(claims.issued_at(), clock_skew).map_err(|e: JwtValidationError| {
        tracing::debug!(target: "session.codec", error = ?e, "Token rejected: iat check failed");
        TokenError::MalformedToken
    })?;

    if claims.subject().is_blank() {
        tracing::debug!(target: "session.codec", "Token rejected: blank subject");
        return Err(TokenError::MalformedToken);
    }

    Ok(claims)
}

/// Holds the two signing secrets and verifies each token kind against the
/// right one.
#[derive(Clone)]
pub struct TokenCodec {
    access_secret: SecretString,
    refresh_secret: SecretString,
    clock_skew: Duration,
}

impl TokenCodec {
    /// # Errors
    ///
    /// Returns `TokenError::EmptySecret` if either secret is blank.
    pub fn new(
        access_secret: SecretString,
        refresh_secret: SecretString,
        clock_skew: Duration,
    ) -> Result<Self, TokenError> {
        if is_blank(&access_secret) || is_blank(&refresh_secret) {
            return Err(TokenError::EmptySecret);
        }
        Ok(Self {
            access_secret,
            refresh_secret,
            clock_skew,
        })
    }

    pub fn clock_skew(&self) -> Duration {
        self.clock_skew
    }

    pub fn sign_access(&self, claims: &AccessClaims) -> Result<String, TokenError> {
        sign(claims, &self.access_secret)
    }

    pub fn sign_refresh(&self, claims: &RefreshClaims) -> Result<String, TokenError> {
        sign(claims, &self.refresh_secret)
    }

    /// Verify against the access secret and require `authorized == true`.
    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, TokenError> {
        let claims: AccessClaims = verify(token, &self.access_secret, self.clock_skew)?;
        if !claims.authorized {
            tracing::debug!(target: "session.codec", "Token rejected: access token not authorized");
            return Err(TokenError::MalformedToken);
        }
        Ok(claims)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        verify(token, &self.refresh_secret, self.clock_skew)
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("access_secret", &"[REDACTED]")
            .field("refresh_secret", &"[REDACTED]")
            .field("clock_skew", &self.clock_skew)
            .finish()
    }
}
