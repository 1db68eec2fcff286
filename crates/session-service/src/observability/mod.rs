//! Observability for the session service.
//!
//! # Privacy by Default
//!
//! All instrumentation uses `#[instrument(skip_all)]` and explicit safe field
//! allow-listing. Fields are categorized as:
//! - **SAFE**: Can be logged in plaintext (credential ids, operation names, outcomes)
//! - **HASHED**: Must be SHA-256 hashed for correlation (subject ids)
//! - **NEVER**: Must never appear in logs (secrets, tokens, store passwords)

pub mod metrics;

use crate::errors::SessionError;
use sha2::{Digest, Sha256};

/// Hash a field value for correlation in logs (SHA-256, first 8 hex chars).
///
/// Used for subject ids, which need correlation across log entries but
/// should not be logged in plaintext. Not a secret-protection primitive.
pub fn hash_for_correlation(value: &str) -> String {
    let digest = Sha256::digest(value.as_bytes());
    // First 4 bytes (8 hex chars): enough for correlation, limits reversibility
    hex::encode(digest.get(..4).unwrap_or_default())
}

/// Error categories for metrics labels (bounded cardinality).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Unparseable token or missing/garbled header
    Malformed,
    /// Signature or algorithm mismatch
    Signature,
    /// `exp` in the past
    Expired,
    /// Credential not live, reused, or subject mismatch
    Unauthorized,
    /// Credential store unreachable
    Store,
    /// Encoding or other internal failure
    Internal,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Malformed => "malformed",
            ErrorCategory::Signature => "signature",
            ErrorCategory::Expired => "expired",
            ErrorCategory::Unauthorized => "unauthorized",
            ErrorCategory::Store => "store",
            ErrorCategory::Internal => "internal",
        }
    }
}

impl From<&SessionError> for ErrorCategory {
    fn from(err: &SessionError) -> Self {
        match err {
            SessionError::MalformedToken
            | SessionError::MissingCredential
            | SessionError::InvalidSubject
            | SessionError::InvalidRequest(_) => ErrorCategory::Malformed,
            SessionError::InvalidSignature => ErrorCategory::Signature,
            SessionError::Expired => ErrorCategory::Expired,
            SessionError::Unauthorized => ErrorCategory::Unauthorized,
            SessionError::StoreUnavailable(_) => ErrorCategory::Store,
            SessionError::Encoding(_) => ErrorCategory::Internal,
        }
    }
}
