//! Secret types for protecting sensitive values from accidental logging.
//!
//! This module re-exports types from the [`secrecy`] crate. Every signing
//! secret, store password and bearer token handled by the session service is
//! carried in one of these wrappers.
//!
//! `SecretString` implements `Debug` with redaction, so a struct deriving
//! `Debug` that holds one is safe to log with `{:?}` or through tracing.
//! The value is zeroized on drop.
//!
//! ```rust
//! use common::secret::{ExposeSecret, SecretString};
//!
//! #[derive(Debug)]
//! struct SigningConfig {
//!     access_secret: SecretString,
//! }
//!
//! let config = SigningConfig { access_secret: SecretString::from("s3cr3t") };
//! assert!(!format!("{config:?}").contains("s3cr3t"));
//! assert_eq!(config.access_secret.expose_secret(), "s3cr3t");
//! ```

pub use secrecy::{ExposeSecret, SecretBox, SecretString};

/// True when the secret is empty or only whitespace.
///
/// An empty HMAC key would still "work" cryptographically, so callers must
/// treat this as a fatal misconfiguration rather than silently signing.
#[must_use]
pub fn is_blank(secret: &SecretString) -> bool {
    secret.expose_secret().trim().is_empty()
}

/// Compare two secrets without short-circuiting on the first differing byte.
#[must_use]
pub fn same_secret(a: &SecretString, b: &SecretString) -> bool {
    let a = a.expose_secret().as_bytes();
    let b = b.expose_secret().as_bytes();
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
