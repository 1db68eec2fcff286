//! Credential Store: expiring `credential id -> subject id` entries.
//!
//! An entry's existence is the sole source of truth for "this credential is
//! live". Absence is reported the same way for never-issued, expired and
//! revoked credentials; callers must not try to tell them apart.
//!
//! Connectivity failures are a distinct [`StoreError`], never "not found".

mod memory;
mod redis_store;

pub use memory::InMemoryCredentialStore;
pub use redis_store::RedisCredentialStore;

use async_trait::async_trait;
use common::types::{CredentialId, SubjectId};
use std::time::Duration;
use thiserror::Error;

/// Longest lifetime a credential may be stored with (10 years).
pub const MAX_CREDENTIAL_TTL: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);

/// Credential store failures. "Not found" is not an error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Credential store unavailable: {0}")]
    Unavailable(String),

    #[error("Credential store operation timed out after {0:?}")]
    Timeout(Duration),

    /// Lifetime above `MAX_CREDENTIAL_TTL`. Never retried.
    #[error("Credential lifetime out of range: {0:?}")]
    InvalidTtl(Duration),
}

/// Expiring key-value store for issued credentials.
///
/// Implementations must be safe to call from many concurrent request tasks;
/// per-key atomicity of `delete` is what makes refresh tokens single-use.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Store `subject` under `id`, expiring after `ttl`. Overwrites.
    ///
    /// A `ttl` above [`MAX_CREDENTIAL_TTL`] is rejected with
    /// [`StoreError::InvalidTtl`].
    async fn put(&self, id: CredentialId, subject: &SubjectId, ttl: Duration)
        -> Result<(), StoreError>;

    /// Live subject for `id`, or `None`.
    async fn get(&self, id: CredentialId) -> Result<Option<SubjectId>, StoreError>;

    /// Remove `id`; returns how many entries were removed (0 or 1).
    async fn delete(&self, id: CredentialId) -> Result<u64, StoreError>;

    /// Connectivity probe.
    async fn ping(&self) -> Result<(), StoreError>;
}
