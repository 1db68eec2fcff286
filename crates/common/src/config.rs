//! Common configuration types for session components.

use crate::secret::SecretString;
use serde::Deserialize;
use std::time::Duration;

/// Default Redis address when none is configured.
pub const DEFAULT_REDIS_ADDRESS: &str = "localhost:6379";

/// Default per-attempt timeout for a credential store operation.
pub const DEFAULT_STORE_OPERATION_TIMEOUT_MS: u64 = 500;

/// Default number of attempts for a credential store operation.
pub const DEFAULT_STORE_MAX_ATTEMPTS: u32 = 3;

/// Default initial backoff between credential store retries.
pub const DEFAULT_STORE_RETRY_BACKOFF_MS: u64 = 50;

/// Redis configuration for the expiring credential store.
///
/// The password is a `SecretString`, so `Debug` never prints it.
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    /// `host:port` of the Redis server
    pub address: String,
    /// Optional `AUTH` password
    #[serde(default)]
    pub password: Option<SecretString>,
    /// Upper bound for a single attempt of any store operation
    pub operation_timeout_ms: u64,
    /// Attempts per operation, including the first one
    pub max_attempts: u32,
    /// Initial backoff between attempts (doubled after each retry)
    pub retry_backoff_ms: u64,
}

impl RedisConfig {
    /// Config pointing at `address` with default timeouts and no password.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            password: None,
            operation_timeout_ms: DEFAULT_STORE_OPERATION_TIMEOUT_MS,
            max_attempts: DEFAULT_STORE_MAX_ATTEMPTS,
            retry_backoff_ms: DEFAULT_STORE_RETRY_BACKOFF_MS,
        }
    }

    /// Connection URL without credentials (safe to log).
    #[must_use]
    pub fn url(&self) -> String {
        format!("redis://{}", self.address)
    }

    /// Per-attempt timeout as a `Duration`.
    #[must_use]
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }

    /// Initial retry backoff as a `Duration`.
    #[must_use]
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self::new(DEFAULT_REDIS_ADDRESS)
    }
}
