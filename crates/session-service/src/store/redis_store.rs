//! Redis-backed credential store.
//!
//! # Connection Pattern
//!
//! The redis-rs `ConnectionManager` multiplexes commands over one connection
//! and re-establishes it after the socket drops, so a Redis restart heals
//! on the next attempt. It is cheap to clone and each operation clones it.
//!
//! # Timeouts and retries
//!
//! Every attempt is bounded by `operation_timeout`. Connectivity failures
//! (I/O errors, dropped connections, timeouts) are retried with exponential
//! backoff up to `max_attempts` attempts in total. Any other Redis error is
//! surfaced immediately.
//!
//! Key layout: the credential id itself, value = subject id, `PX` expiry.

use super::{CredentialStore, StoreError, MAX_CREDENTIAL_TTL};
use crate::observability::metrics::{record_store_operation, record_store_retry};
use async_trait::async_trait;
use common::config::RedisConfig;
use common::secret::ExposeSecret;
use common::types::{CredentialId, SubjectId};
use redis::aio::ConnectionManager;
use redis::{Client, Cmd, FromRedisValue, IntoConnectionInfo, RedisError};
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, error, instrument, warn};

/// Upper bound for the backoff between two attempts.
const MAX_RETRY_BACKOFF: Duration = Duration::from_secs(1);

/// Per-attempt timeout and retry budget for store commands.
#[derive(Debug, Clone, Copy)]
struct RetryPolicy {
    operation_timeout: Duration,
    max_attempts: u32,
    retry_backoff: Duration,
}

impl RetryPolicy {
    fn from_config(config: &RedisConfig) -> Self {
        Self {
            operation_timeout: config.operation_timeout(),
            max_attempts: config.max_attempts.max(1),
            retry_backoff: config.retry_backoff(),
        }
    }

    /// Run `attempt` until it succeeds, fails with a non-connectivity
    /// error, or the attempt budget is spent.
    async fn run<T, F, Fut>(&self, operation: &'static str, mut attempt: F) -> Result<T, StoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RedisError>>,
    {
        let mut backoff = self.retry_backoff;
        let mut attempt_no: u32 = 1;

        loop {
            let start = Instant::now();
            let outcome = tokio::time::timeout(self.operation_timeout, attempt()).await;

            let err = match outcome {
                Ok(Ok(value)) => {
                    record_store_operation(operation, "success", start.elapsed());
                    return Ok(value);
                }
                Ok(Err(e)) => {
                    record_store_operation(operation, "error", start.elapsed());
                    if !is_connectivity_error(&e) {
                        warn!(target: "session.store", operation, error = %e, "Redis command failed");
                        return Err(StoreError::Unavailable(format!("{operation} failed: {e}")));
                    }
                    StoreError::Unavailable(format!("{operation} failed: {e}"))
                }
                Err(_) => {
                    record_store_operation(operation, "timeout", start.elapsed());
                    StoreError::Timeout(self.operation_timeout)
                }
            };

            if attempt_no >= self.max_attempts {
                warn!(
                    target: "session.store",
                    operation,
                    attempts = attempt_no,
                    error = %err,
                    "Redis operation failed, retry budget exhausted"
                );
                return Err(err);
            }

            debug!(
                target: "session.store",
                operation,
                attempt = attempt_no,
                backoff_ms = u64::try_from(backoff.as_millis()).unwrap_or(u64::MAX),
                error = %err,
                "Redis operation failed, retrying"
            );
            record_store_retry(operation);

            tokio::time::sleep(backoff).await;
            backoff = next_backoff(backoff);
            attempt_no += 1;
        }
    }
}

/// Credential store over a self-reconnecting Redis connection.
#[derive(Clone)]
pub struct RedisCredentialStore {
    connection: ConnectionManager,
    policy: RetryPolicy,
}

impl RedisCredentialStore {
    /// Connect to Redis and verify the connection with `PING`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the address is invalid, the connection cannot
    /// be established within the operation timeout, or `PING` fails.
    pub async fn connect(config: &RedisConfig) -> Result<Self, StoreError> {
        // Note: Do NOT log the connection info; it carries the password.
        let mut info = config.url().into_connection_info().map_err(|e| {
            error!(target: "session.store", error = %e, "Invalid Redis address");
            StoreError::Unavailable(format!("Invalid Redis address: {e}"))
        })?;
        if let Some(password) = &config.password {
            info.redis.password = Some(password.expose_secret().to_string());
        }

        let client = Client::open(info).map_err(|e| {
            error!(target: "session.store", error = %e, "Failed to open Redis client");
            StoreError::Unavailable(format!("Failed to open Redis client: {e}"))
        })?;

        let policy = RetryPolicy::from_config(config);
        let connection = tokio::time::timeout(policy.operation_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| {
                error!(target: "session.store", address = %config.address, "Timed out connecting to Redis");
                StoreError::Timeout(policy.operation_timeout)
            })?
            .map_err(|e| {
                error!(target: "session.store", address = %config.address, error = %e, "Failed to connect to Redis");
                StoreError::Unavailable(format!("Failed to connect to Redis: {e}"))
            })?;

        let store = Self { connection, policy };

        store.ping().await?;
        debug!(target: "session.store", address = %config.address, "Connected to Redis");

        Ok(store)
    }

    async fn query<T: FromRedisValue>(
        &self,
        operation: &'static str,
        cmd: &Cmd,
    ) -> Result<T, StoreError> {
        self.policy
            .run(operation, || {
                let mut conn = self.connection.clone();
                async move { cmd.query_async(&mut conn).await }
            })
            .await
    }
}

/// Whether a Redis error means "could not talk to Redis" (worth retrying).
fn is_connectivity_error(err: &RedisError) -> bool {
    err.is_io_error() || err.is_connection_dropped() || err.is_connection_refusal() || err.is_timeout()
}

/// Double the backoff, capped at `MAX_RETRY_BACKOFF`.
fn next_backoff(current: Duration) -> Duration {
    current.saturating_mul(2).min(MAX_RETRY_BACKOFF)
}

#[async_trait]
impl CredentialStore for RedisCredentialStore {
    #[instrument(skip_all, fields(credential_id = %id))]
    async fn put(
        &self,
        id: CredentialId,
        subject: &SubjectId,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        if ttl > MAX_CREDENTIAL_TTL {
            return Err(StoreError::InvalidTtl(ttl));
        }
        // Redis rejects PX 0; a credential with no remaining lifetime is
        // stored for the minimum 1ms and expires immediately.
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);

        let mut cmd = redis::cmd("SET");
        cmd.arg(id.store_key())
            .arg(subject.as_str())
            .arg("PX")
            .arg(ttl_ms);

        self.query::<()>("put", &cmd).await
    }

    #[instrument(skip_all, fields(credential_id = %id))]
    async fn get(&self, id: CredentialId) -> Result<Option<SubjectId>, StoreError> {
        let mut cmd = redis::cmd("GET");
        cmd.arg(id.store_key());

        let value: Option<String> = self.query("get", &cmd).await?;
        Ok(value.map(SubjectId::from))
    }

    #[instrument(skip_all, fields(credential_id = %id))]
    async fn delete(&self, id: CredentialId) -> Result<u64, StoreError> {
        let mut cmd = redis::cmd("DEL");
        cmd.arg(id.store_key());

        self.query("delete", &cmd).await
    }

    #[instrument(skip_all)]
    async fn ping(&self) -> Result<(), StoreError> {
        let cmd = redis::cmd("PING");
        let _pong: String = self.query("ping", &cmd).await?;
        Ok(())
    }
}
