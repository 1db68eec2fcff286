//! Session service configuration.
//!
//! Configuration is loaded from environment variables. Signing secrets and
//! the store password are `SecretString`s and never appear in Debug output.
//! Any invalid value is a startup failure.

use crate::services::session_manager::{
    DEFAULT_ACCESS_TTL, DEFAULT_LONG_LIVED_TTL, DEFAULT_REFRESH_TTL,
};
use crate::services::SessionPolicy;
use crate::store::MAX_CREDENTIAL_TTL;
use common::config::{
    RedisConfig, DEFAULT_REDIS_ADDRESS, DEFAULT_STORE_MAX_ATTEMPTS,
    DEFAULT_STORE_OPERATION_TIMEOUT_MS, DEFAULT_STORE_RETRY_BACKOFF_MS,
};
use common::jwt::{DEFAULT_CLOCK_SKEW, MAX_CLOCK_SKEW};
use common::secret::{is_blank, same_secret, SecretString};
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Default HTTP bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:9999";

/// Upper bound for every `*_TOKEN_TTL_SECONDS` setting (10 years).
pub const MAX_TOKEN_TTL_SECONDS: u64 = MAX_CREDENTIAL_TTL.as_secs();

/// Upper bound for `STORE_OPERATION_TIMEOUT_MS`.
pub const MAX_STORE_OPERATION_TIMEOUT_MS: u64 = 30_000;

/// Upper bound for `STORE_MAX_ATTEMPTS`.
pub const MAX_STORE_ATTEMPTS: u32 = 10;

/// Upper bound for `STORE_RETRY_BACKOFF_MS`.
pub const MAX_STORE_RETRY_BACKOFF_MS: u64 = 1_000;

/// Which credential store backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Redis at `REDIS_ADDRESS` (production)
    Redis,
    /// Process-local map (development and tests only)
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redis" => Ok(StoreBackend::Redis),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(ConfigError::InvalidStoreBackend(format!(
                "STORE_BACKEND must be 'redis' or 'memory', got '{other}'"
            ))),
        }
    }
}

/// Session service configuration.
#[derive(Clone)]
pub struct Config {
    /// Secret for signing access tokens.
    pub access_secret: SecretString,

    /// Secret for signing refresh tokens. Must differ from the access secret.
    pub refresh_secret: SecretString,

    /// Credential store connection settings.
    pub redis: RedisConfig,

    pub store_backend: StoreBackend,

    /// HTTP bind address (default: "0.0.0.0:9999").
    pub bind_address: String,

    pub access_token_ttl_seconds: u64,
    pub refresh_token_ttl_seconds: u64,
    pub long_lived_token_ttl_seconds: u64,

    /// Tolerance for `iat` claims in the future.
    pub jwt_clock_skew_seconds: u64,
}

/// Custom Debug implementation that redacts sensitive fields.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("access_secret", &"[REDACTED]")
            .field("refresh_secret", &"[REDACTED]")
            .field("redis", &self.redis)
            .field("store_backend", &self.store_backend)
            .field("bind_address", &self.bind_address)
            .field("access_token_ttl_seconds", &self.access_token_ttl_seconds)
            .field("refresh_token_ttl_seconds", &self.refresh_token_ttl_seconds)
            .field(
                "long_lived_token_ttl_seconds",
                &self.long_lived_token_ttl_seconds,
            )
            .field("jwt_clock_skew_seconds", &self.jwt_clock_skew_seconds)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Signing secret must not be empty: {0}")]
    EmptySecret(String),

    #[error("ACCESS_SECRET and REFRESH_SECRET must be different")]
    SecretsNotDistinct,

    #[error("Invalid token lifetime configuration: {0}")]
    InvalidTokenTtl(String),

    #[error("Invalid credential store configuration: {0}")]
    InvalidStoreSetting(String),

    #[error("Invalid store backend: {0}")]
    InvalidStoreBackend(String),

    #[error("Invalid JWT clock skew configuration: {0}")]
    InvalidJwtClockSkew(String),

    #[error("Invalid bind address: {0}")]
    InvalidBindAddress(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let access_secret = required_secret(vars, "ACCESS_SECRET")?;
        let refresh_secret = required_secret(vars, "REFRESH_SECRET")?;
        if same_secret(&access_secret, &refresh_secret) {
            return Err(ConfigError::SecretsNotDistinct);
        }

        let address = vars
            .get("REDIS_ADDRESS")
            .filter(|v| !v.trim().is_empty())
            .cloned()
            .unwrap_or_else(|| DEFAULT_REDIS_ADDRESS.to_string());

        let password = vars
            .get("REDIS_PASSWORD")
            .filter(|v| !v.is_empty())
            .map(|v| SecretString::from(v.as_str()));

        let store_backend = match vars.get("STORE_BACKEND") {
            Some(value) => value.parse()?,
            None => StoreBackend::Redis,
        };

        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());
        bind_address.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidBindAddress(format!(
                "BIND_ADDRESS must be a socket address, got '{bind_address}': {e}"
            ))
        })?;

        // Token lifetimes
        let access_token_ttl_seconds = parse_token_ttl(
            vars,
            "ACCESS_TOKEN_TTL_SECONDS",
            DEFAULT_ACCESS_TTL.as_secs(),
        )?;

        let refresh_token_ttl_seconds = parse_token_ttl(
            vars,
            "REFRESH_TOKEN_TTL_SECONDS",
            DEFAULT_REFRESH_TTL.as_secs(),
        )?;
        if refresh_token_ttl_seconds <= access_token_ttl_seconds {
            return Err(ConfigError::InvalidTokenTtl(format!(
                "REFRESH_TOKEN_TTL_SECONDS ({refresh_token_ttl_seconds}) must be greater than \
                 ACCESS_TOKEN_TTL_SECONDS ({access_token_ttl_seconds})"
            )));
        }

        let long_lived_token_ttl_seconds = parse_token_ttl(
            vars,
            "LONG_LIVED_TOKEN_TTL_SECONDS",
            DEFAULT_LONG_LIVED_TTL.as_secs(),
        )?;

        // Credential store timeouts and retries
        let operation_timeout_ms = parse_u64(
            vars,
            "STORE_OPERATION_TIMEOUT_MS",
            DEFAULT_STORE_OPERATION_TIMEOUT_MS,
            ConfigError::InvalidStoreSetting,
        )?;
        if !(1..=MAX_STORE_OPERATION_TIMEOUT_MS).contains(&operation_timeout_ms) {
            return Err(ConfigError::InvalidStoreSetting(format!(
                "STORE_OPERATION_TIMEOUT_MS must be between 1 and {MAX_STORE_OPERATION_TIMEOUT_MS}, \
                 got {operation_timeout_ms}"
            )));
        }

        let max_attempts = parse_u64(
            vars,
            "STORE_MAX_ATTEMPTS",
            u64::from(DEFAULT_STORE_MAX_ATTEMPTS),
            ConfigError::InvalidStoreSetting,
        )?;
        let max_attempts = u32::try_from(max_attempts)
            .ok()
            .filter(|n| (1..=MAX_STORE_ATTEMPTS).contains(n))
            .ok_or_else(|| {
                ConfigError::InvalidStoreSetting(format!(
                    "STORE_MAX_ATTEMPTS must be between 1 and {MAX_STORE_ATTEMPTS}, got {max_attempts}"
                ))
            })?;

        let retry_backoff_ms = parse_u64(
            vars,
            "STORE_RETRY_BACKOFF_MS",
            DEFAULT_STORE_RETRY_BACKOFF_MS,
            ConfigError::InvalidStoreSetting,
        )?;
        if retry_backoff_ms > MAX_STORE_RETRY_BACKOFF_MS {
            return Err(ConfigError::InvalidStoreSetting(format!(
                "STORE_RETRY_BACKOFF_MS must be at most {MAX_STORE_RETRY_BACKOFF_MS}, got {retry_backoff_ms}"
            )));
        }

        // Parse JWT clock skew tolerance with validation
        let jwt_clock_skew_seconds = parse_u64(
            vars,
            "JWT_CLOCK_SKEW_SECONDS",
            DEFAULT_CLOCK_SKEW.as_secs(),
            ConfigError::InvalidJwtClockSkew,
        )?;
        if jwt_clock_skew_seconds == 0 {
            return Err(ConfigError::InvalidJwtClockSkew(
                "JWT_CLOCK_SKEW_SECONDS must be positive".to_string(),
            ));
        }
        if jwt_clock_skew_seconds > MAX_CLOCK_SKEW.as_secs() {
            return Err(ConfigError::InvalidJwtClockSkew(format!(
                "JWT_CLOCK_SKEW_SECONDS must not exceed {} seconds, got {jwt_clock_skew_seconds}",
                MAX_CLOCK_SKEW.as_secs()
            )));
        }

        Ok(Config {
            access_secret,
            refresh_secret,
            redis: RedisConfig {
                address,
                password,
                operation_timeout_ms,
                max_attempts,
                retry_backoff_ms,
            },
            store_backend,
            bind_address,
            access_token_ttl_seconds,
            refresh_token_ttl_seconds,
            long_lived_token_ttl_seconds,
            jwt_clock_skew_seconds,
        })
    }

    /// Token lifetimes as a `SessionPolicy`.
    pub fn session_policy(&self) -> SessionPolicy {
        SessionPolicy {
            access_ttl: Duration::from_secs(self.access_token_ttl_seconds),
            refresh_ttl: Duration::from_secs(self.refresh_token_ttl_seconds),
            long_lived_ttl: Duration::from_secs(self.long_lived_token_ttl_seconds),
        }
    }

    pub fn jwt_clock_skew(&self) -> Duration {
        Duration::from_secs(self.jwt_clock_skew_seconds)
    }
}

fn required_secret(
    vars: &HashMap<String, String>,
    name: &str,
) -> Result<SecretString, ConfigError> {
    let secret = vars
        .get(name)
        .map(|v| SecretString::from(v.as_str()))
        .ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))?;
    if is_blank(&secret) {
        return Err(ConfigError::EmptySecret(name.to_string()));
    }
    Ok(secret)
}

/// Token lifetime in seconds, between 1 and `MAX_TOKEN_TTL_SECONDS`.
fn parse_token_ttl(
    vars: &HashMap<String, String>,
    name: &str,
    default: u64,
) -> Result<u64, ConfigError> {
    let seconds = parse_u64(vars, name, default, ConfigError::InvalidTokenTtl)?;
    if !(1..=MAX_TOKEN_TTL_SECONDS).contains(&seconds) {
        return Err(ConfigError::InvalidTokenTtl(format!(
            "{name} must be between 1 and {MAX_TOKEN_TTL_SECONDS}, got {seconds}"
        )));
    }
    Ok(seconds)
}

fn parse_u64(
    vars: &HashMap<String, String>,
    name: &str,
    default: u64,
    make_err: fn(String) -> ConfigError,
) -> Result<u64, ConfigError> {
    match vars.get(name) {
        Some(value) => value.trim().parse().map_err(|e| {
            make_err(format!(
                "{name} must be a valid non-negative integer, got '{value}': {e}"
            ))
        }),
        None => Ok(default),
    }
}
