//! Session Service Library
//!
//! JWT access/refresh session layer backed by an expiring credential store.
//!
//! # Modules
//!
//! - `config` - Service configuration
//! - `errors` - Error types and HTTP mapping
//! - `handlers` - HTTP request handlers
//! - `middleware` - Request Authenticator and bearer middleware
//! - `models` - Request/response bodies
//! - `observability` - Metrics and log correlation helpers
//! - `routes` - Router and application state
//! - `services` - Session Manager and the subject status hook
//! - `store` - Credential Store (Redis and in-memory)
//! - `token` - Token Codec and claims

pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod routes;
pub mod services;
pub mod store;
pub mod token;
