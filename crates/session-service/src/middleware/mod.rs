//! HTTP middleware for the session service.

pub mod auth;

pub use auth::{require_session, RequestAuthenticator};
