//! Common utilities and types shared across the session workspace crates.

#![warn(clippy::pedantic)]

/// Module for common data types
pub mod types;

/// Module for common configuration
pub mod config;

/// Module for secret types that prevent accidental logging
pub mod secret;

/// Module for JWT framing utilities (size limits, header inspection, bearer parsing)
pub mod jwt;
