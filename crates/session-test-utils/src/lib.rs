//! # Session Test Utilities
//!
//! Shared test utilities for the session service.
//!
//! This crate provides:
//! - Fixed test IDs and secrets
//! - Token forging (`TestTokenBuilder`) for tokens the service would never
//!   mint: wrong secret, foreign algorithm, past expiry, missing claims
//! - Credential store doubles for failure injection
//! - Server test harness (`TestSessionServer` for E2E tests)
//! - Custom assertions (`TokenAssertions` trait)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use session_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> anyhow::Result<()> {
//!     let server = TestSessionServer::spawn().await?;
//!     let pair = server.issue(TEST_SUBJECT_ALICE).await?;
//!
//!     pair.access_token
//!         .assert_access_token()
//!         .assert_for_subject(TEST_SUBJECT_ALICE);
//!     Ok(())
//! }
//! ```

pub mod assertions;
pub mod server_harness;
pub mod store_doubles;
pub mod test_ids;
pub mod token_builders;

// Re-export commonly used items
pub use assertions::*;
pub use server_harness::*;
pub use store_doubles::*;
pub use test_ids::*;
pub use token_builders::*;
