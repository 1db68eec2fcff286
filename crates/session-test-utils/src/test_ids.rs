//! Fixed test IDs for deterministic tests
//!
//! Using fixed UUIDs prevents flaky tests caused by random data.

use common::types::CredentialId;
use uuid::Uuid;

// Credential IDs (1-99)
pub const TEST_CREDENTIAL_ID_1: Uuid = Uuid::from_u128(1);
pub const TEST_CREDENTIAL_ID_2: Uuid = Uuid::from_u128(2);
pub const TEST_CREDENTIAL_ID_3: Uuid = Uuid::from_u128(3);

// Subjects
pub const TEST_SUBJECT_ALICE: &str = "user-alice";
pub const TEST_SUBJECT_BOB: &str = "user-bob";
pub const TEST_SUBJECT_42: &str = "user-42";

// Signing secrets
pub const TEST_ACCESS_SECRET: &str = "test-access-secret-do-not-use-in-production";
pub const TEST_REFRESH_SECRET: &str = "test-refresh-secret-do-not-use-in-production";
pub const TEST_WRONG_SECRET: &str = "not-the-signing-secret";

/// `CredentialId` wrapper for a fixed test UUID.
pub fn test_credential(id: Uuid) -> CredentialId {
    CredentialId(id)
}
