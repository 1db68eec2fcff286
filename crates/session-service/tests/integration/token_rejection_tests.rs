//! Rejection taxonomy of the Session Manager for forged and damaged tokens.

use common::types::SubjectId;
use jsonwebtoken::Algorithm;
use serde_json::{json, Map, Value};
use session_service::errors::SessionError;
use session_service::services::SessionPolicy;
use session_service::store::{CredentialStore, InMemoryCredentialStore};
use session_test_utils::*;
use std::sync::Arc;
use std::time::Duration;

fn object(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

fn fresh_manager() -> (Arc<InMemoryCredentialStore>, session_service::services::SessionManager) {
    let store = Arc::new(InMemoryCredentialStore::new());
    let manager = test_manager(store.clone(), SessionPolicy::default());
    (store, manager)
}

#[tokio::test]
async fn test_wrong_secret_is_invalid_signature_even_when_expired() {
    let (_, manager) = fresh_manager();
    let token = TestTokenBuilder::access()
        .signed_with(TEST_WRONG_SECRET)
        .expires_in(-3600)
        .sign();

    assert_eq!(
        manager.validate(&token).await,
        Err(SessionError::InvalidSignature)
    );
}

#[tokio::test]
async fn test_foreign_algorithms_are_invalid_signature() {
    let (_, manager) = fresh_manager();

    let unsecured = TestTokenBuilder::access().sign_unsecured();
    assert_eq!(
        manager.validate(&unsecured).await,
        Err(SessionError::InvalidSignature)
    );

    for algorithm in [Algorithm::HS384, Algorithm::HS512] {
        let token = TestTokenBuilder::access().with_algorithm(algorithm).sign();
        assert_eq!(
            manager.validate(&token).await,
            Err(SessionError::InvalidSignature),
            "{algorithm:?}"
        );
    }
}

#[tokio::test]
async fn test_expired_token_with_live_entry_is_expired() -> Result<(), anyhow::Error> {
    let (store, manager) = fresh_manager();
    let builder = TestTokenBuilder::access()
        .for_subject(TEST_SUBJECT_42)
        .expires_in(-1);
    store
        .put(
            test_credential(builder.credential_id()),
            &SubjectId::from(TEST_SUBJECT_42),
            Duration::from_secs(600),
        )
        .await?;

    assert_eq!(
        manager.validate(&builder.sign()).await,
        Err(SessionError::Expired)
    );
    Ok(())
}

#[tokio::test]
async fn test_forged_token_with_registered_entry_validates() -> Result<(), anyhow::Error> {
    let (store, manager) = fresh_manager();
    let builder = TestTokenBuilder::access()
        .for_subject(TEST_SUBJECT_ALICE)
        .with_credential_id(TEST_CREDENTIAL_ID_1);
    store
        .put(
            test_credential(TEST_CREDENTIAL_ID_1),
            &SubjectId::from(TEST_SUBJECT_ALICE),
            Duration::from_secs(600),
        )
        .await?;

    assert_eq!(
        manager.validate(&builder.sign()).await?,
        SubjectId::from(TEST_SUBJECT_ALICE)
    );
    Ok(())
}

#[tokio::test]
async fn test_repointed_entry_is_unauthorized() -> Result<(), anyhow::Error> {
    let (store, manager) = fresh_manager();
    let builder = TestTokenBuilder::access()
        .for_subject(TEST_SUBJECT_ALICE)
        .with_credential_id(TEST_CREDENTIAL_ID_2);
    store
        .put(
            test_credential(TEST_CREDENTIAL_ID_2),
            &SubjectId::from(TEST_SUBJECT_BOB),
            Duration::from_secs(600),
        )
        .await?;

    assert_eq!(
        manager.validate(&builder.sign()).await,
        Err(SessionError::Unauthorized)
    );
    Ok(())
}

#[tokio::test]
async fn test_damaged_claims_are_malformed() {
    let (_, manager) = fresh_manager();

    for claim in ["exp", "iat", "access_uuid", "user_id"] {
        let token = TestTokenBuilder::access().without_claim(claim).sign();
        assert_eq!(
            manager.validate(&token).await,
            Err(SessionError::MalformedToken),
            "missing {claim}"
        );
    }

    let blank_subject = TestTokenBuilder::access().for_subject("  ").sign();
    assert_eq!(
        manager.validate(&blank_subject).await,
        Err(SessionError::MalformedToken)
    );
}

#[tokio::test]
async fn test_unauthorized_access_claim_is_rejected() {
    let (_, manager) = fresh_manager();
    let token = TestTokenBuilder::access().authorized(false).sign();

    assert!(manager.validate(&token).await.is_err());
}

#[tokio::test]
async fn test_future_iat_beyond_skew_is_malformed() {
    let (_, manager) = fresh_manager();
    let token = TestTokenBuilder::access()
        .issued_at(chrono::Utc::now().timestamp() + 3600)
        .sign();

    assert_eq!(
        manager.validate(&token).await,
        Err(SessionError::MalformedToken)
    );
}

#[tokio::test]
async fn test_structural_garbage_is_malformed() {
    let (_, manager) = fresh_manager();
    let oversized = "a".repeat(10_000);

    for token in ["", "abc", "a.b", "a.b.c", oversized.as_str()] {
        assert_eq!(
            manager.validate(token).await,
            Err(SessionError::MalformedToken),
            "token of length {}",
            token.len()
        );
    }

    let no_alg = raw_token(
        &object(json!({ "typ": "JWT" })),
        &object(TestTokenBuilder::access().build()),
    );
    assert_eq!(
        manager.validate(&no_alg).await,
        Err(SessionError::MalformedToken)
    );
}

#[tokio::test]
async fn test_refresh_token_never_authenticates() -> Result<(), anyhow::Error> {
    let (_, manager) = fresh_manager();
    let pair = manager.issue(&SubjectId::from(TEST_SUBJECT_ALICE)).await?;

    assert_eq!(
        manager.validate(&pair.refresh_token).await,
        Err(SessionError::InvalidSignature)
    );
    Ok(())
}
