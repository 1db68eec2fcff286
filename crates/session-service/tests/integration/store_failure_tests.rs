//! Credential store outages surface as a retryable 503, never as 401.

use common::types::SubjectId;
use reqwest::StatusCode;
use session_service::errors::SessionError;
use session_service::services::SessionPolicy;
use session_test_utils::*;
use std::sync::Arc;

#[tokio::test]
async fn test_validate_during_outage_is_store_unavailable() -> Result<(), anyhow::Error> {
    let store = Arc::new(FailingStore::new());
    let manager = test_manager(store.clone(), SessionPolicy::default());
    let pair = manager.issue(&SubjectId::from(TEST_SUBJECT_ALICE)).await?;

    store.fail(StoreOp::Get);
    let err = manager.validate(&pair.access_token).await.unwrap_err();
    assert!(matches!(err, SessionError::StoreUnavailable(_)));
    assert!(err.is_retryable());

    // The credential survives the outage
    store.recover();
    assert!(manager.validate(&pair.access_token).await.is_ok());
    Ok(())
}

#[tokio::test]
async fn test_issue_fails_when_store_write_fails() {
    let store = Arc::new(FailingStore::new());
    store.fail(StoreOp::Put);
    let manager = test_manager(store, SessionPolicy::default());

    let result = manager.issue(&SubjectId::from(TEST_SUBJECT_BOB)).await;
    assert!(matches!(result, Err(SessionError::StoreUnavailable(_))));
}

#[tokio::test]
async fn test_refresh_delete_failure_keeps_refresh_token_usable() -> Result<(), anyhow::Error> {
    let store = Arc::new(FailingStore::new());
    let manager = test_manager(store.clone(), SessionPolicy::default());
    let pair = manager.issue(&SubjectId::from(TEST_SUBJECT_42)).await?;

    store.fail(StoreOp::Delete);
    assert!(matches!(
        manager.refresh(&pair.refresh_token).await,
        Err(SessionError::StoreUnavailable(_))
    ));

    store.recover();
    assert!(manager.refresh(&pair.refresh_token).await.is_ok());
    Ok(())
}

#[tokio::test]
async fn test_protected_route_returns_503_during_outage() -> Result<(), anyhow::Error> {
    let store = Arc::new(FailingStore::new());
    let server = TestSessionServer::spawn_with_store(store.clone()).await?;
    let pair = server.issue(TEST_SUBJECT_ALICE).await?;

    store.fail(StoreOp::Get);
    let response = reqwest::Client::new()
        .get(format!("{}/api/v1/auth/session", server.url()))
        .bearer_auth(&pair.access_token)
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(response.headers().get("www-authenticate").is_none());
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["error"]["code"], "SERVICE_UNAVAILABLE");
    Ok(())
}

#[tokio::test]
async fn test_refresh_route_returns_503_during_outage() -> Result<(), anyhow::Error> {
    let store = Arc::new(FailingStore::new());
    let server = TestSessionServer::spawn_with_store(store.clone()).await?;
    let pair = server.issue(TEST_SUBJECT_ALICE).await?;

    store.fail(StoreOp::Get);
    let response = reqwest::Client::new()
        .post(format!("{}/api/v1/auth/refresh", server.url()))
        .json(&serde_json::json!({ "refresh_token": pair.refresh_token }))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    Ok(())
}
