//! Liveness, readiness and metrics endpoints.

use reqwest::StatusCode;
use session_test_utils::*;
use std::sync::Arc;

#[tokio::test]
async fn test_health_endpoint_returns_ok() -> Result<(), anyhow::Error> {
    let server = TestSessionServer::spawn().await?;

    let response = reqwest::get(format!("{}/health", server.url())).await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await?, "OK");
    Ok(())
}

#[tokio::test]
async fn test_ready_endpoint_returns_ok_when_store_healthy() -> Result<(), anyhow::Error> {
    let server = TestSessionServer::spawn().await?;

    let response = reqwest::get(format!("{}/ready", server.url())).await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["status"], "ready");
    assert_eq!(body["store"], "healthy");
    assert!(body.get("error").is_none());
    Ok(())
}

#[tokio::test]
async fn test_ready_endpoint_returns_503_when_store_down() -> Result<(), anyhow::Error> {
    let server = TestSessionServer::spawn_with_store(Arc::new(FailingStore::down())).await?;

    let response = reqwest::get(format!("{}/ready", server.url())).await?;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["status"], "not_ready");
    // Generic message only; no infrastructure details
    assert_eq!(body["error"], "Service dependencies unavailable");
    Ok(())
}

#[tokio::test]
async fn test_health_stays_ok_when_store_down() -> Result<(), anyhow::Error> {
    let server = TestSessionServer::spawn_with_store(Arc::new(FailingStore::down())).await?;

    let response = reqwest::get(format!("{}/health", server.url())).await?;
    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn test_metrics_endpoint_exposes_session_metrics() -> Result<(), anyhow::Error> {
    let server = TestSessionServer::spawn().await?;
    let pair = server.issue(TEST_SUBJECT_ALICE).await?;
    server.manager().validate(&pair.access_token).await?;

    let response = reqwest::get(format!("{}/metrics", server.url())).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.text().await?;
    assert!(body.contains("session_tokens_issued_total"));
    assert!(body.contains("session_validations_total"));
    Ok(())
}
