//! End-to-end session lifecycle through the Session Manager and over HTTP.

use common::types::SubjectId;
use reqwest::StatusCode;
use session_service::errors::SessionError;
use session_service::services::SessionPolicy;
use session_service::store::InMemoryCredentialStore;
use session_test_utils::*;
use std::sync::Arc;

/// Issue, validate, revoke the access token, rotate with the refresh token,
/// then replay the spent refresh token.
#[tokio::test]
async fn test_full_lifecycle_user_42() -> Result<(), anyhow::Error> {
    let manager = test_manager(
        Arc::new(InMemoryCredentialStore::new()),
        SessionPolicy::default(),
    );
    let subject = SubjectId::from(TEST_SUBJECT_42);

    let pair = manager.issue(&subject).await?;
    assert_eq!(manager.validate(&pair.access_token).await?, subject);

    assert_eq!(manager.revoke(&pair.access_token).await?, 1);
    assert_eq!(
        manager.validate(&pair.access_token).await,
        Err(SessionError::Unauthorized)
    );

    let rotated = manager.refresh(&pair.refresh_token).await?;
    assert_eq!(manager.validate(&rotated.access_token).await?, subject);

    assert_eq!(
        manager.refresh(&pair.refresh_token).await.unwrap_err(),
        SessionError::Unauthorized
    );
    Ok(())
}

#[tokio::test]
async fn test_issued_tokens_have_expected_shape() -> Result<(), anyhow::Error> {
    let server = TestSessionServer::spawn().await?;
    let pair = server.issue(TEST_SUBJECT_ALICE).await?;

    pair.access_token
        .assert_access_token()
        .assert_for_subject(TEST_SUBJECT_ALICE)
        .assert_expires_in(900);
    pair.refresh_token
        .assert_refresh_token()
        .assert_for_subject(TEST_SUBJECT_ALICE)
        .assert_expires_in(604_800);
    Ok(())
}

#[tokio::test]
async fn test_refresh_over_http_rotates_credentials() -> Result<(), anyhow::Error> {
    let server = TestSessionServer::spawn().await?;
    let pair = server.issue(TEST_SUBJECT_42).await?;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/v1/auth/refresh", server.url()))
        .json(&serde_json::json!({ "refresh_token": pair.refresh_token }))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["token_type"], "Bearer");
    assert!(body["expires_in"].as_u64().unwrap() <= 900);

    let access = body["access_token"].as_str().unwrap().to_string();
    access.assert_access_token().assert_for_subject(TEST_SUBJECT_42);

    // Old access token is still live until it is revoked or expires
    assert!(server.manager().validate(&pair.access_token).await.is_ok());

    // Replaying the spent refresh token is refused
    let replay = client
        .post(format!("{}/api/v1/auth/refresh", server.url()))
        .json(&serde_json::json!({ "refresh_token": pair.refresh_token }))
        .send()
        .await?;
    assert_eq!(replay.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn test_revoke_over_http_leaves_sibling_live() -> Result<(), anyhow::Error> {
    let server = TestSessionServer::spawn().await?;
    let pair = server.issue(TEST_SUBJECT_ALICE).await?;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/v1/auth/revoke", server.url()))
        .json(&serde_json::json!({ "token": pair.access_token }))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["deleted"], 1);

    // Second revoke of the same credential deletes nothing
    let again: serde_json::Value = client
        .post(format!("{}/api/v1/auth/revoke", server.url()))
        .json(&serde_json::json!({ "token": pair.access_token }))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(again["deleted"], 0);

    // The refresh credential of the same pair still works
    assert!(server.manager().refresh(&pair.refresh_token).await.is_ok());
    Ok(())
}

#[tokio::test]
async fn test_logout_revokes_access_and_refresh() -> Result<(), anyhow::Error> {
    let server = TestSessionServer::spawn().await?;
    let pair = server.issue(TEST_SUBJECT_BOB).await?;

    let response = reqwest::Client::new()
        .post(format!("{}/api/v1/auth/logout", server.url()))
        .bearer_auth(&pair.access_token)
        .json(&serde_json::json!({ "refresh_token": pair.refresh_token }))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["deleted"], 2);

    assert_eq!(
        server.manager().validate(&pair.access_token).await,
        Err(SessionError::Unauthorized)
    );
    assert_eq!(
        server.manager().refresh(&pair.refresh_token).await.unwrap_err(),
        SessionError::Unauthorized
    );
    Ok(())
}

#[tokio::test]
async fn test_logout_without_body_revokes_access_only() -> Result<(), anyhow::Error> {
    let server = TestSessionServer::spawn().await?;
    let pair = server.issue(TEST_SUBJECT_BOB).await?;

    let body: serde_json::Value = reqwest::Client::new()
        .post(format!("{}/api/v1/auth/logout", server.url()))
        .bearer_auth(&pair.access_token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["deleted"], 1);

    assert!(server.manager().refresh(&pair.refresh_token).await.is_ok());
    Ok(())
}

#[tokio::test]
async fn test_logout_with_foreign_refresh_token_is_refused() -> Result<(), anyhow::Error> {
    let server = TestSessionServer::spawn().await?;
    let alice = server.issue(TEST_SUBJECT_ALICE).await?;
    let bob = server.issue(TEST_SUBJECT_BOB).await?;

    let response = reqwest::Client::new()
        .post(format!("{}/api/v1/auth/logout", server.url()))
        .bearer_auth(&alice.access_token)
        .json(&serde_json::json!({ "refresh_token": bob.refresh_token }))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Neither session was touched
    assert!(server.manager().validate(&alice.access_token).await.is_ok());
    assert!(server.manager().refresh(&bob.refresh_token).await.is_ok());
    Ok(())
}

#[tokio::test]
async fn test_long_lived_token_over_http() -> Result<(), anyhow::Error> {
    let server = TestSessionServer::spawn().await?;
    let pair = server.issue(TEST_SUBJECT_ALICE).await?;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/v1/auth/long-lived-token", server.url()))
        .bearer_auth(&pair.access_token)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = response.json().await?;
    let long_lived = body["access_token"].as_str().unwrap().to_string();
    long_lived
        .assert_access_token()
        .assert_for_subject(TEST_SUBJECT_ALICE)
        .assert_expires_in(SessionPolicy::default().long_lived_ttl.as_secs());

    // Usable as a bearer credential and revocable like any access token
    let session: serde_json::Value = client
        .get(format!("{}/api/v1/auth/session", server.url()))
        .bearer_auth(&long_lived)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(session["subject_id"], TEST_SUBJECT_ALICE);

    assert_eq!(server.manager().revoke(&long_lived).await?, 1);
    let after = client
        .get(format!("{}/api/v1/auth/session", server.url()))
        .bearer_auth(&long_lived)
        .send()
        .await?;
    assert_eq!(after.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn test_bad_request_bodies_use_error_envelope() -> Result<(), anyhow::Error> {
    let server = TestSessionServer::spawn().await?;
    let client = reqwest::Client::new();

    for path in ["/api/v1/auth/refresh", "/api/v1/auth/revoke"] {
        let url = format!("{}{}", server.url(), path);
        let requests = [
            client.post(&url).header("content-type", "application/json").body("{not json"),
            client.post(&url).json(&serde_json::json!({ "unexpected": "field" })),
            client.post(&url).body("refresh_token=abc"),
        ];

        for request in requests {
            let response = request.send().await?;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{path}");

            let body: serde_json::Value = response.json().await?;
            assert_eq!(body["error"]["code"], "BAD_REQUEST", "{path}");
            assert_eq!(body["error"]["message"], "Request body is invalid", "{path}");
        }
    }
    Ok(())
}
