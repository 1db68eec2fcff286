//! Bearer authentication on protected routes.
//!
//! Every credential failure must produce the same 401 body and challenge so
//! a client cannot learn which validation step rejected it.

use reqwest::StatusCode;
use session_service::errors::{BEARER_CHALLENGE, UNAUTHORIZED_MESSAGE};
use session_test_utils::*;

async fn get_session(server: &TestSessionServer, authorization: Option<&str>) -> reqwest::Response {
    let mut request = reqwest::Client::new().get(format!("{}/api/v1/auth/session", server.url()));
    if let Some(value) = authorization {
        request = request.header("authorization", value);
    }
    request.send().await.expect("request should be sent")
}

async fn assert_uniform_401(response: reqwest::Response) {
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response
            .headers()
            .get("www-authenticate")
            .and_then(|v| v.to_str().ok()),
        Some(BEARER_CHALLENGE)
    );

    let body: serde_json::Value = response.json().await.expect("JSON error body");
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    assert_eq!(body["error"]["message"], UNAUTHORIZED_MESSAGE);
}

#[tokio::test]
async fn test_valid_bearer_returns_subject() -> Result<(), anyhow::Error> {
    let server = TestSessionServer::spawn().await?;
    let pair = server.issue(TEST_SUBJECT_ALICE).await?;

    let response = get_session(&server, Some(&format!("Bearer {}", pair.access_token))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["subject_id"], TEST_SUBJECT_ALICE);
    Ok(())
}

#[tokio::test]
async fn test_missing_and_malformed_headers_are_uniform() -> Result<(), anyhow::Error> {
    let server = TestSessionServer::spawn().await?;

    assert_uniform_401(get_session(&server, None).await).await;
    for header in ["Bearer", "Basic dXNlcjpwYXNz", "Bearer a b", "token-only"] {
        assert_uniform_401(get_session(&server, Some(header)).await).await;
    }
    Ok(())
}

#[tokio::test]
async fn test_every_token_failure_is_uniform() -> Result<(), anyhow::Error> {
    let server = TestSessionServer::spawn().await?;
    let pair = server.issue(TEST_SUBJECT_ALICE).await?;

    let expired = TestTokenBuilder::access()
        .for_subject(TEST_SUBJECT_ALICE)
        .expires_in(-60)
        .sign();
    let wrong_secret = TestTokenBuilder::access()
        .for_subject(TEST_SUBJECT_ALICE)
        .signed_with(TEST_WRONG_SECRET)
        .sign();
    // Correctly signed but never registered in the store
    let unregistered = TestTokenBuilder::access()
        .for_subject(TEST_SUBJECT_ALICE)
        .sign();

    server.manager().revoke(&pair.access_token).await?;

    for token in [
        "garbage".to_string(),
        expired,
        wrong_secret,
        unregistered,
        pair.access_token.clone(),
        pair.refresh_token.clone(),
    ] {
        assert_uniform_401(get_session(&server, Some(&format!("Bearer {token}"))).await).await;
    }
    Ok(())
}

#[tokio::test]
async fn test_lowercase_scheme_is_accepted() -> Result<(), anyhow::Error> {
    let server = TestSessionServer::spawn().await?;
    let pair = server.issue(TEST_SUBJECT_BOB).await?;

    let response = get_session(&server, Some(&format!("bearer {}", pair.access_token))).await;
    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn test_protected_routes_reject_anonymous() -> Result<(), anyhow::Error> {
    let server = TestSessionServer::spawn().await?;
    let client = reqwest::Client::new();

    for path in ["/api/v1/auth/logout", "/api/v1/auth/long-lived-token"] {
        let response = client
            .post(format!("{}{}", server.url(), path))
            .send()
            .await?;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{path}");
    }
    Ok(())
}

#[tokio::test]
async fn test_refresh_with_access_token_is_rejected() -> Result<(), anyhow::Error> {
    let server = TestSessionServer::spawn().await?;
    let pair = server.issue(TEST_SUBJECT_ALICE).await?;

    let response = reqwest::Client::new()
        .post(format!("{}/api/v1/auth/refresh", server.url()))
        .json(&serde_json::json!({ "refresh_token": pair.access_token }))
        .send()
        .await?;
    assert_uniform_401(response).await;

    // The access credential is untouched by the failed refresh
    assert!(server.manager().validate(&pair.access_token).await.is_ok());
    Ok(())
}
