//! Redis-backed credential store tests.
//!
//! Require a running Redis; run with
//! `REDIS_ADDRESS=localhost:6379 cargo test -- --ignored`.

use common::config::RedisConfig;
use common::types::{CredentialId, SubjectId};
use session_service::errors::SessionError;
use session_service::services::SessionPolicy;
use session_service::store::{CredentialStore, RedisCredentialStore};
use session_test_utils::*;
use std::sync::Arc;
use std::time::Duration;

async fn connect() -> RedisCredentialStore {
    let address =
        std::env::var("REDIS_ADDRESS").unwrap_or_else(|_| "localhost:6379".to_string());
    let config = RedisConfig {
        address,
        ..RedisConfig::default()
    };
    RedisCredentialStore::connect(&config)
        .await
        .expect("Redis should be reachable at REDIS_ADDRESS")
}

#[tokio::test]
#[ignore = "requires a running Redis"]
async fn test_put_get_delete_round_trip() {
    let store = connect().await;
    let id = CredentialId::new();
    let subject = SubjectId::from(TEST_SUBJECT_42);

    store.put(id, &subject, Duration::from_secs(60)).await.unwrap();
    assert_eq!(store.get(id).await.unwrap(), Some(subject));

    assert_eq!(store.delete(id).await.unwrap(), 1);
    assert_eq!(store.delete(id).await.unwrap(), 0);
    assert_eq!(store.get(id).await.unwrap(), None);
}

#[tokio::test]
#[ignore = "requires a running Redis"]
async fn test_entries_expire() {
    let store = connect().await;
    let id = CredentialId::new();

    store
        .put(id, &SubjectId::from(TEST_SUBJECT_ALICE), Duration::from_millis(200))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(400)).await;

    assert_eq!(store.get(id).await.unwrap(), None);
}

#[tokio::test]
#[ignore = "requires a running Redis"]
async fn test_concurrent_refresh_against_redis() {
    let manager = test_manager(Arc::new(connect().await), SessionPolicy::default());
    let pair = manager
        .issue(&SubjectId::from(TEST_SUBJECT_42))
        .await
        .unwrap();

    let (a, b) = tokio::join!(
        manager.refresh(&pair.refresh_token),
        manager.refresh(&pair.refresh_token)
    );

    assert_eq!([&a, &b].iter().filter(|r| r.is_ok()).count(), 1);
    assert!([a, b]
        .iter()
        .any(|r| matches!(r, Err(SessionError::Unauthorized))));
}
