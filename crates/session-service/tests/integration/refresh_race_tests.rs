//! Concurrent redemption of a single refresh token.

use common::types::SubjectId;
use session_service::errors::SessionError;
use session_service::services::SessionPolicy;
use session_service::store::InMemoryCredentialStore;
use session_test_utils::*;
use std::sync::Arc;
use std::time::Duration;

/// Both refreshes pass the lookup before either deletes; only one may win.
#[tokio::test]
async fn test_concurrent_refresh_exactly_one_succeeds() -> Result<(), anyhow::Error> {
    let store = Arc::new(SlowStore::new(Duration::from_millis(50)));
    let manager = test_manager(store, SessionPolicy::default());
    let pair = manager.issue(&SubjectId::from(TEST_SUBJECT_42)).await?;

    let (a, b) = tokio::join!(
        manager.refresh(&pair.refresh_token),
        manager.refresh(&pair.refresh_token)
    );

    let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one refresh must succeed");

    let failure = if a.is_err() { a } else { b };
    assert_eq!(failure.err(), Some(SessionError::Unauthorized));
    Ok(())
}

#[tokio::test]
async fn test_many_concurrent_refreshes_single_winner() -> Result<(), anyhow::Error> {
    let manager = test_manager(
        Arc::new(InMemoryCredentialStore::new()),
        SessionPolicy::default(),
    );
    let pair = manager.issue(&SubjectId::from(TEST_SUBJECT_ALICE)).await?;

    let mut tasks = Vec::new();
    for _ in 0..16 {
        let manager = manager.clone();
        let token = pair.refresh_token.clone();
        tasks.push(tokio::spawn(async move { manager.refresh(&token).await }));
    }

    let mut winners = 0;
    for task in tasks {
        match task.await? {
            Ok(_) => winners += 1,
            Err(e) => assert_eq!(e, SessionError::Unauthorized),
        }
    }
    assert_eq!(winners, 1);
    Ok(())
}

#[tokio::test]
async fn test_refresh_deletes_before_issuing() -> Result<(), anyhow::Error> {
    let store = Arc::new(CountingStore::new());
    let manager = test_manager(store.clone(), SessionPolicy::default());
    let pair = manager.issue(&SubjectId::from(TEST_SUBJECT_BOB)).await?;
    assert_eq!(store.count(StoreOp::Put), 2);

    manager.refresh(&pair.refresh_token).await?;

    assert_eq!(store.count(StoreOp::Get), 1);
    assert_eq!(store.count(StoreOp::Delete), 1);
    assert_eq!(store.count(StoreOp::Put), 4);
    Ok(())
}
