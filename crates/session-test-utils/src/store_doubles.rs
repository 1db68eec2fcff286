//! Credential store doubles for failure injection.
//!
//! All doubles wrap a real `InMemoryCredentialStore` so the happy path keeps
//! the store's expiry and single-delete semantics.

use async_trait::async_trait;
use common::types::{CredentialId, SubjectId};
use session_service::store::{CredentialStore, InMemoryCredentialStore, StoreError};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Store operation selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Put,
    Get,
    Delete,
    Ping,
}

/// Store that fails selected operations with `StoreError::Unavailable`.
#[derive(Clone, Default)]
pub struct FailingStore {
    inner: InMemoryCredentialStore,
    failing: Arc<Mutex<HashSet<StoreOp>>>,
}

impl FailingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that fails every operation.
    pub fn down() -> Self {
        let store = Self::new();
        for op in [StoreOp::Put, StoreOp::Get, StoreOp::Delete, StoreOp::Ping] {
            store.fail(op);
        }
        store
    }

    pub fn fail(&self, op: StoreOp) {
        self.failing.lock().unwrap().insert(op);
    }

    /// Stop injecting failures.
    pub fn recover(&self) {
        self.failing.lock().unwrap().clear();
    }

    /// The wrapped store, for seeding or inspecting entries directly.
    pub fn inner(&self) -> &InMemoryCredentialStore {
        &self.inner
    }

    fn check(&self, op: StoreOp) -> Result<(), StoreError> {
        if self.failing.lock().unwrap().contains(&op) {
            return Err(StoreError::Unavailable(format!(
                "injected failure for {op:?}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for FailingStore {
    async fn put(
        &self,
        id: CredentialId,
        subject: &SubjectId,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        self.check(StoreOp::Put)?;
        self.inner.put(id, subject, ttl).await
    }

    async fn get(&self, id: CredentialId) -> Result<Option<SubjectId>, StoreError> {
        self.check(StoreOp::Get)?;
        self.inner.get(id).await
    }

    async fn delete(&self, id: CredentialId) -> Result<u64, StoreError> {
        self.check(StoreOp::Delete)?;
        self.inner.delete(id).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check(StoreOp::Ping)?;
        self.inner.ping().await
    }
}

/// Store that sleeps before every `get`, widening the window between a
/// refresh's lookup and its delete.
#[derive(Clone)]
pub struct SlowStore {
    inner: InMemoryCredentialStore,
    get_delay: Duration,
}

impl SlowStore {
    pub fn new(get_delay: Duration) -> Self {
        Self {
            inner: InMemoryCredentialStore::new(),
            get_delay,
        }
    }
}

#[async_trait]
impl CredentialStore for SlowStore {
    async fn put(
        &self,
        id: CredentialId,
        subject: &SubjectId,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        self.inner.put(id, subject, ttl).await
    }

    async fn get(&self, id: CredentialId) -> Result<Option<SubjectId>, StoreError> {
        tokio::time::sleep(self.get_delay).await;
        self.inner.get(id).await
    }

    async fn delete(&self, id: CredentialId) -> Result<u64, StoreError> {
        self.inner.delete(id).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.inner.ping().await
    }
}

/// Store that counts calls per operation.
#[derive(Clone, Default)]
pub struct CountingStore {
    inner: InMemoryCredentialStore,
    puts: Arc<AtomicU64>,
    gets: Arc<AtomicU64>,
    deletes: Arc<AtomicU64>,
}

impl CountingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, op: StoreOp) -> u64 {
        match op {
            StoreOp::Put => self.puts.load(Ordering::SeqCst),
            StoreOp::Get => self.gets.load(Ordering::SeqCst),
            StoreOp::Delete => self.deletes.load(Ordering::SeqCst),
            StoreOp::Ping => 0,
        }
    }

    pub fn inner(&self) -> &InMemoryCredentialStore {
        &self.inner
    }
}

#[async_trait]
impl CredentialStore for CountingStore {
    async fn put(
        &self,
        id: CredentialId,
        subject: &SubjectId,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.inner.put(id, subject, ttl).await
    }

    async fn get(&self, id: CredentialId) -> Result<Option<SubjectId>, StoreError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get(id).await
    }

    async fn delete(&self, id: CredentialId) -> Result<u64, StoreError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(id).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.inner.ping().await
    }
}
