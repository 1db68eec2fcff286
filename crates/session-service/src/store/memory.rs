//! In-process credential store.
//!
//! Backs tests, the in-process server harness and `STORE_BACKEND=memory`
//! development mode. Deadlines use `tokio::time::Instant` so tests can drive
//! expiry with `tokio::time::pause`/`advance`. Expired entries are evicted
//! when touched, and `put` sweeps the whole map at most once per
//! `SWEEP_INTERVAL`.

use super::{CredentialStore, StoreError, MAX_CREDENTIAL_TTL};
use async_trait::async_trait;
use common::types::{CredentialId, SubjectId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

/// Minimum time between two full sweeps of expired entries.
const SWEEP_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
struct Entry {
    subject: SubjectId,
    deadline: Instant,
}

#[derive(Debug)]
struct Entries {
    map: HashMap<CredentialId, Entry>,
    last_sweep: Instant,
}

impl Entries {
    fn sweep_if_due(&mut self, now: Instant) {
        if now.saturating_duration_since(self.last_sweep) < SWEEP_INTERVAL {
            return;
        }
        self.map.retain(|_, entry| entry.deadline > now);
        self.last_sweep = now;
    }
}

/// `HashMap`-backed store. Cheap to clone; clones share entries.
#[derive(Debug, Clone)]
pub struct InMemoryCredentialStore {
    entries: Arc<Mutex<Entries>>,
}

impl Default for InMemoryCredentialStore {
    fn default() -> Self {
        Self {
            entries: Arc::new(Mutex::new(Entries {
                map: HashMap::new(),
                last_sweep: Instant::now(),
            })),
        }
    }
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.lock()
            .map(|entries| entries.map.values().filter(|e| e.deadline > now).count())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, Entries>, StoreError> {
        self.entries
            .lock()
            .map_err(|_| StoreError::Unavailable("in-memory store lock poisoned".to_string()))
    }

    #[cfg(test)]
    fn raw_len(&self) -> usize {
        self.lock().map(|entries| entries.map.len()).unwrap_or(0)
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn put(
        &self,
        id: CredentialId,
        subject: &SubjectId,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let now = Instant::now();
        let deadline = now
            .checked_add(ttl)
            .filter(|_| ttl <= MAX_CREDENTIAL_TTL)
            .ok_or(StoreError::InvalidTtl(ttl))?;

        let mut entries = self.lock()?;
        entries.sweep_if_due(now);
        entries.map.insert(
            id,
            Entry {
                subject: subject.clone(),
                deadline,
            },
        );
        Ok(())
    }

    async fn get(&self, id: CredentialId) -> Result<Option<SubjectId>, StoreError> {
        let now = Instant::now();
        let mut entries = self.lock()?;
        match entries.map.get(&id) {
            Some(entry) if entry.deadline > now => Ok(Some(entry.subject.clone())),
            Some(_) => {
                entries.map.remove(&id);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: CredentialId) -> Result<u64, StoreError> {
        let now = Instant::now();
        match self.lock()?.map.remove(&id) {
            Some(entry) if entry.deadline > now => Ok(1),
            _ => Ok(0),
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.lock().map(|_| ())
    }
}
