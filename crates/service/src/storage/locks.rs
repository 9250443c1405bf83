//! Per-key write serialization.
//!
//! Writers for the same username queue on one async mutex; different
//! usernames get different mutexes and never wait on each other. A guard owns
//! its slot in the map, so it can be moved into a blocking task that outlives
//! the request. The entry is dropped once its last holder or waiter (including
//! a waiter cancelled before it acquired) goes away.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::key::RecordKey;

type LockMap = DashMap<String, Arc<Mutex<()>>>;

#[derive(Default)]
pub struct KeyLocks {
    inner: Arc<LockMap>,
}

/// Exclusive hold on one key; released on drop.
pub struct KeyGuard {
    map: Arc<LockMap>,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl KeyLocks {
    pub fn new() -> Self { Self::default() }

    pub async fn lock(&self, key: &RecordKey) -> KeyGuard {
        // clone out of the map so the shard lock is not held across the await
        let mutex = Arc::clone(&*self.inner.entry(key.as_str().to_owned()).or_default());
        // built before waiting: if this future is dropped, the empty guard
        // still prunes the entry after the pending acquire has released its Arc
        let mut held = KeyGuard { map: Arc::clone(&self.inner), key: key.as_str().to_owned(), guard: None };
        held.guard = Some(mutex.lock_owned().await);
        held
    }

    /// Number of keys currently locked or awaited.
    pub fn len(&self) -> usize { self.inner.len() }

    pub fn is_empty(&self) -> bool { self.inner.is_empty() }
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        // release our Arc first; a count of 1 then means only the map refers to it
        self.guard.take();
        self.map
            .remove_if(&self.key, |_, m| Arc::strong_count(m) == 1);
    }
}
