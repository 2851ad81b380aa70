use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Serializes work per vehicle id while letting distinct ids run in parallel.
///
/// A lock entry lives only as long as someone holds or waits on it.
#[derive(Debug, Clone, Default)]
pub struct KeyLocker {
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl KeyLocker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, key: impl Into<String>) -> KeyLockGuard {
        let key = key.into();
        let mutex = Arc::clone(
            self.locks.entry(key.clone()).or_insert_with(|| Arc::new(Mutex::new(()))).value(),
        );
        let guard = mutex.lock_owned().await;
        KeyLockGuard { key, locks: Arc::clone(&self.locks), guard: Some(guard) }
    }

    /// Number of keys currently locked or contended.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

pub struct KeyLockGuard {
    key: String,
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyLockGuard {
    fn drop(&mut self) {
        self.guard.take();
        // the map's own reference is the only one left once nobody waits
        self.locks.remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}
