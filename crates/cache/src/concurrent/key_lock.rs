//! Per-key mutual exclusion
//!
//! [`KeyLock`] hands out one mutex per key. Callers acquiring the same key
//! queue behind each other while different keys never contend. Mutexes are
//! created on first use and dropped again when their last holder or waiter
//! leaves, so the registry only ever holds keys somebody is working on.

use parking_lot::{ArcMutexGuard, Mutex, RawMutex};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

struct LockEntry {
    /// Holders plus waiters
    leases: usize,
    mutex: Arc<Mutex<()>>,
}

/// Registry of per-key mutexes
#[derive(Default)]
pub struct KeyLock {
    entries: Mutex<HashMap<String, LockEntry>>,
}

impl KeyLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until `key` is free and take it
    pub fn acquire(&self, key: &str) -> KeyLockGuard<'_> {
        let mutex = self.lease(key);
        let guard = mutex.lock_arc();
        KeyLockGuard {
            owner: self,
            key: key.to_string(),
            guard: Some(guard),
        }
    }

    /// Like [`KeyLock::acquire`], giving up after `timeout`
    pub fn try_acquire_for(&self, key: &str, timeout: Duration) -> Option<KeyLockGuard<'_>> {
        let mutex = self.lease(key);
        match mutex.try_lock_arc_for(timeout) {
            Some(guard) => Some(KeyLockGuard {
                owner: self,
                key: key.to_string(),
                guard: Some(guard),
            }),
            None => {
                self.release(key);
                None
            }
        }
    }

    /// Number of keys currently held or waited on
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    fn lease(&self, key: &str) -> Arc<Mutex<()>> {
        let mut entries = self.entries.lock();
        let entry = entries.entry(key.to_string()).or_insert_with(|| LockEntry {
            leases: 0,
            mutex: Arc::new(Mutex::new(())),
        });
        entry.leases += 1;
        Arc::clone(&entry.mutex)
    }

    fn release(&self, key: &str) {
        let mut entries = self.entries.lock();
        if let Some(entry) = entries.get_mut(key) {
            entry.leases -= 1;
            if entry.leases == 0 {
                entries.remove(key);
            }
        }
    }
}

impl fmt::Debug for KeyLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyLock").field("keys", &self.len()).finish()
    }
}

/// Exclusive hold on one key, released on drop
#[must_use = "the key is released as soon as the guard is dropped"]
pub struct KeyLockGuard<'a> {
    owner: &'a KeyLock,
    key: String,
    guard: Option<ArcMutexGuard<RawMutex, ()>>,
}

impl KeyLockGuard<'_> {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for KeyLockGuard<'_> {
    fn drop(&mut self) {
        // Unlock first, releasing the lease may remove the entry
        drop(self.guard.take());
        self.owner.release(&self.key);
    }
}

impl fmt::Debug for KeyLockGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyLockGuard").field("key", &self.key).finish()
    }
}

/// Result of asking the manager for a key lock
///
/// Operations that are not cached get a no-op handle: there is nothing to
/// collapse, so concurrent callers are not serialized.
#[must_use = "the lock is released as soon as the handle is dropped"]
#[derive(Debug)]
pub enum LockHandle<'a> {
    Held(KeyLockGuard<'a>),
    Noop,
}

impl LockHandle<'_> {
    pub fn is_held(&self) -> bool {
        matches!(self, Self::Held(_))
    }

    /// Release the lock now instead of at the end of scope
    pub fn release(self) {
        drop(self);
    }
}
