//! In-process store backed by a concurrent map

use super::tags::TagIndex;
use super::{is_blank, CacheStore};
use crate::entry::CachedValue;
use crate::errors::Result;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

struct StoredEntry {
    id: u64,
    value: CachedValue,
    /// `None` when the TTL reaches past what `Instant` can represent
    expires_at: Option<Instant>,
    tags: Vec<String>,
}

impl StoredEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Inserts between two automatic sweeps of expired entries
pub const DEFAULT_PURGE_INTERVAL: u64 = 1024;

/// In-memory [`CacheStore`] with lazy expiry and tag invalidation
///
/// Expired entries are dropped when read, and every
/// [`DEFAULT_PURGE_INTERVAL`] inserts the store sweeps the ones nobody reads
/// again. Lock order is tag index before map shard, and no shard reference
/// is held while the tag index is locked.
pub struct MemoryStore {
    name: String,
    entries: DashMap<String, StoredEntry>,
    tags: Mutex<TagIndex>,
    next_id: AtomicU64,
    purge_interval: u64,
}

impl MemoryStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: DashMap::new(),
            tags: Mutex::new(TagIndex::default()),
            next_id: AtomicU64::new(1),
            purge_interval: DEFAULT_PURGE_INTERVAL,
        }
    }

    /// Sweep expired entries every `inserts` inserts instead
    pub fn with_purge_interval(mut self, inserts: u64) -> Self {
        self.purge_interval = inserts.max(1);
        self
    }

    /// Number of stored entries, including expired ones not yet purged
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove every expired entry, returning how many were dropped
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let expired: Vec<(String, u64)> = self
            .entries
            .iter()
            .filter(|entry| entry.is_expired(now))
            .map(|entry| (entry.key().clone(), entry.id))
            .collect();

        let mut purged = 0;
        for (key, id) in expired {
            if let Some((_, entry)) = self.entries.remove_if(&key, |_, e| e.id == id) {
                self.retire(&entry);
                purged += 1;
            }
        }
        if purged > 0 {
            debug!(cache = %self.name, purged, "purged expired entries");
        }
        purged
    }

    fn retire(&self, entry: &StoredEntry) {
        if !entry.tags.is_empty() {
            self.tags.lock().unsubscribe(&entry.tags, entry.id);
        }
    }

    fn normalize_tags(tags: &[&str]) -> Vec<String> {
        let mut normalized: Vec<String> = tags
            .iter()
            .filter(|tag| !is_blank(tag))
            .map(|tag| TagIndex::normalize(tag))
            .collect();
        normalized.sort();
        normalized.dedup();
        normalized
    }
}

impl CacheStore for MemoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, key: &str) -> Result<Option<CachedValue>> {
        let expired_id = match self.entries.get(key) {
            None => return Ok(None),
            Some(entry) if !entry.is_expired(Instant::now()) => {
                return Ok(Some(entry.value.clone()));
            }
            Some(entry) => entry.id,
        };

        if let Some((_, entry)) = self.entries.remove_if(key, |_, e| e.id == expired_id) {
            trace!(cache = %self.name, key, "entry expired");
            self.retire(&entry);
        }
        Ok(None)
    }

    fn insert(&self, key: &str, value: CachedValue, ttl: Duration, tags: &[&str]) -> Result<()> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let tags = Self::normalize_tags(tags);
        let entry = StoredEntry {
            id,
            value,
            expires_at: Instant::now().checked_add(ttl),
            tags: tags.clone(),
        };

        let previous = if tags.is_empty() {
            self.entries.insert(key.to_string(), entry)
        } else {
            let mut index = self.tags.lock();
            index.subscribe(&tags, key, id);
            self.entries.insert(key.to_string(), entry)
        };

        if let Some(previous) = previous {
            self.retire(&previous);
        }
        trace!(cache = %self.name, key, ?ttl, "entry stored");

        if id % self.purge_interval == 0 {
            self.purge_expired();
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        if let Some((_, entry)) = self.entries.remove(key) {
            self.retire(&entry);
        }
        Ok(())
    }

    fn flush_tag(&self, tag: &str) -> Result<()> {
        let mut index = self.tags.lock();
        let subscribers = if is_blank(tag) {
            index.take_all()
        } else {
            index.take(&TagIndex::normalize(tag))
        };

        let mut flushed = 0;
        for (id, key) in subscribers {
            if let Some((_, entry)) = self.entries.remove_if(&key, |_, e| e.id == id) {
                index.unsubscribe(&entry.tags, entry.id);
                flushed += 1;
            }
        }
        debug!(cache = %self.name, tag, flushed, "flushed tag");
        Ok(())
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("name", &self.name)
            .field("entry_count", &self.entries.len())
            .finish()
    }
}
