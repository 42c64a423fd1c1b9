//! Raw cache stores
//!
//! A [`CacheStore`] is the key/value backend the manager writes through. It
//! owns expiry and tag invalidation; the manager only decides what to write
//! where. Stores must be safe to share between threads.
//!
//! Tag contract:
//! - entries written without tags are never affected by [`CacheStore::flush_tag`]
//! - flushing a tag removes every live entry written with it, once; the
//!   subscriptions are retired afterwards
//! - overwriting a key retires the old entry's subscriptions
//! - flushing a blank tag removes every tagged entry
//! - `remove` and TTL expiry never flush tags

mod memory;
mod null;
mod tags;

pub use memory::{MemoryStore, DEFAULT_PURGE_INTERVAL};
pub use null::NullStore;

use crate::entry::CachedValue;
use crate::errors::Result;
use std::time::Duration;

/// Key/value backend with TTL and tag invalidation
pub trait CacheStore: Send + Sync {
    /// Name of the cache this store backs
    fn name(&self) -> &str;

    /// Read a live entry
    fn get(&self, key: &str) -> Result<Option<CachedValue>>;

    /// Write an entry, replacing any previous one under `key`
    fn insert(&self, key: &str, value: CachedValue, ttl: Duration, tags: &[&str]) -> Result<()>;

    /// Delete an entry if present
    fn remove(&self, key: &str) -> Result<()>;

    /// Invalidate every entry written with `tag`
    fn flush_tag(&self, tag: &str) -> Result<()>;
}

/// Whether a tag name counts as absent
pub(crate) fn is_blank(tag: &str) -> bool {
    tag.trim().is_empty()
}
