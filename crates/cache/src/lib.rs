//! Configuration-driven caching for cachet
//!
//! This crate puts a policy layer in front of plain key/value stores:
//! - per-operation durations read from `<cache>.cache.json` descriptors,
//!   jittered and reloaded when the file changes
//! - key redirection, so an entity cached by one lookup can be found and
//!   invalidated through a second, derived key
//! - tag ("dependency") based group invalidation
//! - per-key locking to collapse concurrent cache misses
//!
//! The entry point is [`CacheManager`], assembled with
//! [`CacheManagerBuilder`].

pub mod concurrent;
pub mod config;
pub mod entry;
pub mod errors;
pub mod keys;
pub mod manager;
pub mod storage;

pub use concurrent::{KeyLock, KeyLockGuard, LockHandle};
pub use config::{CacheConfiguration, ConfigLocator, ConfigRegistry};
pub use entry::{Cached, CachedValue, EntityKey};
pub use errors::{CacheError, Error, RecoveryHint, Result};
pub use keys::{get_key, CacheKey};
pub use manager::{CacheManager, CacheManagerBuilder, FALLBACK_DURATION};
pub use storage::{CacheStore, MemoryStore, NullStore};
