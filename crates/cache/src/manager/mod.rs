//! Cache manager: per-operation policy in front of raw stores
//!
//! The manager looks up the policy of the operation a key was built for
//! (the key's item name) in the cache's configuration and decides whether
//! and where values are written:
//!
//! - operations not listed in a descriptor, or listed with a zero duration,
//!   are not cached
//! - redirecting operations store a pointer under the canonical key and the
//!   value under a derived key, so that an entity can be reached (and
//!   invalidated) through either
//! - non-cacheable redirecting operations (typically updates) remove the
//!   derived keys they touch and optionally write a fresh value back
//!
//! ```no_run
//! use cachet_cache::{CacheManager, MemoryStore};
//! use std::sync::Arc;
//!
//! # fn main() -> cachet_cache::Result<()> {
//! let manager = CacheManager::builder()
//!     .with_store(Arc::new(MemoryStore::new("AccessClient")))
//!     .build()?;
//!
//! let key = cachet_cache::cache_key!("GetBasket", 1);
//! let basket: Option<String> = manager.execute_function("AccessClient", &key, || {
//!     Some("basket".to_string())
//! })?;
//! # Ok(())
//! # }
//! ```

mod builder;
mod redirect;

pub use builder::CacheManagerBuilder;

use crate::concurrent::{KeyLock, LockHandle};
use crate::config::{CacheConfiguration, ConfigRegistry, ConfigSnapshot};
use crate::entry::{Cached, CachedValue, EntityKey, SharedValue};
use crate::errors::{CacheError, RecoveryHint, Result};
use crate::keys;
use crate::storage::{is_blank, CacheStore};
use redirect::{remove_redirected, split_targets, Redirect};
use serde::Serialize;
use std::any::{type_name, Any};
use std::collections::HashMap;
use std::fmt::{self, Display};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Duration used when neither the operation nor the cache defines one
pub const FALLBACK_DURATION: Duration = Duration::from_secs(300);

/// A registered cache: its store, configuration and key locks
pub(crate) struct CacheSlot {
    pub store: Arc<dyn CacheStore>,
    pub config: Arc<CacheConfiguration>,
    pub locks: KeyLock,
}

/// Configuration-driven front for one or more named caches
pub struct CacheManager {
    caches: HashMap<String, CacheSlot>,
    registry: Arc<ConfigRegistry>,
}

impl CacheManager {
    pub fn builder() -> CacheManagerBuilder {
        CacheManagerBuilder::new()
    }

    pub(crate) fn from_parts(
        caches: HashMap<String, CacheSlot>,
        registry: Arc<ConfigRegistry>,
    ) -> Self {
        Self { caches, registry }
    }

    /// Build a cache key, see [`crate::keys`]
    pub fn get_key(item_name: &str, args: &[&dyn Display]) -> String {
        keys::get_key(item_name, args)
    }

    /// Whether a descriptor file was found for `cache`
    pub fn has_configuration(&self, cache: &str) -> bool {
        self.caches
            .get(cache)
            .is_some_and(|slot| slot.config.has_file())
    }

    pub fn configuration(&self, cache: &str) -> Option<&Arc<CacheConfiguration>> {
        self.caches.get(cache).map(|slot| &slot.config)
    }

    pub fn registry(&self) -> &Arc<ConfigRegistry> {
        &self.registry
    }

    /// Names of the registered caches
    pub fn caches(&self) -> impl Iterator<Item = &str> {
        self.caches.keys().map(String::as_str)
    }

    fn slot(&self, cache: &str) -> Result<&CacheSlot> {
        self.caches.get(cache).ok_or_else(|| CacheError::UnknownCache {
            name: cache.to_string(),
            recovery_hint: RecoveryHint::RegisterCache,
        })
    }

    /// Look up `key`, following the redirect of its operation
    ///
    /// Unregistered caches and non-cacheable operations always miss.
    pub fn try_get<T>(&self, cache: &str, key: &str) -> Result<Cached<T>>
    where
        T: Clone + Any + Send + Sync,
    {
        let Some(slot) = self.caches.get(cache) else {
            return Ok(Cached::Miss);
        };
        let store = slot.store.as_ref();
        let snapshot = slot.config.snapshot();
        let item = keys::item_name(key);
        if !snapshot.should_cache(item) {
            return Ok(Cached::Miss);
        }

        let redirect = snapshot
            .definition(item)
            .and_then(|definition| Some((definition.redirect_format.as_ref()?, definition)));
        let Some((format, definition)) = redirect else {
            return read(store, key);
        };

        let entry = match store.get(key)? {
            None => return Ok(Cached::Miss),
            Some(CachedValue::Null) => return Ok(Cached::Null),
            Some(CachedValue::Value(entry)) => entry,
        };
        match entry.downcast_ref::<EntityKey>() {
            Some(EntityKey(pointer)) => {
                // Argument keys are stored already formatted
                let target = if definition.argument_name.is_some() {
                    pointer.clone()
                } else {
                    format.apply(pointer)
                };
                let Some(first) = split_targets(&target).next() else {
                    return Ok(Cached::Miss);
                };
                debug!(cache = %cache, key = %key, target = %first, "following redirect");
                read(store, first)
            }
            // Written while the redirect property was null
            None => downcast(key, &entry).map(Cached::Hit),
        }
    }

    /// Store `value` under `key` according to its operation's policy
    ///
    /// Returns whether anything was written.
    pub fn add<T>(&self, cache: &str, key: &str, value: Option<T>) -> Result<bool>
    where
        T: Serialize + Send + Sync + 'static,
    {
        self.add_with_dependencies(cache, key, value, &[])
    }

    /// [`CacheManager::add`] tagging the entry with one dependency
    pub fn add_with_dependency<T>(
        &self,
        cache: &str,
        key: &str,
        value: Option<T>,
        dependency: Option<&str>,
    ) -> Result<bool>
    where
        T: Serialize + Send + Sync + 'static,
    {
        let dependencies: &[&str] = match &dependency {
            Some(dependency) => std::slice::from_ref(dependency),
            None => &[],
        };
        self.add_with_dependencies(cache, key, value, dependencies)
    }

    /// [`CacheManager::add`] tagging every written entry with `dependencies`
    pub fn add_with_dependencies<T>(
        &self,
        cache: &str,
        key: &str,
        value: Option<T>,
        dependencies: &[&str],
    ) -> Result<bool>
    where
        T: Serialize + Send + Sync + 'static,
    {
        let slot = self.slot(cache)?;
        let store = slot.store.as_ref();
        let snapshot = slot.config.snapshot();
        let item = keys::item_name(key);
        let tags: Vec<&str> = dependencies
            .iter()
            .copied()
            .filter(|d| !is_blank(d))
            .collect();
        let ttl = write_duration(&snapshot, item);
        let cacheable = snapshot.should_cache(item);

        let definition = snapshot
            .definition(item)
            .filter(|definition| definition.redirect_source().is_some());
        let Some(definition) = definition else {
            if !cacheable {
                return Ok(false);
            }
            store.insert(key, CachedValue::from_option(value), ttl, &tags)?;
            debug!(cache = %cache, key = %key, ttl_secs = ttl.as_secs(), "cached");
            return Ok(true);
        };

        let Some(value) = value else {
            debug!(cache = %cache, key = %key, "empty result of a redirecting operation is not cached");
            return Ok(false);
        };
        let redirect = Redirect::compute(definition, key, &value)?;
        let value: SharedValue = Arc::new(value);

        if !cacheable {
            let Some(redirect) = redirect else {
                return Ok(false);
            };
            debug!(cache = %cache, key = %key, target = %redirect.target, "removing redirected entries");
            remove_redirected(store, &redirect.target)?;

            let Some(refresh) = snapshot.refresh_format(item) else {
                return Ok(false);
            };
            for refresh_key in split_targets(&refresh.apply(&redirect.value)) {
                debug!(cache = %cache, key = %key, refresh = %refresh_key, "refreshing redirected entry");
                store.insert(refresh_key, CachedValue::Value(Arc::clone(&value)), ttl, &tags)?;
            }
            return Ok(true);
        }

        match redirect {
            Some(redirect) => {
                for target in redirect.targets() {
                    store.insert(target, CachedValue::Value(Arc::clone(&value)), ttl, &tags)?;
                }
                store.insert(key, CachedValue::Value(Arc::new(redirect.pointer)), ttl, &tags)?;
            }
            None => store.insert(key, CachedValue::Value(value), ttl, &tags)?,
        }
        debug!(cache = %cache, key = %key, ttl_secs = ttl.as_secs(), "cached");
        Ok(true)
    }

    /// Read-through: return the cached value or compute and cache it
    ///
    /// `compute` runs at most once, and only on a miss. No lock is taken;
    /// combine with [`CacheManager::acquire_lock`] to collapse concurrent
    /// misses.
    pub fn execute_function<T, F>(&self, cache: &str, key: &str, compute: F) -> Result<Option<T>>
    where
        T: Clone + Serialize + Send + Sync + 'static,
        F: FnOnce() -> Option<T>,
    {
        self.execute_function_with_dependencies(cache, key, &[], compute)
    }

    pub fn execute_function_with_dependency<T, F>(
        &self,
        cache: &str,
        key: &str,
        dependency: Option<&str>,
        compute: F,
    ) -> Result<Option<T>>
    where
        T: Clone + Serialize + Send + Sync + 'static,
        F: FnOnce() -> Option<T>,
    {
        let dependencies: &[&str] = match &dependency {
            Some(dependency) => std::slice::from_ref(dependency),
            None => &[],
        };
        self.execute_function_with_dependencies(cache, key, dependencies, compute)
    }

    pub fn execute_function_with_dependencies<T, F>(
        &self,
        cache: &str,
        key: &str,
        dependencies: &[&str],
        compute: F,
    ) -> Result<Option<T>>
    where
        T: Clone + Serialize + Send + Sync + 'static,
        F: FnOnce() -> Option<T>,
    {
        self.try_execute_function(cache, key, dependencies, || Ok(compute()))
    }

    /// Read-through with a fallible computation
    ///
    /// Errors from `compute` are returned as-is and nothing is cached.
    pub fn try_execute_function<T, E, F>(
        &self,
        cache: &str,
        key: &str,
        dependencies: &[&str],
        compute: F,
    ) -> std::result::Result<Option<T>, E>
    where
        T: Clone + Serialize + Send + Sync + 'static,
        E: From<CacheError>,
        F: FnOnce() -> std::result::Result<Option<T>, E>,
    {
        self.slot(cache)?;
        match self.try_get::<T>(cache, key)? {
            Cached::Hit(value) => Ok(Some(value)),
            Cached::Null => Ok(None),
            Cached::Miss => {
                let value = compute()?;
                self.add_with_dependencies(cache, key, value.clone(), dependencies)?;
                Ok(value)
            }
        }
    }

    /// Invalidate every entry written with `dependency`
    ///
    /// A blank name invalidates every tagged entry.
    pub fn flush(&self, cache: &str, dependency: &str) -> Result<()> {
        let slot = self.slot(cache)?;
        debug!(cache = %cache, dependency = %dependency, "flushing dependency");
        slot.store.flush_tag(dependency)
    }

    /// Remove the entry stored under `key`
    pub fn remove(&self, cache: &str, key: &str) -> Result<()> {
        self.slot(cache)?.store.remove(key)
    }

    /// Serialize work on `key` until the handle is dropped
    ///
    /// Only cacheable operations are locked; everything else gets a no-op
    /// handle.
    pub fn acquire_lock(&self, cache: &str, key: &str) -> LockHandle<'_> {
        match self.caches.get(cache) {
            Some(slot) if slot.config.should_cache(keys::item_name(key)) => {
                LockHandle::Held(slot.locks.acquire(key))
            }
            _ => LockHandle::Noop,
        }
    }

    /// Drop the derived entries `value` redirects to when its operation is
    /// not cacheable
    pub fn clear_redirected<T>(&self, cache: &str, key: &str, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let slot = self.slot(cache)?;
        let snapshot = slot.config.snapshot();
        let item = keys::item_name(key);
        if snapshot.should_cache(item) {
            return Ok(());
        }
        let Some(definition) = snapshot.definition(item) else {
            return Ok(());
        };
        if let Some(redirect) = Redirect::compute(definition, key, value)? {
            debug!(cache = %cache, key = %key, target = %redirect.target, "clearing redirected entries");
            remove_redirected(slot.store.as_ref(), &redirect.target)?;
        }
        Ok(())
    }
}

impl fmt::Debug for CacheManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.caches().collect();
        names.sort_unstable();
        f.debug_struct("CacheManager").field("caches", &names).finish()
    }
}

/// TTL for writes of `item`
fn write_duration(snapshot: &ConfigSnapshot, item: &str) -> Duration {
    let duration = snapshot.cache_time(item);
    if !duration.is_zero() {
        return duration;
    }
    snapshot
        .default_duration()
        .filter(|d| !d.is_zero())
        .unwrap_or(FALLBACK_DURATION)
}

fn read<T: Clone + Any>(store: &dyn CacheStore, key: &str) -> Result<Cached<T>> {
    Ok(match store.get(key)? {
        None => Cached::Miss,
        Some(CachedValue::Null) => Cached::Null,
        Some(CachedValue::Value(value)) => Cached::Hit(downcast(key, &value)?),
    })
}

fn downcast<T: Clone + Any>(key: &str, value: &SharedValue) -> Result<T> {
    value
        .downcast_ref::<T>()
        .cloned()
        .ok_or_else(|| CacheError::TypeMismatch {
            key: key.to_string(),
            expected: type_name::<T>(),
            recovery_hint: RecoveryHint::UseWrittenType,
        })
}
