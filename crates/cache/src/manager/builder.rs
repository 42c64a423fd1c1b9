//! Cache manager builder and initialization

use super::{CacheManager, CacheSlot};
use crate::concurrent::KeyLock;
use crate::config::{ConfigLocator, ConfigRegistry};
use crate::errors::Result;
use crate::storage::{CacheStore, MemoryStore};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Builder for CacheManager
#[derive(Default)]
pub struct CacheManagerBuilder {
    registry: Option<Arc<ConfigRegistry>>,
    locator: Option<ConfigLocator>,
    stores: Vec<Arc<dyn CacheStore>>,
}

impl CacheManagerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Share configurations with other managers
    ///
    /// Takes precedence over [`CacheManagerBuilder::with_locator`].
    pub fn with_registry(mut self, registry: Arc<ConfigRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Where descriptor files are searched; defaults to [`ConfigLocator::from_env`]
    pub fn with_locator(mut self, locator: ConfigLocator) -> Self {
        self.locator = Some(locator);
        self
    }

    /// Register a store under its own name; the first store of a name wins
    pub fn with_store(mut self, store: Arc<dyn CacheStore>) -> Self {
        self.stores.push(store);
        self
    }

    pub fn with_memory_store(self, name: &str) -> Self {
        self.with_store(Arc::new(MemoryStore::new(name)))
    }

    /// Load the configuration of every registered store
    pub fn build(self) -> Result<CacheManager> {
        let registry = match self.registry {
            Some(registry) => registry,
            None => Arc::new(ConfigRegistry::new(self.locator.unwrap_or_default())),
        };

        let mut caches = HashMap::with_capacity(self.stores.len());
        for store in self.stores {
            let name = store.name().to_string();
            if caches.contains_key(&name) {
                warn!(cache = %name, "cache registered twice, keeping the first store");
                continue;
            }

            let config = registry.get_or_load(&name)?;
            info!(
                cache = %name,
                descriptor = ?config.path(),
                "registered cache"
            );
            caches.insert(
                name,
                CacheSlot {
                    store,
                    config,
                    locks: KeyLock::new(),
                },
            );
        }

        Ok(CacheManager::from_parts(caches, registry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::Cached;
    use crate::storage::NullStore;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_first_store_wins() {
        let dir = TempDir::new().unwrap();
        let manager = CacheManagerBuilder::new()
            .with_locator(ConfigLocator::new([dir.path()]))
            .with_memory_store("Orders")
            .with_store(Arc::new(NullStore::new("Orders")))
            .build()
            .unwrap();

        assert_eq!(manager.caches().count(), 1);
        assert!(manager.add("Orders", "GetOrder:1:", Some(1u32)).unwrap());
        assert_eq!(manager.try_get::<u32>("Orders", "GetOrder:1:").unwrap(), Cached::Hit(1));
    }

    #[test]
    fn test_shared_registry() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Orders.cache.json"), r#"{ "duration": 60 }"#).unwrap();
        let registry = Arc::new(ConfigRegistry::new(ConfigLocator::new([dir.path()])));

        let first = CacheManagerBuilder::new()
            .with_registry(Arc::clone(&registry))
            .with_memory_store("Orders")
            .build()
            .unwrap();
        let second = CacheManagerBuilder::new()
            .with_registry(Arc::clone(&registry))
            .with_memory_store("Orders")
            .build()
            .unwrap();

        assert!(first.has_configuration("Orders"));
        assert!(Arc::ptr_eq(
            first.configuration("Orders").unwrap(),
            second.configuration("Orders").unwrap()
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_bad_descriptor_fails_build() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Orders.cache.json"), "[").unwrap();
        let result = CacheManagerBuilder::new()
            .with_locator(ConfigLocator::new([dir.path()]))
            .with_memory_store("Orders")
            .build();
        assert!(result.is_err());
    }
}
