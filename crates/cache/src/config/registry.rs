use super::configuration::CacheConfiguration;
use super::locator::ConfigLocator;
use crate::errors::Result;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

/// Loaded configurations keyed by cache name
///
/// A configuration is loaded on first access and kept for the lifetime of
/// the registry. Failed loads are not remembered, so the next access retries.
#[derive(Debug)]
pub struct ConfigRegistry {
    locator: ConfigLocator,
    configs: DashMap<String, Arc<CacheConfiguration>>,
}

impl ConfigRegistry {
    pub fn new(locator: ConfigLocator) -> Self {
        Self {
            locator,
            configs: DashMap::new(),
        }
    }

    /// The configuration for `cache`, loading it if needed
    pub fn get_or_load(&self, cache: &str) -> Result<Arc<CacheConfiguration>> {
        if let Some(config) = self.configs.get(cache) {
            return Ok(Arc::clone(config.value()));
        }

        let entry = self
            .configs
            .entry(cache.to_string())
            .or_try_insert_with(|| {
                debug!(cache = %cache, "loading cache configuration");
                CacheConfiguration::load(cache, &self.locator)
            })?;
        Ok(Arc::clone(entry.value()))
    }

    /// The configuration for `cache` if it was already loaded
    pub fn get(&self, cache: &str) -> Option<Arc<CacheConfiguration>> {
        self.configs.get(cache).map(|c| Arc::clone(c.value()))
    }

    pub fn locator(&self) -> &ConfigLocator {
        &self.locator
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}

impl Default for ConfigRegistry {
    fn default() -> Self {
        Self::new(ConfigLocator::from_env())
    }
}
