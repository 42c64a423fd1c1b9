use super::CacheStore;
use crate::entry::CachedValue;
use crate::errors::Result;
use std::time::Duration;

/// Store that never holds anything
///
/// Registering a `NullStore` under a cache name turns caching off for it
/// while leaving call sites untouched.
#[derive(Debug, Clone)]
pub struct NullStore {
    name: String,
}

impl NullStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl CacheStore for NullStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, _key: &str) -> Result<Option<CachedValue>> {
        Ok(None)
    }

    fn insert(&self, _key: &str, _value: CachedValue, _ttl: Duration, _tags: &[&str]) -> Result<()> {
        Ok(())
    }

    fn remove(&self, _key: &str) -> Result<()> {
        Ok(())
    }

    fn flush_tag(&self, _tag: &str) -> Result<()> {
        Ok(())
    }
}
