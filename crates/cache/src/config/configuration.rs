use super::definition::CacheDefinition;
use super::descriptor::Descriptor;
use super::format::KeyFormat;
use super::jitter::jitter;
use super::locator::ConfigLocator;
use super::property::PropertyPath;
use crate::errors::{CacheError, RecoveryHint, Result};
use cachet_utils::FileWatcher;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{debug, error, info};

/// Immutable view of one cache's definitions
///
/// A snapshot is built completely before it replaces the previous one, so
/// readers either see the old definitions or the new ones, never a mix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigSnapshot {
    has_file: bool,
    default_duration: Option<Duration>,
    definitions: HashMap<String, CacheDefinition>,
}

impl ConfigSnapshot {
    /// Snapshot used when no descriptor exists: everything is cacheable
    pub fn without_file() -> Self {
        Self::default()
    }

    /// Compile a parsed descriptor, jittering every duration
    pub fn from_descriptor(cache: &str, descriptor: Descriptor) -> Result<Self> {
        let base = Duration::from_secs(descriptor.duration);
        let mut definitions = HashMap::with_capacity(descriptor.items.len());

        for item in descriptor.items {
            let definition = CacheDefinition::compile(cache, item, base, jitter)?;
            if definitions.contains_key(&definition.name) {
                return Err(CacheError::InvalidDefinition {
                    cache: cache.to_string(),
                    item: definition.name,
                    reason: "item is defined more than once".to_string(),
                    recovery_hint: RecoveryHint::UpdateConfiguration,
                });
            }
            definitions.insert(definition.name.clone(), definition);
        }

        Ok(Self {
            has_file: true,
            default_duration: Some(jitter(base)),
            definitions,
        })
    }

    pub fn has_file(&self) -> bool {
        self.has_file
    }

    /// Jittered cache-wide default, absent without a descriptor
    pub fn default_duration(&self) -> Option<Duration> {
        self.default_duration
    }

    pub fn definition(&self, item: &str) -> Option<&CacheDefinition> {
        self.definitions.get(item)
    }

    pub fn definitions(&self) -> impl Iterator<Item = &CacheDefinition> {
        self.definitions.values()
    }

    /// Jittered duration of `item`, zero when it is not listed
    pub fn cache_time(&self, item: &str) -> Duration {
        self.definition(item)
            .map(|d| d.duration)
            .unwrap_or(Duration::ZERO)
    }

    /// Whether values of `item` may be cached
    pub fn should_cache(&self, item: &str) -> bool {
        !self.has_file || !self.cache_time(item).is_zero()
    }

    pub fn redirect_format(&self, item: &str) -> Option<&KeyFormat> {
        self.definition(item)?.redirect_format.as_ref()
    }

    pub fn property_path(&self, item: &str) -> Option<&PropertyPath> {
        self.definition(item)?.property_path.as_ref()
    }

    pub fn argument_name(&self, item: &str) -> Option<&str> {
        self.definition(item)?.argument_name.as_deref()
    }

    pub fn refresh_format(&self, item: &str) -> Option<&KeyFormat> {
        self.definition(item)?.refresh_format.as_ref()
    }
}

/// Live configuration of one named cache
///
/// Loaded from the first descriptor the locator finds and reloaded whenever
/// that file is rewritten. Lookups go through [`CacheConfiguration::snapshot`]
/// or the convenience getters, which never wait for a reload in progress.
pub struct CacheConfiguration {
    name: String,
    path: Option<PathBuf>,
    snapshot: RwLock<Arc<ConfigSnapshot>>,
    reload_lock: Mutex<()>,
    watcher: Mutex<Option<FileWatcher>>,
}

impl CacheConfiguration {
    /// Locate, load and start watching the descriptor for `name`
    pub fn load(name: &str, locator: &ConfigLocator) -> Result<Arc<Self>> {
        let path = locator.find(name);
        let config = Arc::new(Self {
            name: name.to_string(),
            path,
            snapshot: RwLock::new(Arc::new(ConfigSnapshot::without_file())),
            reload_lock: Mutex::new(()),
            watcher: Mutex::new(None),
        });

        config.reload()?;
        if let Some(path) = &config.path {
            let watcher = Self::watch(Arc::downgrade(&config), path)?;
            *config.watcher.lock() = Some(watcher);
        } else {
            info!(cache = %name, "no cache descriptor found, caching everything");
        }

        Ok(config)
    }

    fn watch(config: Weak<Self>, path: &Path) -> Result<FileWatcher> {
        let watcher = FileWatcher::watch(path, move |path| {
            let Some(config) = config.upgrade() else {
                return;
            };
            match config.reload() {
                Ok(()) => info!(cache = %config.name, path = %path.display(), "cache descriptor reloaded"),
                Err(e) => error!(
                    cache = %config.name,
                    path = %path.display(),
                    error = %e,
                    "cache descriptor reload failed, keeping previous definitions"
                ),
            }
        })?;
        Ok(watcher)
    }

    /// Re-read the descriptor and swap in the new definitions
    ///
    /// On error the previous definitions stay in force.
    pub fn reload(&self) -> Result<()> {
        let _reloading = self.reload_lock.lock();

        let snapshot = match &self.path {
            None => ConfigSnapshot::without_file(),
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|source| CacheError::Io {
                    path: path.clone(),
                    operation: "read descriptor",
                    recovery_hint: RecoveryHint::CheckPermissions { path: path.clone() },
                    source,
                })?;
                let descriptor = Descriptor::parse(&content, path)?;
                ConfigSnapshot::from_descriptor(&self.name, descriptor)?
            }
        };

        debug!(
            cache = %self.name,
            items = snapshot.definitions.len(),
            has_file = snapshot.has_file,
            "loaded cache definitions"
        );
        *self.snapshot.write() = Arc::new(snapshot);
        Ok(())
    }

    /// Current definitions
    pub fn snapshot(&self) -> Arc<ConfigSnapshot> {
        self.snapshot.read().clone()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The descriptor in use, if one was found
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn has_file(&self) -> bool {
        self.path.is_some()
    }

    pub fn is_watching(&self) -> bool {
        self.watcher.lock().is_some()
    }

    pub fn default_duration(&self) -> Option<Duration> {
        self.snapshot().default_duration()
    }

    pub fn cache_time(&self, item: &str) -> Duration {
        self.snapshot().cache_time(item)
    }

    pub fn should_cache(&self, item: &str) -> bool {
        self.snapshot().should_cache(item)
    }

    pub fn redirect_format(&self, item: &str) -> Option<KeyFormat> {
        self.snapshot().redirect_format(item).cloned()
    }

    pub fn property_path(&self, item: &str) -> Option<PropertyPath> {
        self.snapshot().property_path(item).cloned()
    }

    pub fn argument_name(&self, item: &str) -> Option<String> {
        self.snapshot().argument_name(item).map(str::to_string)
    }

    pub fn refresh_format(&self, item: &str) -> Option<KeyFormat> {
        self.snapshot().refresh_format(item).cloned()
    }
}

impl fmt::Debug for CacheConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheConfiguration")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("watching", &self.is_watching())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const DESCRIPTOR: &str = r#"{
        "duration": 300,
        "items": [
            { "name": "GetEntityWithDefaultDuration" },
            { "name": "GetEntityWith1MinuteDuration", "duration": 60 },
            { "name": "GetEntityWithZeroDuration", "duration": 0 },
            { "name": "GetBasket", "redirectFormat": "Basket{0}", "propertyPath": "Id" },
            { "name": "InsertBasketItem", "duration": 0, "redirectFormat": "Basket{0};Checkout{0}",
              "propertyPath": "Id", "refreshFormat": "Basket{0}" }
        ]
    }"#;

    fn setup(content: &str) -> (TempDir, ConfigLocator) {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("AccessClient.cache.json"), content).unwrap();
        let locator = ConfigLocator::new([dir.path()]);
        (dir, locator)
    }

    fn within_band(actual: Duration, base_secs: u64) -> bool {
        let base = Duration::from_secs(base_secs).as_nanos();
        actual.as_nanos() * 10 >= base * 9 && actual.as_nanos() * 10 < base * 11
    }

    #[test]
    fn test_lookups() {
        let (_dir, locator) = setup(DESCRIPTOR);
        let config = CacheConfiguration::load("AccessClient", &locator).unwrap();

        assert!(config.has_file());
        assert!(within_band(config.default_duration().unwrap(), 300));
        assert!(within_band(config.cache_time("GetEntityWithDefaultDuration"), 300));
        assert!(within_band(config.cache_time("GetEntityWith1MinuteDuration"), 60));
        assert_eq!(config.cache_time("GetEntityWithZeroDuration"), Duration::ZERO);
        assert_eq!(config.cache_time("NotListed"), Duration::ZERO);
        assert!(!config.should_cache("NotListed"));
        assert!(!config.should_cache("GetEntityWithZeroDuration"));

        assert_eq!(
            config.redirect_format("GetBasket").map(|f| f.to_string()),
            Some("Basket{0}".to_string())
        );
        assert_eq!(
            config.property_path("GetBasket").map(|p| p.to_string()),
            Some("Id".to_string())
        );
        assert_eq!(config.argument_name("GetBasket"), None);
        assert_eq!(
            config.refresh_format("InsertBasketItem").map(|f| f.to_string()),
            Some("Basket{0}".to_string())
        );
        assert_eq!(config.refresh_format("NotListed"), None);
    }

    #[test]
    fn test_without_descriptor_everything_is_cacheable() {
        let dir = TempDir::new().unwrap();
        let locator = ConfigLocator::new([dir.path()]);
        let config = CacheConfiguration::load("Missing", &locator).unwrap();

        assert!(!config.has_file());
        assert!(!config.is_watching());
        assert_eq!(config.default_duration(), None);
        assert_eq!(config.cache_time("Anything"), Duration::ZERO);
        assert!(config.should_cache("Anything"));
    }

    #[test]
    fn test_parse_failure_is_reported() {
        let (_dir, locator) = setup("{ not json");
        let err = CacheConfiguration::load("AccessClient", &locator).unwrap_err();
        assert!(matches!(err, CacheError::ConfigParse { .. }));
    }

    #[test]
    fn test_duplicate_items_rejected() {
        let (_dir, locator) = setup(
            r#"{ "duration": 10, "items": [ { "name": "GetX" }, { "name": "GetX", "duration": 0 } ] }"#,
        );
        let err = CacheConfiguration::load("AccessClient", &locator).unwrap_err();
        assert!(matches!(err, CacheError::InvalidDefinition { ref item, .. } if item == "GetX"));
    }

    #[test]
    fn test_failed_reload_keeps_previous_snapshot() {
        let (dir, locator) = setup(DESCRIPTOR);
        let config = CacheConfiguration::load("AccessClient", &locator).unwrap();
        let before = config.snapshot();

        fs::write(dir.path().join("AccessClient.cache.json"), "{ broken").unwrap();
        assert!(config.reload().is_err());
        assert!(Arc::ptr_eq(&before, &config.snapshot()));
    }

    #[test]
    fn test_unreadable_descriptor_names_its_path() {
        let (dir, locator) = setup(DESCRIPTOR);
        let config = CacheConfiguration::load("AccessClient", &locator).unwrap();
        let path = dir.path().join("AccessClient.cache.json");

        fs::remove_file(&path).unwrap();
        let err = config.reload().unwrap_err();
        assert!(matches!(
            &err,
            CacheError::Io { path: p, operation: "read descriptor", .. } if p == &path
        ));
        assert_eq!(err.recovery_hint(), &RecoveryHint::CheckPermissions { path: path.clone() });
        assert!(err.to_string().contains("read descriptor"));
        assert!(config.should_cache("GetEntityWithDefaultDuration"));
    }

    #[test]
    fn test_reload_resamples_jitter() {
        let (_dir, locator) = setup(DESCRIPTOR);
        let config = CacheConfiguration::load("AccessClient", &locator).unwrap();

        let mut seen = std::collections::HashSet::new();
        for _ in 0..20 {
            config.reload().unwrap();
            let time = config.cache_time("GetEntityWithDefaultDuration");
            assert!(within_band(time, 300));
            seen.insert(time);
        }
        assert!(seen.len() > 1);
    }
}
