#![allow(dead_code)]

use cachet_cache::{CacheManager, ConfigLocator, MemoryStore};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub const CACHE: &str = "AccessClient";

pub fn fixture_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/AccessClient.cache.json")
}

/// Temporary config directory holding a copy of the fixture descriptor
pub fn config_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::copy(fixture_path(), dir.path().join("AccessClient.cache.json")).unwrap();
    dir
}

pub struct Harness {
    pub dir: TempDir,
    pub store: Arc<MemoryStore>,
    pub manager: CacheManager,
}

/// Manager with the fixture descriptor and an `Unconfigured` cache without one
pub fn harness() -> Harness {
    cachet_utils::tracing::init_for_tests();

    let dir = config_dir();
    let store = Arc::new(MemoryStore::new(CACHE));
    let manager = CacheManager::builder()
        .with_locator(ConfigLocator::new([dir.path()]))
        .with_store(store.clone())
        .with_memory_store("Unconfigured")
        .build()
        .unwrap();

    Harness {
        dir,
        store,
        manager,
    }
}

pub fn within_band(actual: Duration, base_secs: u64) -> bool {
    let base = Duration::from_secs(base_secs).as_nanos();
    actual.as_nanos() * 10 >= base * 9 && actual.as_nanos() * 10 < base * 11
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entity {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Basket {
    pub id: u32,
    pub items: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Checkout {
    pub id: u32,
    pub total: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Customer {
    pub id: u32,
    pub email: String,
    pub name: String,
}

pub fn entity(id: u32) -> Arc<Entity> {
    Arc::new(Entity {
        id,
        name: format!("entity {id}"),
    })
}

pub fn customer(id: u32, name: &str) -> Arc<Customer> {
    Arc::new(Customer {
        id,
        email: format!("customer{id}@example.com"),
        name: name.to_string(),
    })
}
