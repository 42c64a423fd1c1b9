mod common;

use cachet_cache::{cache_key, CacheConfiguration, Cached, ConfigLocator};
use common::*;
use std::fs::{self, File};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant, SystemTime};

const DISABLED: &str = r#"{
    "duration": 300,
    "items": [
        { "name": "GetEntityWithDefaultDuration", "duration": 0 }
    ]
}"#;

/// Rewrite a descriptor and push its mtime forward so the change is seen on
/// filesystems with coarse timestamps
fn rewrite(path: &std::path::Path, content: &str) {
    fs::write(path, content).unwrap();
    let file = File::options().write(true).open(path).unwrap();
    file.set_modified(SystemTime::now() + Duration::from_secs(2))
        .unwrap();
}

fn wait_for(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(50));
    }
    condition()
}

#[test]
fn explicit_reload_swaps_definitions() {
    let h = harness();
    let key = cache_key!("GetEntityWithDefaultDuration", 1);
    let config = Arc::clone(h.manager.configuration(CACHE).unwrap());
    assert!(config.is_watching());

    assert!(h.manager.add(CACHE, &key, Some(entity(1))).unwrap());

    rewrite(&h.dir.path().join("AccessClient.cache.json"), DISABLED);
    config.reload().unwrap();

    assert!(!config.should_cache("GetEntityWithDefaultDuration"));
    assert!(!config.should_cache("GetBasket"));
    assert_eq!(h.manager.try_get::<Arc<Entity>>(CACHE, &key).unwrap(), Cached::Miss);
    assert!(!h.manager.add(CACHE, &key, Some(entity(1))).unwrap());
}

#[test]
fn broken_descriptor_keeps_previous_definitions() {
    let h = harness();
    let config = Arc::clone(h.manager.configuration(CACHE).unwrap());

    rewrite(&h.dir.path().join("AccessClient.cache.json"), "{ \"duration\": ");
    assert!(config.reload().is_err());
    assert!(within_band(config.cache_time("GetEntityWithDefaultDuration"), 300));
}

#[test]
fn watcher_reloads_on_change() {
    cachet_utils::tracing::init_for_tests();
    let dir = config_dir();
    let path = dir.path().join("AccessClient.cache.json");
    let config = CacheConfiguration::load(CACHE, &ConfigLocator::new([dir.path()])).unwrap();
    assert!(config.should_cache("GetEntityWithDefaultDuration"));

    rewrite(&path, DISABLED);

    assert!(
        wait_for(Duration::from_secs(10), || {
            !config.should_cache("GetEntityWithDefaultDuration")
        }),
        "descriptor change was not picked up"
    );
    assert_eq!(config.cache_time("GetEntityWithDefaultDuration"), Duration::ZERO);
}

#[test]
fn reload_resamples_jitter_within_band() {
    let dir = config_dir();
    let config = CacheConfiguration::load(CACHE, &ConfigLocator::new([dir.path()])).unwrap();

    let samples: Vec<Duration> = (0..500)
        .map(|_| {
            config.reload().unwrap();
            config.cache_time("GetEntityWithDefaultDuration")
        })
        .collect();

    assert!(samples.iter().all(|d| within_band(*d, 300)));
    assert!(samples.iter().all(|d| (270..=330).contains(&d.as_secs())));

    let mean = samples.iter().map(Duration::as_secs_f64).sum::<f64>() / samples.len() as f64;
    assert!((285.0..315.0).contains(&mean), "mean {mean} too far from 300");
    assert!(samples.iter().any(|d| d.as_secs() < 290));
    assert!(samples.iter().any(|d| d.as_secs() >= 310));

    for _ in 0..20 {
        config.reload().unwrap();
        assert_eq!(config.cache_time("GetEntityWithZeroDuration"), Duration::ZERO);
    }
}
