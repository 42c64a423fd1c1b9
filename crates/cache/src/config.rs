//! Per-cache configuration loaded from descriptor files
//!
//! Each named cache may have a `<name>.cache.json` descriptor listing the
//! operations it caches. Without a descriptor everything is cacheable with
//! the fallback duration; with one, only listed operations with a non-zero
//! duration are. Durations are jittered by ±10% on every (re)load so that
//! entries written together do not expire together.

mod configuration;
mod definition;
mod descriptor;
mod format;
mod jitter;
mod locator;
mod property;
mod registry;

pub use configuration::{CacheConfiguration, ConfigSnapshot};
pub use definition::{CacheDefinition, RedirectSource};
pub use descriptor::{Descriptor, ItemDescriptor};
pub use format::KeyFormat;
pub use jitter::jitter;
pub use locator::{ConfigLocator, CONFIG_DIR_ENV, DESCRIPTOR_SUFFIX};
pub use property::PropertyPath;
pub use registry::ConfigRegistry;
