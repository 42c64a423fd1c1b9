//! Shared utilities for cachet
//!
//! This crate provides the ambient pieces the cache crate builds on:
//! tracing subscriber setup and single-file change notification.

pub mod file_times;
pub mod tracing;
pub mod watch;

pub use file_times::FileTime;
pub use watch::{FileWatcher, WatchError};
