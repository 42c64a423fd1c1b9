//! Core error types for the cache layer

use std::path::PathBuf;

/// Result type for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;

/// Re-export CacheError as Error for convenience
pub use CacheError as Error;

/// Error type for cache operations
#[derive(Debug)]
pub enum CacheError {
    /// I/O errors while reading a cache descriptor
    Io {
        path: PathBuf,
        operation: &'static str,
        source: std::io::Error,
        recovery_hint: RecoveryHint,
    },

    /// A descriptor file exists but could not be parsed
    ConfigParse {
        path: PathBuf,
        reason: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        recovery_hint: RecoveryHint,
    },

    /// A descriptor item is well-formed JSON but not a usable definition
    InvalidDefinition {
        cache: String,
        item: String,
        reason: String,
        recovery_hint: RecoveryHint,
    },

    /// A configured property path does not exist on the value being cached
    MissingRedirectProperty {
        item: String,
        property_path: String,
        segment: String,
        recovery_hint: RecoveryHint,
    },

    /// The named cache was never registered with the manager
    UnknownCache {
        name: String,
        recovery_hint: RecoveryHint,
    },

    /// A cached value has a different type than the one requested
    TypeMismatch {
        key: String,
        expected: &'static str,
        recovery_hint: RecoveryHint,
    },

    /// A value could not be converted for property path evaluation
    Serialization {
        key: String,
        source: serde_json::Error,
        recovery_hint: RecoveryHint,
    },

    /// The descriptor file watch could not be installed
    Watch {
        path: PathBuf,
        source: cachet_utils::WatchError,
        recovery_hint: RecoveryHint,
    },
}

/// Recovery hints for error handling
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryHint {
    /// Check file permissions
    CheckPermissions { path: PathBuf },

    /// Fix the descriptor file and let the watcher reload it
    FixDescriptor { path: PathBuf },

    /// The code and the descriptor disagree; one of them must change
    UpdateConfiguration,

    /// Register the cache with the manager builder
    RegisterCache,

    /// Read the key with the type it was written with
    UseWrittenType,
}
