//! Display implementations for cache errors

use super::types::CacheError;
use std::fmt;

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io {
                path,
                operation,
                source,
                ..
            } => write!(
                f,
                "I/O error during {} on '{}': {}",
                operation,
                path.display(),
                source
            ),
            Self::ConfigParse { path, reason, .. } => write!(
                f,
                "Failed to load cache configuration '{}': {reason}",
                path.display()
            ),
            Self::InvalidDefinition {
                cache,
                item,
                reason,
                ..
            } => write!(
                f,
                "Invalid cache definition '{item}' in cache '{cache}': {reason}"
            ),
            Self::MissingRedirectProperty {
                item,
                property_path,
                segment,
                ..
            } => write!(
                f,
                "Property '{segment}' of path '{property_path}' not found on value cached by '{item}'"
            ),
            Self::UnknownCache { name, .. } => write!(f, "Cache '{name}' is not registered"),
            Self::TypeMismatch { key, expected, .. } => {
                write!(f, "Cached value for key '{key}' is not a {expected}")
            }
            Self::Serialization { key, source, .. } => {
                write!(f, "Failed to inspect value for key '{key}': {source}")
            }
            Self::Watch { path, source, .. } => write!(
                f,
                "Failed to watch cache configuration '{}': {source}",
                path.display()
            ),
        }
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::ConfigParse { source, .. } => source
                .as_ref()
                .map(|e| e.as_ref() as &(dyn std::error::Error + 'static)),
            Self::Serialization { source, .. } => Some(source),
            Self::Watch { source, .. } => Some(source),
            _ => None,
        }
    }
}
