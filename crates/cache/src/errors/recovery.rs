//! Recovery utilities for cache errors

use super::types::{CacheError, RecoveryHint};

impl CacheError {
    /// Get the recovery hint for this error
    #[must_use]
    pub const fn recovery_hint(&self) -> &RecoveryHint {
        match self {
            Self::Io { recovery_hint, .. }
            | Self::ConfigParse { recovery_hint, .. }
            | Self::InvalidDefinition { recovery_hint, .. }
            | Self::MissingRedirectProperty { recovery_hint, .. }
            | Self::UnknownCache { recovery_hint, .. }
            | Self::TypeMismatch { recovery_hint, .. }
            | Self::Serialization { recovery_hint, .. }
            | Self::Watch { recovery_hint, .. } => recovery_hint,
        }
    }

    /// Check if this error comes from a descriptor file or definition
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::ConfigParse { .. }
                | Self::InvalidDefinition { .. }
                | Self::MissingRedirectProperty { .. }
        )
    }
}
