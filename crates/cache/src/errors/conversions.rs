//! Error conversion utilities

use super::types::{CacheError, RecoveryHint};

impl From<cachet_utils::WatchError> for CacheError {
    fn from(error: cachet_utils::WatchError) -> Self {
        let path = match &error {
            cachet_utils::WatchError::Init { path, .. } => path.clone(),
            cachet_utils::WatchError::Watch { dir, .. } => dir.clone(),
        };
        Self::Watch {
            recovery_hint: RecoveryHint::CheckPermissions { path: path.clone() },
            path,
            source: error,
        }
    }
}
