//! On-disk descriptor format
//!
//! ```json
//! {
//!   "duration": 300,
//!   "items": [
//!     { "name": "GetBasket", "redirectFormat": "Basket{0}", "propertyPath": "Id" },
//!     { "name": "InsertBasketItem", "duration": 0,
//!       "redirectFormat": "Basket{0};Checkout{0}", "propertyPath": "Id",
//!       "refreshFormat": "Basket{0}" }
//!   ]
//! }
//! ```
//!
//! Durations are in seconds.

use crate::errors::{CacheError, RecoveryHint, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root of a cache descriptor file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    /// Default duration in seconds for items without their own
    pub duration: u64,
    #[serde(default)]
    pub items: Vec<ItemDescriptor>,
}

/// One cached operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDescriptor {
    pub name: String,
    /// Duration in seconds, inherited from the root when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    /// Alternate key built from the property path or argument value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_format: Option<String>,
    /// Field of the cached value used as the redirect value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_path: Option<String>,
    /// Call argument used as the redirect value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub argument_name: Option<String>,
    /// Key to re-populate when the operation itself is not cacheable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_format: Option<String>,
}

impl Descriptor {
    /// Parse descriptor JSON read from `path`
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| CacheError::ConfigParse {
            path: path.to_path_buf(),
            reason: e.to_string(),
            source: Some(Box::new(e)),
            recovery_hint: RecoveryHint::FixDescriptor {
                path: path.to_path_buf(),
            },
        })
    }
}
