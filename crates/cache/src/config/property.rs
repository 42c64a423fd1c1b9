//! Property paths evaluated against cached values

use crate::errors::{CacheError, RecoveryHint, Result};
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// A dot-separated path into a value's serialized fields
///
/// The path is split once when the descriptor loads and evaluated over the
/// value's `Serialize` representation, so any serde-derived type can be
/// redirected without extra glue. Segment lookup is exact first and falls
/// back to an ASCII case-insensitive match, which lets descriptors written
/// as `Id` address a field named `id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyPath {
    path: String,
    segments: Vec<String>,
}

impl PropertyPath {
    pub fn parse(path: &str) -> std::result::Result<Self, String> {
        let segments: Vec<String> = path.split('.').map(str::to_string).collect();
        if segments.iter().any(|s| s.trim().is_empty()) {
            return Err(format!("empty segment in property path '{path}'"));
        }
        Ok(Self {
            path: path.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.path
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Read the path from `value`
    ///
    /// Returns `Ok(None)` when a segment holds null, and
    /// [`CacheError::MissingRedirectProperty`] when a segment does not exist.
    pub fn resolve<T: Serialize + ?Sized>(&self, item: &str, value: &T) -> Result<Option<String>> {
        let mut current = serde_json::to_value(value).map_err(|source| CacheError::Serialization {
            key: item.to_string(),
            source,
            recovery_hint: RecoveryHint::UpdateConfiguration,
        })?;

        for segment in &self.segments {
            let next = match current {
                Value::Object(mut fields) => {
                    let field = if fields.contains_key(segment) {
                        Some(segment.clone())
                    } else {
                        fields
                            .keys()
                            .find(|k| k.eq_ignore_ascii_case(segment))
                            .cloned()
                    };
                    field.and_then(|f| fields.remove(&f))
                }
                _ => None,
            };

            current = match next {
                Some(Value::Null) => return Ok(None),
                Some(value) => value,
                None => {
                    return Err(CacheError::MissingRedirectProperty {
                        item: item.to_string(),
                        property_path: self.path.clone(),
                        segment: segment.clone(),
                        recovery_hint: RecoveryHint::UpdateConfiguration,
                    })
                }
            };
        }

        Ok(match current {
            Value::Null => None,
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            other => Some(other.to_string()),
        })
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Customer {
        id: u32,
        email: Option<String>,
        company: Company,
    }

    #[derive(Serialize)]
    struct Company {
        #[serde(rename = "Code")]
        code: String,
    }

    fn customer() -> Customer {
        Customer {
            id: 5,
            email: None,
            company: Company {
                code: "ACME".to_string(),
            },
        }
    }

    #[test]
    fn test_resolves_nested_paths() {
        let path = PropertyPath::parse("Company.Code").unwrap();
        assert_eq!(path.segments().len(), 2);
        assert_eq!(
            path.resolve("GetCustomer", &customer()).unwrap(),
            Some("ACME".to_string())
        );

        let path = PropertyPath::parse("Id").unwrap();
        assert_eq!(
            path.resolve("GetCustomer", &customer()).unwrap(),
            Some("5".to_string())
        );
    }

    #[test]
    fn test_null_segment_yields_nothing() {
        let path = PropertyPath::parse("email").unwrap();
        assert_eq!(path.resolve("GetCustomer", &customer()).unwrap(), None);
    }

    #[test]
    fn test_missing_segment_is_an_error() {
        let path = PropertyPath::parse("Company.Name").unwrap();
        match path.resolve("GetCustomer", &customer()) {
            Err(CacheError::MissingRedirectProperty {
                item,
                property_path,
                segment,
                ..
            }) => {
                assert_eq!(item, "GetCustomer");
                assert_eq!(property_path, "Company.Name");
                assert_eq!(segment, "Name");
            }
            other => panic!("expected missing property, got {other:?}"),
        }
    }

    #[test]
    fn test_scalar_values_have_no_properties() {
        let path = PropertyPath::parse("Id").unwrap();
        assert!(path.resolve("GetNumber", &42).is_err());
    }

    #[test]
    fn test_rejects_empty_segments() {
        assert!(PropertyPath::parse("a..b").is_err());
        assert!(PropertyPath::parse("").is_err());
    }
}
