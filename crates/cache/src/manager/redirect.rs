//! Redirect key computation

use crate::config::{CacheDefinition, RedirectSource};
use crate::entry::EntityKey;
use crate::errors::Result;
use crate::keys;
use crate::storage::CacheStore;
use serde::Serialize;

/// Where a redirecting write goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Redirect {
    /// Raw redirect value (property value or argument key)
    pub value: String,
    /// Keys the value is written to; may list several
    pub target: String,
    /// Pointer stored under the canonical key
    pub pointer: EntityKey,
}

impl Redirect {
    /// Compute the redirect of `value` written under `key`
    ///
    /// `None` when the definition does not redirect or the property path
    /// leads to a null.
    pub fn compute<T: Serialize + ?Sized>(
        definition: &CacheDefinition,
        key: &str,
        value: &T,
    ) -> Result<Option<Self>> {
        let (Some(format), Some(source)) =
            (definition.redirect_format.as_ref(), definition.redirect_source())
        else {
            return Ok(None);
        };

        Ok(match source {
            RedirectSource::Property(path) => path
                .resolve(&definition.name, value)?
                .map(|value| Self {
                    target: format.apply(&value),
                    pointer: EntityKey(value.clone()),
                    value,
                }),
            RedirectSource::ArgumentKey => {
                let value = keys::strip_item_name(key).to_string();
                Some(Self {
                    target: value.clone(),
                    pointer: EntityKey(value.clone()),
                    value,
                })
            }
            RedirectSource::KeyArguments => {
                let value = keys::strip_item_name(key).to_string();
                Some(Self {
                    target: format.apply(&value),
                    pointer: EntityKey(value.clone()),
                    value,
                })
            }
        })
    }

    /// Individual keys named by the target
    pub fn targets(&self) -> impl Iterator<Item = &str> {
        split_targets(&self.target)
    }
}

/// Split a `;`-joined target into keys
pub(crate) fn split_targets(target: &str) -> impl Iterator<Item = &str> {
    target.split(';').map(str::trim).filter(|k| !k.is_empty())
}

/// Remove every key a target names
pub(crate) fn remove_redirected(store: &dyn CacheStore, target: &str) -> Result<()> {
    for key in split_targets(target) {
        store.remove(key)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{KeyFormat, PropertyPath};
    use serde::Serialize;
    use std::time::Duration;

    #[derive(Serialize)]
    struct Basket {
        id: u32,
        owner: Option<String>,
    }

    fn definition(format: &str, path: Option<&str>) -> CacheDefinition {
        CacheDefinition {
            name: "GetBasket".to_string(),
            duration: Duration::from_secs(300),
            redirect_format: Some(KeyFormat::parse(format).unwrap()),
            property_path: path.map(|p| PropertyPath::parse(p).unwrap()),
            argument_name: None,
            refresh_format: None,
        }
    }

    #[test]
    fn test_property_redirect() {
        let redirect = Redirect::compute(
            &definition("Basket{0};Checkout{0}", Some("Id")),
            "GetBasket:1:",
            &Basket { id: 1, owner: None },
        )
        .unwrap()
        .unwrap();

        assert_eq!(redirect.value, "1");
        assert_eq!(redirect.pointer, EntityKey("1".to_string()));
        assert_eq!(redirect.targets().collect::<Vec<_>>(), ["Basket1", "Checkout1"]);
    }

    #[test]
    fn test_null_property_has_no_redirect() {
        let redirect = Redirect::compute(
            &definition("Owner{0}", Some("Owner")),
            "GetBasket:1:",
            &Basket { id: 1, owner: None },
        )
        .unwrap();
        assert_eq!(redirect, None);
    }

    #[test]
    fn test_argument_key_redirect() {
        // The caller builds the key from the already formatted argument
        let mut by_argument = definition("Basket{0}", None);
        by_argument.argument_name = Some("basketId".to_string());
        let redirect = Redirect::compute(
            &by_argument,
            "GetBasket:Basket7:SE:",
            &Basket { id: 7, owner: None },
        )
        .unwrap()
        .unwrap();

        assert_eq!(redirect.value, "Basket7:SE:");
        assert_eq!(redirect.targets().collect::<Vec<_>>(), ["Basket7:SE:"]);
        assert_eq!(redirect.pointer, EntityKey("Basket7:SE:".to_string()));
    }

    #[test]
    fn test_key_arguments_redirect() {
        let redirect = Redirect::compute(
            &definition("Basket{0}", None),
            "GetBasket:7:SE:",
            &Basket { id: 7, owner: None },
        )
        .unwrap()
        .unwrap();

        assert_eq!(redirect.value, "7:SE:");
        assert_eq!(redirect.targets().collect::<Vec<_>>(), ["Basket7:SE:"]);
        assert_eq!(redirect.pointer, EntityKey("7:SE:".to_string()));
    }

    #[test]
    fn test_without_redirect_format() {
        let mut plain = definition("Basket{0}", Some("Id"));
        plain.redirect_format = None;
        let redirect =
            Redirect::compute(&plain, "GetBasket:1:", &Basket { id: 1, owner: None }).unwrap();
        assert_eq!(redirect, None);
    }
}
