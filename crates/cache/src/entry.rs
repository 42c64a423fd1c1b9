//! Values as they travel between the manager and a store

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Type-erased value held by a store
pub type SharedValue = Arc<dyn Any + Send + Sync>;

/// What a store holds under a key
///
/// `Null` records that a computation produced nothing, so that "cached as
/// empty" can be told apart from "not cached".
#[derive(Clone)]
pub enum CachedValue {
    Null,
    Value(SharedValue),
}

impl CachedValue {
    /// Wrap an optional value, mapping `None` to [`CachedValue::Null`]
    pub fn from_option<T: Any + Send + Sync>(value: Option<T>) -> Self {
        match value {
            Some(value) => Self::Value(Arc::new(value)),
            None => Self::Null,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Borrow the payload as `T`, if it is one
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Self::Null => None,
            Self::Value(value) => value.downcast_ref::<T>(),
        }
    }
}

impl fmt::Debug for CachedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Value(_) => f.write_str("Value(..)"),
        }
    }
}

/// Pointer stored under a canonical key when its operation redirects
///
/// The pointer holds the redirect value (for example an entity id), which is
/// turned back into the derived key on lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityKey(pub String);

/// Outcome of a cache lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cached<T> {
    /// Nothing is cached under the key
    Miss,
    /// An empty result is cached under the key
    Null,
    /// A value is cached under the key
    Hit(T),
}

impl<T> Cached<T> {
    /// Whether the lookup found an entry, including a cached empty result
    pub fn is_found(&self) -> bool {
        !matches!(self, Self::Miss)
    }

    pub fn is_miss(&self) -> bool {
        matches!(self, Self::Miss)
    }

    /// The cached value, or `None` for both misses and cached empties
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Hit(value) => Some(value),
            Self::Null | Self::Miss => None,
        }
    }

    pub fn as_ref(&self) -> Cached<&T> {
        match self {
            Self::Miss => Cached::Miss,
            Self::Null => Cached::Null,
            Self::Hit(value) => Cached::Hit(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_is_distinct() {
        assert!(CachedValue::from_option(None::<u32>).is_null());
        let value = CachedValue::from_option(Some(5u32));
        assert!(!value.is_null());
        assert_eq!(value.downcast_ref::<u32>(), Some(&5));
        assert_eq!(value.downcast_ref::<String>(), None);
    }

    #[test]
    fn test_cached_outcomes() {
        assert!(!Cached::<u32>::Miss.is_found());
        assert!(Cached::<u32>::Null.is_found());
        assert_eq!(Cached::<u32>::Null.into_option(), None);
        assert_eq!(Cached::Hit(3).into_option(), Some(3));
        assert_eq!(Cached::Hit(3).as_ref(), Cached::Hit(&3));
    }
}
