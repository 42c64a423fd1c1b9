//! Cache key construction
//!
//! Keys have the shape `<item>:<arg1>:<arg2>:...:`. The item name (usually
//! the name of the operation producing the value) is everything before the
//! first separator, and it is what per-operation policy is looked up by.
//! A missing argument is written as `NULL`, which makes it indistinguishable
//! from the literal string `"NULL"`.

use std::fmt::{self, Display, Write as _};

/// Separator between key segments
pub const SEPARATOR: char = ':';

/// Placeholder written for missing arguments
pub const NULL_ARGUMENT: &str = "NULL";

/// Incremental builder for cache keys
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    buf: String,
}

impl CacheKey {
    /// Start a key for `item_name`
    pub fn new(item_name: &str) -> Self {
        let mut buf = String::with_capacity(item_name.len() + 16);
        buf.push_str(item_name);
        buf.push(SEPARATOR);
        Self { buf }
    }

    /// Append one argument
    pub fn arg(mut self, value: impl Display) -> Self {
        // Writing into a String cannot fail
        let _ = write!(self.buf, "{value}");
        self.buf.push(SEPARATOR);
        self
    }

    /// Append an optional argument, writing `NULL` for `None`
    pub fn arg_opt<T: Display>(self, value: Option<T>) -> Self {
        match value {
            Some(value) => self.arg(value),
            None => self.null(),
        }
    }

    /// Append a missing argument
    pub fn null(mut self) -> Self {
        self.buf.push_str(NULL_ARGUMENT);
        self.buf.push(SEPARATOR);
        self
    }

    /// Finish the key
    pub fn finish(self) -> String {
        self.buf
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.buf)
    }
}

impl From<CacheKey> for String {
    fn from(key: CacheKey) -> Self {
        key.finish()
    }
}

/// Build a key from an item name and displayable arguments
pub fn get_key(item_name: &str, args: &[&dyn Display]) -> String {
    args.iter()
        .fold(CacheKey::new(item_name), |key, arg| key.arg(arg))
        .finish()
}

/// Build a cache key from an item name and any number of arguments
///
/// ```
/// let key = cachet_cache::cache_key!("GetBasket", 1, "SE");
/// assert_eq!(key, "GetBasket:1:SE:");
/// ```
#[macro_export]
macro_rules! cache_key {
    ($item:expr $(, $arg:expr)* $(,)?) => {
        $crate::keys::CacheKey::new($item)$(.arg(&$arg))*.finish()
    };
}

/// The item name a key was built for: everything before the first separator
pub fn item_name(key: &str) -> &str {
    match key.find(SEPARATOR) {
        Some(end) => &key[..end],
        None => key,
    }
}

/// The key with its item name and the following separator removed
///
/// Keys without an item name are returned unchanged.
pub fn strip_item_name(key: &str) -> &str {
    let item = item_name(key);
    if item.is_empty() {
        return key;
    }
    key.get(item.len() + SEPARATOR.len_utf8()..).unwrap_or("")
}
