use super::descriptor::ItemDescriptor;
use super::format::KeyFormat;
use super::property::PropertyPath;
use crate::errors::{CacheError, RecoveryHint, Result};
use std::time::Duration;

/// Cache policy for one operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheDefinition {
    pub name: String,
    /// Jittered duration; zero means the operation is not cached
    pub duration: Duration,
    pub redirect_format: Option<KeyFormat>,
    pub property_path: Option<PropertyPath>,
    pub argument_name: Option<String>,
    pub refresh_format: Option<KeyFormat>,
}

/// Where a redirecting operation takes its redirect value from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectSource<'a> {
    /// A field of the cached value, formatted into the redirect format
    Property(&'a PropertyPath),
    /// The key itself minus its item name; the caller already formatted it
    /// into the redirect format, so it is used as-is
    ArgumentKey,
    /// The raw key arguments, formatted into the redirect format
    KeyArguments,
}

impl CacheDefinition {
    /// Compile a descriptor item
    ///
    /// `jitter` is applied to the explicit or inherited duration.
    pub(crate) fn compile(
        cache: &str,
        item: ItemDescriptor,
        default_duration: Duration,
        jitter: impl Fn(Duration) -> Duration,
    ) -> Result<Self> {
        let invalid = |reason: String| CacheError::InvalidDefinition {
            cache: cache.to_string(),
            item: item.name.clone(),
            reason,
            recovery_hint: RecoveryHint::UpdateConfiguration,
        };

        if item.name.trim().is_empty() {
            return Err(invalid("item name is empty".to_string()));
        }

        let base = item
            .duration
            .map(Duration::from_secs)
            .unwrap_or(default_duration);

        let redirect_format = non_blank(&item.redirect_format)
            .map(KeyFormat::parse)
            .transpose()
            .map_err(&invalid)?;
        let refresh_format = non_blank(&item.refresh_format)
            .map(KeyFormat::parse)
            .transpose()
            .map_err(&invalid)?;
        let property_path = non_blank(&item.property_path)
            .map(PropertyPath::parse)
            .transpose()
            .map_err(&invalid)?;
        let argument_name = non_blank(&item.argument_name).map(str::to_string);

        if property_path.is_some() && argument_name.is_some() {
            return Err(invalid(
                "propertyPath and argumentName are mutually exclusive".to_string(),
            ));
        }

        Ok(Self {
            duration: jitter(base),
            name: item.name.clone(),
            redirect_format,
            property_path,
            argument_name,
            refresh_format,
        })
    }

    pub fn is_cacheable(&self) -> bool {
        !self.duration.is_zero()
    }

    /// How the redirect value is obtained, if the operation redirects
    pub fn redirect_source(&self) -> Option<RedirectSource<'_>> {
        self.redirect_format.as_ref()?;
        match (&self.property_path, &self.argument_name) {
            (Some(path), _) => Some(RedirectSource::Property(path)),
            (None, Some(_)) => Some(RedirectSource::ArgumentKey),
            (None, None) => Some(RedirectSource::KeyArguments),
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}
