//! Cache keys and on-disk locations.

use crate::{Error, ErrorContext, Result};
use std::fmt;
use std::path::PathBuf;

/// Identifies one cached response within a resource class.
///
/// A key is a single path component. Requests whose parameter space is
/// ambiguous return `None` instead of a key, which disables caching for them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        validate_component(&key, "cache key")?;
        Ok(Self(key))
    }

    /// Key for a single numeric id.
    pub fn from_id(id: u64) -> Self {
        Self(id.to_string())
    }

    /// Key for one page of a paginated resource, zero padded so listings sort.
    pub fn page(page: u32) -> Self {
        Self(format!("{:04}", page))
    }

    /// `{key}_{suffix}`, used to separate variants such as flags.
    pub fn with_suffix(&self, suffix: &str) -> Result<Self> {
        Self::new(format!("{}_{}", self.0, suffix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// `(resource class, optional subdirectory, key)` address of a cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheLocation {
    resource_class: String,
    subdir: Option<String>,
    key: CacheKey,
}

impl CacheLocation {
    pub fn new(
        resource_class: impl Into<String>,
        subdir: Option<String>,
        key: CacheKey,
    ) -> Result<Self> {
        let resource_class = resource_class.into();
        validate_component(&resource_class, "resource class")?;
        if let Some(dir) = &subdir {
            validate_component(dir, "cache subdirectory")?;
        }
        Ok(Self {
            resource_class,
            subdir,
            key,
        })
    }

    pub fn resource_class(&self) -> &str {
        &self.resource_class
    }

    pub fn subdir(&self) -> Option<&str> {
        self.subdir.as_deref()
    }

    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    /// Directory holding the entry, relative to the cache root.
    pub fn relative_dir(&self) -> PathBuf {
        let mut dir = PathBuf::from(&self.resource_class);
        if let Some(sub) = &self.subdir {
            dir.push(sub);
        }
        dir
    }
}

fn validate_component(value: &str, what: &str) -> Result<()> {
    let bad = value.is_empty()
        || value == "."
        || value == ".."
        || value.contains(['/', '\\', '\0']);
    if bad {
        return Err(Error::validation_with_context(
            format!("invalid {}", what),
            ErrorContext::new()
                .with_details(format!("{:?} is not a single path component", value))
                .with_source("cache_key"),
        ));
    }
    Ok(())
}
