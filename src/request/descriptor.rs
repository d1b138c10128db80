use super::{ApiVersion, RequestSpec};
use crate::cache::CacheKey;
use crate::Result;
use roxmltree::Node;
use std::borrow::Cow;
use std::fmt;

type Builder<T> = Box<dyn Fn(Node<'_, '_>) -> Result<T> + Send + Sync>;

/// Ad-hoc request: every part supplied by the caller, the response built by
/// a closure.
///
/// ```rust
/// use bgg_fetch::request::{ApiVersion, RequestDescriptor};
/// use bgg_fetch::model::xml::parse_attr;
///
/// let hot = RequestDescriptor::new("hot", ApiVersion::V2, "hot", |root| {
///     parse_attr::<u32>(root, "total")
/// })
/// .param("type", "boardgame");
/// # let _ = hot;
/// ```
pub struct RequestDescriptor<T> {
    resource_class: String,
    api_version: ApiVersion,
    path: String,
    params: Vec<(String, String)>,
    cache_key: Option<CacheKey>,
    cache_subdir: Option<String>,
    builder: Builder<T>,
}

impl<T> RequestDescriptor<T> {
    pub fn new<F>(
        resource_class: impl Into<String>,
        api_version: ApiVersion,
        path: impl Into<String>,
        builder: F,
    ) -> Self
    where
        F: Fn(Node<'_, '_>) -> Result<T> + Send + Sync + 'static,
    {
        Self {
            resource_class: resource_class.into(),
            api_version,
            path: path.into(),
            params: Vec::new(),
            cache_key: None,
            cache_subdir: None,
            builder: Box::new(builder),
        }
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    pub fn with_cache_key(mut self, key: CacheKey) -> Self {
        self.cache_key = Some(key);
        self
    }

    pub fn with_cache_subdir(mut self, subdir: impl Into<String>) -> Self {
        self.cache_subdir = Some(subdir.into());
        self
    }
}

impl<T> fmt::Debug for RequestDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestDescriptor")
            .field("resource_class", &self.resource_class)
            .field("api_version", &self.api_version)
            .field("path", &self.path)
            .field("params", &self.params)
            .field("cache_key", &self.cache_key)
            .field("cache_subdir", &self.cache_subdir)
            .finish_non_exhaustive()
    }
}

impl<T: Send> RequestSpec for RequestDescriptor<T> {
    type Output = T;

    fn resource_class(&self) -> &str {
        &self.resource_class
    }

    fn api_version(&self) -> ApiVersion {
        self.api_version
    }

    fn path(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.path)
    }

    fn params(&self) -> Vec<(String, String)> {
        self.params.clone()
    }

    fn cache_key(&self) -> Option<CacheKey> {
        self.cache_key.clone()
    }

    fn cache_subdir(&self) -> Option<String> {
        self.cache_subdir.clone()
    }

    fn parse(&self, root: Node<'_, '_>) -> Result<T> {
        (self.builder)(root)
    }
}
