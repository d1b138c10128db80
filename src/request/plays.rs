use super::{ApiVersion, RequestSpec};
use crate::cache::CacheKey;
use crate::model::{parse_plays_page, PlaysPage};
use crate::{Error, ErrorContext, Result};
use chrono::NaiveDate;
use roxmltree::Node;
use std::borrow::Cow;

/// One page of the `plays` endpoint.
///
/// Pages start at 1. Only requests filtered by thing id alone are cached, under
/// `plays/{id}/{page:04}`; any other filter combination bypasses the cache so
/// differently filtered logs of the same game never share an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaysRequest {
    username: Option<String>,
    thing_id: Option<u64>,
    thing_type: Option<String>,
    subtype: Option<String>,
    min_date: Option<NaiveDate>,
    max_date: Option<NaiveDate>,
    page: u32,
}

impl PlaysRequest {
    /// Empty filter; at least a username or a thing id must be set before fetching.
    pub fn new() -> Self {
        Self {
            username: None,
            thing_id: None,
            thing_type: None,
            subtype: None,
            min_date: None,
            max_date: None,
            page: 1,
        }
    }

    pub fn for_thing(id: u64) -> Self {
        Self::new().thing(id)
    }

    pub fn for_user(username: impl Into<String>) -> Self {
        Self::new().username(username)
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn thing(mut self, id: u64) -> Self {
        self.thing_id = Some(id);
        self
    }

    /// `thing` or `family`.
    pub fn thing_type(mut self, kind: impl Into<String>) -> Self {
        self.thing_type = Some(kind.into());
        self
    }

    pub fn subtype(mut self, subtype: impl Into<String>) -> Self {
        self.subtype = Some(subtype.into());
        self
    }

    pub fn min_date(mut self, date: NaiveDate) -> Self {
        self.min_date = Some(date);
        self
    }

    pub fn max_date(mut self, date: NaiveDate) -> Self {
        self.max_date = Some(date);
        self
    }

    /// Same filter, different page.
    pub fn at_page(&self, page: u32) -> Self {
        Self {
            page,
            ..self.clone()
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn thing_id(&self) -> Option<u64> {
        self.thing_id
    }

    fn filtered_by_thing_only(&self) -> Option<u64> {
        let only_thing = self.username.is_none()
            && self.thing_type.is_none()
            && self.subtype.is_none()
            && self.min_date.is_none()
            && self.max_date.is_none();
        self.thing_id.filter(|_| only_thing)
    }
}

impl Default for PlaysRequest {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestSpec for PlaysRequest {
    type Output = PlaysPage;

    fn resource_class(&self) -> &str {
        "plays"
    }

    fn api_version(&self) -> ApiVersion {
        ApiVersion::V2
    }

    fn path(&self) -> Cow<'_, str> {
        Cow::Borrowed("plays")
    }

    fn params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(user) = &self.username {
            params.push(("username".to_string(), user.clone()));
        }
        if let Some(id) = self.thing_id {
            params.push(("id".to_string(), id.to_string()));
        }
        if let Some(kind) = &self.thing_type {
            params.push(("type".to_string(), kind.clone()));
        }
        if let Some(date) = self.min_date {
            params.push(("mindate".to_string(), date.format("%Y-%m-%d").to_string()));
        }
        if let Some(date) = self.max_date {
            params.push(("maxdate".to_string(), date.format("%Y-%m-%d").to_string()));
        }
        if let Some(subtype) = &self.subtype {
            params.push(("subtype".to_string(), subtype.clone()));
        }
        params.push(("page".to_string(), self.page.to_string()));
        params
    }

    fn cache_key(&self) -> Option<CacheKey> {
        self.filtered_by_thing_only()
            .map(|_| CacheKey::page(self.page))
    }

    fn cache_subdir(&self) -> Option<String> {
        self.filtered_by_thing_only().map(|id| id.to_string())
    }

    fn validate(&self) -> Result<()> {
        if self.username.is_none() && self.thing_id.is_none() {
            return Err(Error::validation_with_context(
                "either a username or a thing id is required to query plays",
                ErrorContext::new().with_field_path("username|id"),
            ));
        }
        if self.page == 0 {
            return Err(Error::validation_with_context(
                "pages start at 1",
                ErrorContext::new().with_field_path("page"),
            ));
        }
        Ok(())
    }

    fn parse(&self, root: Node<'_, '_>) -> Result<PlaysPage> {
        parse_plays_page(root)
    }
}
