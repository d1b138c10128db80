use super::{join_ids, ApiVersion, RequestSpec};
use crate::cache::CacheKey;
use crate::client::FetchEngine;
use crate::model::{parse_things, Thing};
use crate::{Error, ErrorContext, Result};
use roxmltree::Node;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeSet;

/// Optional sections of a thing response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThingFlag {
    /// Ratings, ranks and ownership counts.
    Stats,
    /// Published versions of the thing.
    Versions,
}

impl ThingFlag {
    pub fn as_param(self) -> &'static str {
        match self {
            ThingFlag::Stats => "stats",
            ThingFlag::Versions => "versions",
        }
    }
}

/// `thing` endpoint: games, expansions, accessories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThingRequest {
    ids: Vec<u64>,
    types: Vec<String>,
    flags: BTreeSet<ThingFlag>,
}

impl ThingRequest {
    pub fn new(ids: impl IntoIterator<Item = u64>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
            types: Vec::new(),
            flags: BTreeSet::new(),
        }
    }

    pub fn single(id: u64) -> Self {
        Self::new([id])
    }

    /// Restrict results to the given thing types, e.g. `boardgame`.
    pub fn of_types<S: Into<String>>(mut self, types: impl IntoIterator<Item = S>) -> Self {
        self.types = types.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_flag(mut self, flag: ThingFlag) -> Self {
        self.flags.insert(flag);
        self
    }

    pub fn ids(&self) -> &[u64] {
        &self.ids
    }

    /// Fetch a single-id request and return its only item.
    pub async fn query_first(&self, engine: &FetchEngine) -> Result<Thing> {
        if self.ids.len() != 1 {
            return Err(Error::validation_with_context(
                "query_first needs exactly one id",
                ErrorContext::new()
                    .with_field_path("id")
                    .with_details(format!("{} ids requested", self.ids.len())),
            ));
        }
        let items = engine.fetch(self).await?;
        exactly_one(items, "thing")
    }
}

pub(crate) fn exactly_one<T>(mut items: Vec<T>, what: &str) -> Result<T> {
    if items.len() != 1 {
        return Err(Error::malformed_with_context(
            format!("expected exactly one {} in the response", what),
            ErrorContext::new().with_details(format!("got {}", items.len())),
        ));
    }
    Ok(items.remove(0))
}

impl RequestSpec for ThingRequest {
    type Output = Vec<Thing>;

    fn resource_class(&self) -> &str {
        "thing"
    }

    fn api_version(&self) -> ApiVersion {
        ApiVersion::V2
    }

    fn path(&self) -> Cow<'_, str> {
        Cow::Borrowed("thing")
    }

    fn params(&self) -> Vec<(String, String)> {
        let mut params = vec![("id".to_string(), join_ids(&self.ids))];
        if !self.types.is_empty() {
            params.push(("type".to_string(), self.types.join(",")));
        }
        for flag in &self.flags {
            params.push((flag.as_param().to_string(), "1".to_string()));
        }
        params
    }

    /// Only single-id, unfiltered requests with at most one flag are cached;
    /// the remaining combinations overlap too much to key reliably.
    fn cache_key(&self) -> Option<CacheKey> {
        let [id] = self.ids.as_slice() else {
            return None;
        };
        if !self.types.is_empty() || self.flags.len() > 1 {
            return None;
        }
        let key = CacheKey::from_id(*id);
        match self.flags.iter().next() {
            Some(flag) => key.with_suffix(flag.as_param()).ok(),
            None => Some(key),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.ids.is_empty() {
            return Err(Error::validation_with_context(
                "thing request without ids",
                ErrorContext::new().with_field_path("id"),
            ));
        }
        Ok(())
    }

    fn parse(&self, root: Node<'_, '_>) -> Result<Vec<Thing>> {
        parse_things(root)
    }
}
