use super::thing::exactly_one;
use super::{join_ids, ApiVersion, RequestSpec};
use crate::client::FetchEngine;
use crate::model::{parse_families, FamilyItem};
use crate::{Error, ErrorContext, Result};
use roxmltree::Node;
use std::borrow::Cow;

/// `family` endpoint. Never cached: family membership changes as things are
/// added, and stale member lists would silently drop games.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyRequest {
    ids: Vec<u64>,
    types: Vec<String>,
}

impl FamilyRequest {
    pub fn new(ids: impl IntoIterator<Item = u64>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
            types: Vec::new(),
        }
    }

    pub fn single(id: u64) -> Self {
        Self::new([id])
    }

    pub fn of_types<S: Into<String>>(mut self, types: impl IntoIterator<Item = S>) -> Self {
        self.types = types.into_iter().map(Into::into).collect();
        self
    }

    pub async fn query_first(&self, engine: &FetchEngine) -> Result<FamilyItem> {
        if self.ids.len() != 1 {
            return Err(Error::validation_with_context(
                "query_first needs exactly one id",
                ErrorContext::new()
                    .with_field_path("id")
                    .with_details(format!("{} ids requested", self.ids.len())),
            ));
        }
        let items = engine.fetch(self).await?;
        exactly_one(items, "family")
    }
}

impl RequestSpec for FamilyRequest {
    type Output = Vec<FamilyItem>;

    fn resource_class(&self) -> &str {
        "family"
    }

    fn api_version(&self) -> ApiVersion {
        ApiVersion::V2
    }

    fn path(&self) -> Cow<'_, str> {
        Cow::Borrowed("family")
    }

    fn params(&self) -> Vec<(String, String)> {
        let mut params = vec![("id".to_string(), join_ids(&self.ids))];
        if !self.types.is_empty() {
            params.push(("type".to_string(), self.types.join(",")));
        }
        params
    }

    fn validate(&self) -> Result<()> {
        if self.ids.is_empty() {
            return Err(Error::validation_with_context(
                "family request without ids",
                ErrorContext::new().with_field_path("id"),
            ));
        }
        Ok(())
    }

    fn parse(&self, root: Node<'_, '_>) -> Result<Vec<FamilyItem>> {
        parse_families(root)
    }
}
