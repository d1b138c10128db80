use super::{ApiVersion, RequestSpec};
use crate::model::{parse_search_results, SearchResults};
use crate::{Error, ErrorContext, Result};
use roxmltree::Node;
use std::borrow::Cow;

/// `search` endpoint. Free-text queries are never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    query: String,
    types: Vec<String>,
    exact: bool,
}

impl SearchRequest {
    /// Exact-match search; see [`SearchRequest::exact`].
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            types: Vec::new(),
            exact: true,
        }
    }

    pub fn of_types<S: Into<String>>(mut self, types: impl IntoIterator<Item = S>) -> Self {
        self.types = types.into_iter().map(Into::into).collect();
        self
    }

    pub fn exact(mut self, exact: bool) -> Self {
        self.exact = exact;
        self
    }
}

impl RequestSpec for SearchRequest {
    type Output = SearchResults;

    fn resource_class(&self) -> &str {
        "search"
    }

    fn api_version(&self) -> ApiVersion {
        ApiVersion::V2
    }

    fn path(&self) -> Cow<'_, str> {
        Cow::Borrowed("search")
    }

    fn params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if !self.types.is_empty() {
            params.push(("type".to_string(), self.types.join(",")));
        }
        params.push(("query".to_string(), self.query.clone()));
        if self.exact {
            params.push(("exact".to_string(), "1".to_string()));
        }
        params
    }

    fn validate(&self) -> Result<()> {
        if self.query.trim().is_empty() {
            return Err(Error::validation_with_context(
                "empty search query",
                ErrorContext::new().with_field_path("query"),
            ));
        }
        Ok(())
    }

    fn parse(&self, root: Node<'_, '_>) -> Result<SearchResults> {
        parse_search_results(root)
    }
}
