use super::{ApiVersion, RequestSpec};
use crate::cache::CacheKey;
use crate::model::{parse_geeklist, GeekList};
use crate::Result;
use roxmltree::Node;
use std::borrow::Cow;

/// `geeklist/{id}` on the v1 API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeekListRequest {
    id: u64,
    comments: bool,
}

impl GeekListRequest {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            comments: false,
        }
    }

    pub fn with_comments(mut self, comments: bool) -> Self {
        self.comments = comments;
        self
    }
}

impl RequestSpec for GeekListRequest {
    type Output = GeekList;

    fn resource_class(&self) -> &str {
        "geeklist"
    }

    fn api_version(&self) -> ApiVersion {
        ApiVersion::V1
    }

    fn path(&self) -> Cow<'_, str> {
        Cow::Owned(format!("geeklist/{}", self.id))
    }

    fn params(&self) -> Vec<(String, String)> {
        if self.comments {
            vec![("comments".to_string(), "1".to_string())]
        } else {
            Vec::new()
        }
    }

    fn cache_key(&self) -> Option<CacheKey> {
        let key = CacheKey::from_id(self.id);
        if self.comments {
            key.with_suffix("comments").ok()
        } else {
            Some(key)
        }
    }

    fn parse(&self, root: Node<'_, '_>) -> Result<GeekList> {
        parse_geeklist(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_and_keys() {
        let plain = GeekListRequest::new(266367);
        assert_eq!(plain.path(), "geeklist/266367");
        assert_eq!(plain.api_version(), ApiVersion::V1);
        assert!(plain.params().is_empty());
        assert_eq!(plain.cache_key().unwrap().as_str(), "266367");

        let commented = plain.with_comments(true);
        assert_eq!(commented.params(), vec![("comments".to_string(), "1".to_string())]);
        assert_eq!(commented.cache_key().unwrap().as_str(), "266367_comments");
    }
}
