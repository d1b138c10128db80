//! Request descriptions consumed by [`crate::FetchEngine`].
//!
//! A request knows where it goes, which parameters it sends, whether (and
//! where) its response may be cached, and how to turn the response document
//! into a typed value. The engine owns everything else: pacing, retries and
//! the cache itself.
//!
//! | Request | API | Path | Cached as |
//! |---------|-----|------|-----------|
//! | [`ThingRequest`] | v2 | `thing` | `thing/{id}[_{flag}]`, single id only |
//! | [`FamilyRequest`] | v2 | `family` | never |
//! | [`SearchRequest`] | v2 | `search` | never |
//! | [`PlaysRequest`] | v2 | `plays` | `plays/{id}/{page:04}`, thing filter only |
//! | [`GeekListRequest`] | v1 | `geeklist/{id}` | `geeklist/{id}[_comments]` |
//! | [`RequestDescriptor`] | any | any | caller supplied |

mod descriptor;
pub mod family;
pub mod geeklist;
pub mod plays;
pub mod search;
pub mod thing;

pub use descriptor::RequestDescriptor;
pub use family::FamilyRequest;
pub use geeklist::GeekListRequest;
pub use plays::PlaysRequest;
pub use search::SearchRequest;
pub use thing::{ThingFlag, ThingRequest};

use crate::cache::CacheKey;
use crate::Result;
use roxmltree::Node;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// XML API generation; selects the URL segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApiVersion {
    V1,
    V2,
}

impl ApiVersion {
    pub fn segment(self) -> &'static str {
        match self {
            ApiVersion::V1 => "xmlapi",
            ApiVersion::V2 => "xmlapi2",
        }
    }
}

/// One logical API request.
pub trait RequestSpec: Send + Sync {
    type Output: Send;

    /// Groups requests for pacing and names their cache directory.
    fn resource_class(&self) -> &str;

    fn api_version(&self) -> ApiVersion;

    /// Path below the API segment, without a leading slash.
    fn path(&self) -> Cow<'_, str>;

    /// Query parameters, in the order they are sent.
    fn params(&self) -> Vec<(String, String)>;

    /// `None` disables caching for this request.
    fn cache_key(&self) -> Option<CacheKey> {
        None
    }

    fn cache_subdir(&self) -> Option<String> {
        None
    }

    /// Reject requests that cannot be sent. Runs before the cache lookup.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Build the result from the response's root element.
    fn parse(&self, root: Node<'_, '_>) -> Result<Self::Output>;
}

pub(crate) fn join_ids(ids: &[u64]) -> String {
    ids.iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
