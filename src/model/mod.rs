//! Typed records extracted from API documents.
//!
//! Parsers take the document's root node and fail with [`crate::Error::Malformed`]
//! when the root tag or a required attribute does not match. Sentinel values
//! are normalized on the way in: `""` and `"0"` ids become `None`, `"0"`/`"1"`
//! flags become `bool`, and the `0000-00-00` play date becomes `None`.

pub mod family;
pub mod geeklist;
pub mod plays;
pub mod search;
pub mod thing;
pub mod xml;

pub use family::{parse_families, FamilyItem, FamilyMember};
pub use geeklist::{parse_geeklist, GeekList, GeekListComment, GeekListItem};
pub use plays::{parse_plays_page, Play, PlayItem, Player, PlaysPage};
pub use search::{parse_search_results, SearchItem, SearchResults};
pub use thing::{parse_things, Link, Name, Poll, PollResult, PollResults, Rank, Ratings, Thing};
