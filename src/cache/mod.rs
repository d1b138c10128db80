//! # Response Caching Module
//!
//! Persists raw response bodies so repeated requests for the same resource
//! skip the network, and with it the rate limiter.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`ResponseCache`] | Front end used by the fetch engine, with statistics |
//! | [`CacheBackend`] | Trait for storage backends |
//! | [`DiskCache`] | Gzip files in a per-resource-class directory tree |
//! | [`MemoryCache`] | In-process map, for tests |
//! | [`NullCache`] | No-op backend for disabling caching |
//! | [`CacheKey`] | Validated key of one cached response |
//!
//! ## Layout
//!
//! ```text
//! <cache-root>/<resource-class>/[<subdir>/]<key>.xml.gz
//! ```
//!
//! Requests decide their own key. A request whose parameters do not map onto
//! a stable key (batch ids, free-text search, filter combinations) has no key
//! and is never cached.
//!
//! ## Example
//!
//! ```rust,no_run
//! use bgg_fetch::cache::{CacheKey, ResponseCache};
//!
//! # async fn demo() {
//! let cache = ResponseCache::disk(".tmp/bggcache");
//! let key = CacheKey::from_id(174430);
//! cache.put("thing", None, Some(&key), b"<items/>").await;
//! assert!(cache.get("thing", None, Some(&key)).await.is_some());
//! # }
//! ```

mod backend;
mod key;
mod manager;

pub use backend::{CacheBackend, DiskCache, MemoryCache, NullCache, CACHE_FILE_SUFFIX};
pub use key::{CacheKey, CacheLocation};
pub use manager::{CacheStats, ResponseCache};
