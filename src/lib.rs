//! # bgg-fetch
//!
//! Rate-limit aware client for the BoardGameGeek XML API.
//!
//! ## Overview
//!
//! The API throttles aggressively and never says how fast is too fast, answers
//! with 502 under load, and occasionally returns truncated documents. This crate
//! wraps every request in the same engine so callers only see typed results:
//!
//! - **Adaptive pacing**: a per-resource [`resilience::DelayEstimator`] learns
//!   the safe request interval from 429 rejections
//! - **Retries**: one bounded attempt budget with exponential backoff
//! - **Caching**: gzip-compressed responses on disk via the [`cache`] module
//! - **Paging**: [`PageSequence`] walks paginated endpoints lazily
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bgg_fetch::{FetchEngine, PlaysRequest, ThingRequest};
//!
//! #[tokio::main]
//! async fn main() -> bgg_fetch::Result<()> {
//!     let engine = FetchEngine::builder().build()?;
//!
//!     let catan = ThingRequest::single(13).query_first(&engine).await?;
//!     println!("{:?}", catan.primary_name());
//!
//!     let plays = engine.plays(PlaysRequest::for_thing(13)).collect_items().await?;
//!     println!("{} plays logged", plays.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | Fetch engine, builder and retry policy |
//! | [`request`] | Typed request descriptions per endpoint |
//! | [`model`] | Records parsed from response documents |
//! | [`paging`] | Lazy iteration over paginated endpoints |
//! | [`cache`] | Response cache and its backends |
//! | [`resilience`] | Adaptive request pacing |
//! | [`transport`] | The transport seam and its HTTP implementation |
//! | [`config`] | File and environment configuration |

pub mod cache;
pub mod client;
pub mod config;
pub mod model;
pub mod paging;
pub mod request;
pub mod resilience;
pub mod transport;

// Re-export main types for convenience
pub use client::{FetchEngine, FetchEngineBuilder, FetchStats, RetryPolicy};
pub use config::FetchConfig;
pub use paging::{Page, PageSequence, Paged};
pub use request::{
    ApiVersion, FamilyRequest, GeekListRequest, PlaysRequest, RequestDescriptor, RequestSpec,
    SearchRequest, ThingFlag, ThingRequest,
};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

pub mod error;
pub use error::{Error, ErrorContext};
