//! The fetch engine: cache lookup, pacing, one GET per attempt, retries.
//!
//! Implementation details are split into submodules under `src/client/`.

pub mod builder;
pub mod core;
mod execution;
mod policy;
pub mod types;

pub use builder::FetchEngineBuilder;
pub use core::FetchEngine;
pub use policy::RetryPolicy;
pub use types::FetchStats;

