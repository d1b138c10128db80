//! # Request Pacing Module
//!
//! The API enforces an undocumented request-rate limit that it only reveals
//! by rejecting requests with HTTP 429. This module holds the adaptive pacing
//! primitive the fetch engine uses to stay under that limit.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`DelayEstimator`] | Bisection estimator of the safe inter-request delay |
//! | [`DelayEstimatorConfig`] | Initial ceiling and tightening threshold |
//! | [`DelayEstimatorSnapshot`] | Point-in-time view of the bounds |
//!
//! ## Example
//!
//! ```rust
//! use bgg_fetch::resilience::{DelayEstimator, DelayEstimatorConfig};
//! use std::time::Duration;
//!
//! let estimator = DelayEstimator::new(DelayEstimatorConfig::default());
//!
//! // A rejection from the server: start pacing at half the initial guess.
//! estimator.fail();
//! assert_eq!(estimator.delay(), Duration::from_secs(5));
//! ```

pub mod delay_estimator;

pub use delay_estimator::{
    DelayEstimator, DelayEstimatorConfig, DelayEstimatorSnapshot, INITIAL_UPPER_BOUND,
    SUCCESS_THRESHOLD,
};
