use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// First guess for the upper bound, used on the first rejection.
pub const INITIAL_UPPER_BOUND: Duration = Duration::from_secs(10);

/// Consecutive successes needed before the upper bound is tightened.
pub const SUCCESS_THRESHOLD: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelayEstimatorSnapshot {
    pub lower_bound: Duration,
    pub upper_bound: Duration,
    /// Current pacing delay, the midpoint of the bounds.
    pub delay: Duration,
    pub consecutive_successes: u32,
}

#[derive(Debug, Clone)]
pub struct DelayEstimatorConfig {
    pub initial_upper_bound: Duration,
    pub success_threshold: u32,
}

impl Default for DelayEstimatorConfig {
    fn default() -> Self {
        Self {
            initial_upper_bound: INITIAL_UPPER_BOUND,
            success_threshold: SUCCESS_THRESHOLD,
        }
    }
}

impl DelayEstimatorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_initial_upper_bound(mut self, bound: Duration) -> Self {
        self.initial_upper_bound = bound;
        self
    }

    pub fn with_success_threshold(mut self, threshold: u32) -> Self {
        self.success_threshold = threshold.max(1);
        self
    }
}

#[derive(Debug, Default)]
struct State {
    lower_bound: Duration,
    upper_bound: Duration,
    /// Start of the most recent (or already reserved) network attempt.
    last_attempt: Option<Instant>,
    consecutive_successes: u32,
}

impl State {
    fn delay(&self) -> Duration {
        (self.lower_bound + self.upper_bound) / 2
    }
}

/// Bisection estimator for the server's undisclosed safe request interval.
///
/// The server never tells us its limit, so the estimator keeps a lower and an
/// upper bound and paces requests at their midpoint:
/// - a rejection (`fail`) pushes the floor up to the current delay
/// - a run of successes (`success`) pulls the ceiling down to the current delay
///
/// `lower_bound <= upper_bound` holds after every operation. One instance is
/// shared (via `Arc`) by every fetch of the same resource class.
pub struct DelayEstimator {
    cfg: DelayEstimatorConfig,
    state: Mutex<State>,
}

impl DelayEstimator {
    pub fn new(cfg: DelayEstimatorConfig) -> Self {
        Self {
            cfg,
            state: Mutex::new(State::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // State stays consistent even if a holder panicked; every update is a single assignment.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Current pacing delay.
    pub fn delay(&self) -> Duration {
        self.lock().delay()
    }

    /// Wait until the current delay has passed since the previous attempt, then
    /// record this attempt. Call immediately before every network request.
    ///
    /// The attempt slot is reserved under the lock and the sleep happens outside
    /// it, so concurrent callers queue up one delay apart.
    pub async fn limit(&self) {
        let wait = {
            let mut st = self.lock();
            let now = Instant::now();
            let delay = st.delay();
            let wait = match st.last_attempt {
                Some(last) => (last + delay).saturating_duration_since(now),
                None => Duration::ZERO,
            };
            st.last_attempt = Some(now + wait);
            wait
        };

        if !wait.is_zero() {
            debug!(wait_ms = wait.as_millis() as u64, "pacing request");
            tokio::time::sleep(wait).await;
        }
    }

    /// Record an HTTP 200 that came from the network.
    pub fn success(&self) {
        let mut st = self.lock();
        st.consecutive_successes = st.consecutive_successes.saturating_add(1);
        if st.consecutive_successes >= self.cfg.success_threshold {
            st.consecutive_successes = 0;
            st.upper_bound = st.delay();
            debug!(
                lower_ms = st.lower_bound.as_millis() as u64,
                upper_ms = st.upper_bound.as_millis() as u64,
                "tightened delay ceiling"
            );
        }
    }

    /// Record an HTTP 429 rejection.
    pub fn fail(&self) {
        let mut st = self.lock();
        st.consecutive_successes = 0;
        st.last_attempt = None;
        if st.upper_bound.is_zero() {
            st.upper_bound = self.cfg.initial_upper_bound;
        } else {
            st.lower_bound = st.delay();
        }
        debug!(
            lower_ms = st.lower_bound.as_millis() as u64,
            upper_ms = st.upper_bound.as_millis() as u64,
            "raised delay floor"
        );
    }

    pub fn snapshot(&self) -> DelayEstimatorSnapshot {
        let st = self.lock();
        DelayEstimatorSnapshot {
            lower_bound: st.lower_bound,
            upper_bound: st.upper_bound,
            delay: st.delay(),
            consecutive_successes: st.consecutive_successes,
        }
    }
}

impl Default for DelayEstimator {
    fn default() -> Self {
        Self::new(DelayEstimatorConfig::default())
    }
}
