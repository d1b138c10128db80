use std::time::Duration;

/// Per-fetch bookkeeping, returned by [`crate::FetchEngine::fetch_with_stats`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchStats {
    /// Client-side correlation id, also attached to this fetch's log lines.
    pub request_id: String,
    pub resource_class: String,
    /// Physical network attempts; `0` when served from the cache.
    pub attempts: u32,
    pub from_cache: bool,
    pub elapsed: Duration,
}
