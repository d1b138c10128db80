//! Response cache front end.

use super::backend::{CacheBackend, DiskCache, NullCache};
use super::key::{CacheKey, CacheLocation};
use crate::Result;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub writes: u64,
    /// Lookups and writes skipped because the request had no cache key.
    pub bypassed: u64,
    pub errors: u64,
}

impl CacheStats {
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Default)]
struct AtomicStats {
    hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
    bypassed: AtomicU64,
    errors: AtomicU64,
}

impl AtomicStats {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn to_stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            bypassed: self.bypassed.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

/// Per-request response cache.
///
/// Caching is an optimization only: an absent key turns both operations into
/// no-ops, and backend failures are logged and reported as misses.
pub struct ResponseCache {
    backend: Box<dyn CacheBackend>,
    stats: AtomicStats,
}

impl ResponseCache {
    pub fn new(backend: Box<dyn CacheBackend>) -> Self {
        Self {
            backend,
            stats: AtomicStats::default(),
        }
    }

    /// Gzip files below `root`.
    pub fn disk(root: impl Into<PathBuf>) -> Self {
        Self::new(Box::new(DiskCache::new(root)))
    }

    /// Never hits, never stores.
    pub fn disabled() -> Self {
        Self::new(Box::new(NullCache::new()))
    }

    fn locate(
        &self,
        resource_class: &str,
        subdir: Option<&str>,
        key: Option<&CacheKey>,
    ) -> Option<CacheLocation> {
        let Some(key) = key else {
            AtomicStats::bump(&self.stats.bypassed);
            return None;
        };
        match CacheLocation::new(resource_class, subdir.map(str::to_string), key.clone()) {
            Ok(loc) => Some(loc),
            Err(e) => {
                AtomicStats::bump(&self.stats.errors);
                warn!(resource_class, error = %e, "cache location rejected, caching skipped");
                None
            }
        }
    }

    pub async fn get(
        &self,
        resource_class: &str,
        subdir: Option<&str>,
        key: Option<&CacheKey>,
    ) -> Option<Vec<u8>> {
        let loc = self.locate(resource_class, subdir, key)?;
        match self.backend.get(&loc).await {
            Ok(Some(data)) => {
                AtomicStats::bump(&self.stats.hits);
                debug!(resource_class, key = %loc.key(), bytes = data.len(), "cache hit");
                Some(data)
            }
            Ok(None) => {
                AtomicStats::bump(&self.stats.misses);
                None
            }
            Err(e) => {
                AtomicStats::bump(&self.stats.errors);
                warn!(resource_class, key = %loc.key(), error = %e, "cache read failed, treating as miss");
                None
            }
        }
    }

    pub async fn put(
        &self,
        resource_class: &str,
        subdir: Option<&str>,
        key: Option<&CacheKey>,
        body: &[u8],
    ) {
        let Some(loc) = self.locate(resource_class, subdir, key) else {
            return;
        };
        match self.backend.put(&loc, body).await {
            Ok(()) => AtomicStats::bump(&self.stats.writes),
            Err(e) => {
                AtomicStats::bump(&self.stats.errors);
                warn!(resource_class, key = %loc.key(), error = %e, "cache write failed");
            }
        }
    }

    /// Keys and subdirectories cached for one resource class, sorted.
    pub async fn cached_keys(&self, resource_class: &str) -> Result<Vec<String>> {
        self.backend.keys(resource_class).await
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.to_stats()
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }
}
