use super::policy::{parse_document, RetryPolicy};
use super::types::FetchStats;
use crate::cache::ResponseCache;
use crate::paging::{PageSequence, Paged};
use crate::request::{PlaysRequest, RequestSpec};
use crate::resilience::{DelayEstimator, DelayEstimatorConfig, DelayEstimatorSnapshot};
use crate::transport::Transport;
use crate::{Error, ErrorContext, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};
use url::Url;
use uuid::Uuid;

/// Fetches typed API responses through the cache, the pacing estimator and
/// the retry loop.
///
/// One estimator exists per resource class, created on first use (or injected
/// through the builder) and shared by every fetch of that class for the life
/// of the engine.
pub struct FetchEngine {
    pub(crate) base_url: String,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) cache: ResponseCache,
    pub(crate) retry: RetryPolicy,
    pub(crate) estimator_config: DelayEstimatorConfig,
    pub(crate) estimators: Mutex<HashMap<String, Arc<DelayEstimator>>>,
}

impl FetchEngine {
    pub fn builder() -> super::FetchEngineBuilder {
        super::FetchEngineBuilder::new()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Estimator for `resource_class`, created on first use.
    pub fn estimator(&self, resource_class: &str) -> Arc<DelayEstimator> {
        let mut map = self.estimators.lock().unwrap_or_else(|p| p.into_inner());
        map.entry(resource_class.to_string())
            .or_insert_with(|| Arc::new(DelayEstimator::new(self.estimator_config.clone())))
            .clone()
    }

    /// Current bounds of an estimator, if that class has been used.
    pub fn estimator_snapshot(&self, resource_class: &str) -> Option<DelayEstimatorSnapshot> {
        let map = self.estimators.lock().unwrap_or_else(|p| p.into_inner());
        map.get(resource_class).map(|e| e.snapshot())
    }

    /// `{base}/{xmlapi|xmlapi2}/{path}`.
    pub fn url_for<R: RequestSpec>(&self, spec: &R) -> Result<Url> {
        let raw = format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            spec.api_version().segment(),
            spec.path().trim_start_matches('/')
        );
        Url::parse(&raw).map_err(|e| {
            Error::configuration_with_context(
                "cannot build request URL",
                ErrorContext::new()
                    .with_details(format!("{}: {}", raw, e))
                    .with_source("url_for"),
            )
        })
    }

    /// Fetch and parse one request.
    pub async fn fetch<R: RequestSpec>(&self, spec: &R) -> Result<R::Output> {
        self.fetch_with_stats(spec).await.map(|(value, _)| value)
    }

    /// Like [`FetchEngine::fetch`], also reporting how the value was obtained.
    pub async fn fetch_with_stats<R: RequestSpec>(
        &self,
        spec: &R,
    ) -> Result<(R::Output, FetchStats)> {
        spec.validate()?;

        let started = tokio::time::Instant::now();
        let request_id = Uuid::new_v4().to_string();
        let resource_class = spec.resource_class();
        let key = spec.cache_key();
        let subdir = spec.cache_subdir();

        if let Some(body) = self
            .cache
            .get(resource_class, subdir.as_deref(), key.as_ref())
            .await
        {
            match parse_document(&body, |root| spec.parse(root)) {
                Ok(value) => {
                    let stats = FetchStats {
                        request_id,
                        resource_class: resource_class.to_string(),
                        attempts: 0,
                        from_cache: true,
                        elapsed: started.elapsed(),
                    };
                    return Ok((value, stats));
                }
                Err(e) => warn!(
                    request_id = request_id.as_str(),
                    resource_class,
                    error = %e,
                    "cached response unusable, fetching from network"
                ),
            }
        }

        let url = self.url_for(spec)?;
        let params = spec.params();
        let estimator = self.estimator(resource_class);
        let max_attempts = self.retry.max_attempts;

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self
                .execute_once(spec, &url, &params, &estimator, &request_id)
                .await
            {
                Ok((value, body)) => {
                    self.cache
                        .put(resource_class, subdir.as_deref(), key.as_ref(), &body)
                        .await;
                    let elapsed = started.elapsed();
                    info!(
                        request_id = request_id.as_str(),
                        resource_class,
                        attempt,
                        duration_ms = elapsed.as_millis() as u64,
                        "fetch succeeded"
                    );
                    let stats = FetchStats {
                        request_id,
                        resource_class: resource_class.to_string(),
                        attempts: attempt,
                        from_cache: false,
                        elapsed,
                    };
                    return Ok((value, stats));
                }
                Err(e) if e.is_retryable() => {
                    if attempt >= max_attempts {
                        warn!(
                            request_id = request_id.as_str(),
                            resource_class,
                            attempts = attempt,
                            error = %e,
                            "giving up"
                        );
                        return Err(Error::RetriesExhausted {
                            attempts: attempt,
                            source: Box::new(e),
                        });
                    }
                    let delay = self.retry.backoff(attempt - 1);
                    warn!(
                        request_id = request_id.as_str(),
                        resource_class,
                        attempt,
                        error_class = e.class(),
                        error = %e,
                        delay_ms = delay.as_millis() as u64,
                        "attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Lazily walk pages 1, 2, 3, … of the request built by `factory`.
    pub fn pages<R, F>(&self, factory: F) -> PageSequence<'_, R, F>
    where
        R: RequestSpec,
        R::Output: Paged,
        F: FnMut(u32) -> R,
    {
        PageSequence::new(self, factory)
    }

    /// Every page of a plays query.
    pub fn plays(
        &self,
        query: PlaysRequest,
    ) -> PageSequence<'_, PlaysRequest, impl FnMut(u32) -> PlaysRequest> {
        self.pages(move |page| query.at_page(page))
    }
}
