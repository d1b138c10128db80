use crate::cache::ResponseCache;
use crate::client::core::FetchEngine;
use crate::client::policy::RetryPolicy;
use crate::config::FetchConfig;
use crate::resilience::{DelayEstimator, DelayEstimatorConfig};
use crate::transport::{HttpTransport, Transport};
use crate::Result;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Builder for [`FetchEngine`].
///
/// Anything not set explicitly is derived from the [`FetchConfig`]: the disk
/// cache from `cache_dir`, the HTTP transport from the timeout and proxy
/// settings, the retry and pacing parameters from their sections.
pub struct FetchEngineBuilder {
    config: FetchConfig,
    base_url_override: Option<String>,
    transport: Option<Arc<dyn Transport>>,
    cache: Option<ResponseCache>,
    retry: Option<RetryPolicy>,
    estimator_config: Option<DelayEstimatorConfig>,
    estimators: HashMap<String, Arc<DelayEstimator>>,
}

impl FetchEngineBuilder {
    pub fn new() -> Self {
        Self::from_config(FetchConfig::default())
    }

    pub fn from_config(config: FetchConfig) -> Self {
        Self {
            config,
            base_url_override: None,
            transport: None,
            cache: None,
            retry: None,
            estimator_config: None,
            estimators: HashMap::new(),
        }
    }

    /// Defaults with `BGG_*` environment overrides applied.
    pub fn from_env() -> Result<Self> {
        Ok(Self::from_config(FetchConfig::default().with_env_overrides()?))
    }

    /// Override the configured base URL.
    ///
    /// Mostly useful for pointing the engine at a mock server.
    pub fn base_url_override(mut self, base_url: impl Into<String>) -> Self {
        self.base_url_override = Some(base_url.into());
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn cache(mut self, cache: ResponseCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn no_cache(self) -> Self {
        self.cache(ResponseCache::disabled())
    }

    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    /// Parameters for estimators the engine creates on demand.
    pub fn estimator_config(mut self, cfg: DelayEstimatorConfig) -> Self {
        self.estimator_config = Some(cfg);
        self
    }

    /// Share an existing estimator for `resource_class`, e.g. between engines.
    pub fn estimator(
        mut self,
        resource_class: impl Into<String>,
        estimator: Arc<DelayEstimator>,
    ) -> Self {
        self.estimators.insert(resource_class.into(), estimator);
        self
    }

    pub fn build(self) -> Result<FetchEngine> {
        let mut config = self.config;
        if let Some(url) = self.base_url_override {
            config.base_url = url;
        }
        config.validate()?;

        let transport: Arc<dyn Transport> = match self.transport {
            Some(t) => t,
            None => Arc::new(HttpTransport::new(&config)?),
        };
        let cache = self.cache.unwrap_or_else(|| match &config.cache_dir {
            Some(dir) => ResponseCache::disk(dir.clone()),
            None => ResponseCache::disabled(),
        });
        let retry = self
            .retry
            .unwrap_or_else(|| RetryPolicy::from(&config.retry));
        let estimator_config = self
            .estimator_config
            .unwrap_or_else(|| config.pacing.estimator_config());

        Ok(FetchEngine {
            base_url: config.base_url,
            transport,
            cache,
            retry,
            estimator_config,
            estimators: Mutex::new(self.estimators),
        })
    }
}

impl Default for FetchEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
