//! Engine configuration.
//!
//! Settings come from three layers, later ones winning: built-in defaults,
//! an optional YAML file, then `BGG_*` environment variables. Builders apply
//! explicit overrides on top.

use crate::resilience::DelayEstimatorConfig;
use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://boardgamegeek.com";
pub const DEFAULT_CACHE_DIR: &str = ".tmp/bggcache";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub base_url: String,
    /// `None` disables the on-disk cache.
    pub cache_dir: Option<PathBuf>,
    pub http_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub user_agent: String,
    pub proxy_url: Option<String>,
    pub retry: RetrySettings,
    pub pacing: PacingSettings,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            cache_dir: Some(PathBuf::from(DEFAULT_CACHE_DIR)),
            http_timeout_secs: 30,
            connect_timeout_secs: 10,
            user_agent: format!("bgg-fetch/{}", env!("CARGO_PKG_VERSION")),
            proxy_url: None,
            retry: RetrySettings::default(),
            pacing: PacingSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub base_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_backoff_ms: 1_000,
            max_backoff_ms: 60_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingSettings {
    pub initial_upper_bound_ms: u64,
    pub success_threshold: u32,
}

impl Default for PacingSettings {
    fn default() -> Self {
        let cfg = DelayEstimatorConfig::default();
        Self {
            initial_upper_bound_ms: cfg.initial_upper_bound.as_millis() as u64,
            success_threshold: cfg.success_threshold,
        }
    }
}

impl PacingSettings {
    pub fn estimator_config(&self) -> DelayEstimatorConfig {
        DelayEstimatorConfig::new()
            .with_initial_upper_bound(Duration::from_millis(self.initial_upper_bound_ms))
            .with_success_threshold(self.success_threshold)
    }
}

impl FetchConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| {
            Error::configuration_with_context(
                "invalid configuration document",
                ErrorContext::new()
                    .with_details(e.to_string())
                    .with_source("config_yaml"),
            )
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::configuration_with_context(
                format!("cannot read configuration file {}", path.display()),
                ErrorContext::new()
                    .with_details(e.to_string())
                    .with_source("config_file"),
            )
        })?;
        Self::from_yaml_str(&raw)
    }

    /// Defaults (or `path`, when given) with environment overrides applied.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let cfg = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        cfg.with_env_overrides()
    }

    /// Apply `BGG_BASE_URL`, `BGG_CACHE_DIR`, `BGG_HTTP_TIMEOUT_SECS`,
    /// `BGG_MAX_ATTEMPTS` and `BGG_PROXY_URL`.
    ///
    /// An empty `BGG_CACHE_DIR` disables the disk cache.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides_from(|name| env::var(name).ok())
    }

    fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(url) = lookup("BGG_BASE_URL") {
            self.base_url = url;
        }
        if let Some(dir) = lookup("BGG_CACHE_DIR") {
            self.cache_dir = if dir.is_empty() {
                None
            } else {
                Some(PathBuf::from(dir))
            };
        }
        if let Some(raw) = lookup("BGG_HTTP_TIMEOUT_SECS") {
            self.http_timeout_secs = parse_env("BGG_HTTP_TIMEOUT_SECS", &raw)?;
        }
        if let Some(raw) = lookup("BGG_MAX_ATTEMPTS") {
            self.retry.max_attempts = parse_env("BGG_MAX_ATTEMPTS", &raw)?;
        }
        if let Some(proxy) = lookup("BGG_PROXY_URL") {
            self.proxy_url = Some(proxy).filter(|p| !p.is_empty());
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.base_url).map_err(|e| {
            Error::configuration_with_context(
                "base_url is not a valid URL",
                ErrorContext::new()
                    .with_field_path("base_url")
                    .with_details(format!("{}: {}", self.base_url, e)),
            )
        })?;
        if self.retry.max_attempts == 0 {
            return Err(Error::configuration_with_context(
                "at least one attempt is required",
                ErrorContext::new().with_field_path("retry.max_attempts"),
            ));
        }
        if self.http_timeout_secs == 0 {
            return Err(Error::configuration_with_context(
                "HTTP timeout must be positive",
                ErrorContext::new().with_field_path("http_timeout_secs"),
            ));
        }
        Ok(())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|e| {
        Error::configuration_with_context(
            format!("invalid value for {}", name),
            ErrorContext::new()
                .with_field_path(name)
                .with_details(format!("{:?}: {}", raw, e)),
        )
    })
}
