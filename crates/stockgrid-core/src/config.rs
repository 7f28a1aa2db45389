//! Client configuration loaded from the environment.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `POLYGON_API_KEY` | required | Bearer token for the upstream API |
//! | `STOCKGRID_BASE_URL` | `https://api.polygon.io` | Upstream base URL |
//! | `STOCKGRID_MIN_INTERVAL_MS` | `2000` | Spacing between any two requests |
//! | `STOCKGRID_CHART_MIN_INTERVAL_MS` | `12000` | Spacing between two chart requests |
//! | `STOCKGRID_TIMEOUT_MS` | unset | Opt-in per-request transport timeout |
//! | `STOCKGRID_MAX_RETRIES` | `3` | Retries after the first attempt |

use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::cache::CacheMode;
use crate::http_client::ApiKey;
use crate::retry::RetryConfig;
use crate::throttling::RateLimitConfig;

pub const DEFAULT_BASE_URL: &str = "https://api.polygon.io";
pub const API_KEY_VAR: &str = "POLYGON_API_KEY";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{API_KEY_VAR} is not set")]
    MissingApiKey,
    #[error("invalid value for {name}: '{value}'")]
    InvalidValue { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub api_key: ApiKey,
    pub base_url: String,
    pub rate_limit: RateLimitConfig,
    pub listing_ttl: Duration,
    pub details_ttl: Duration,
    pub history_ttl: Duration,
    pub page_size: u32,
    /// `None` leaves requests bounded only by the transport's own defaults.
    pub timeout: Option<Duration>,
    pub retry: RetryConfig,
    pub cache_mode: CacheMode,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: ApiKey::new(api_key),
            base_url: String::from(DEFAULT_BASE_URL),
            rate_limit: RateLimitConfig::default(),
            listing_ttl: Duration::from_secs(5 * 60),
            details_ttl: Duration::from_secs(60),
            history_ttl: Duration::from_secs(5 * 60),
            page_size: 20,
            timeout: None,
            retry: RetryConfig::default(),
            cache_mode: CacheMode::Use,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a config from an arbitrary variable source.
    pub fn from_lookup<L>(lookup: L) -> Result<Self, ConfigError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(API_KEY_VAR)
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        let mut config = Self::new(api_key);

        if let Some(base_url) =
            lookup("STOCKGRID_BASE_URL").filter(|value| !value.trim().is_empty())
        {
            config = config.with_base_url(base_url);
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, "STOCKGRID_MIN_INTERVAL_MS")? {
            config.rate_limit.min_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, "STOCKGRID_CHART_MIN_INTERVAL_MS")? {
            config.rate_limit.chart_min_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, "STOCKGRID_TIMEOUT_MS")? {
            config.timeout = Some(Duration::from_millis(ms));
        }
        if let Some(retries) = parse_var::<u32, _>(&lookup, "STOCKGRID_MAX_RETRIES")? {
            config.retry.max_retries = retries;
        }

        Ok(config)
    }

    /// Trailing slashes are dropped so endpoint paths join cleanly.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim().trim_end_matches('/').to_owned();
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_cache_mode(mut self, cache_mode: CacheMode) -> Self {
        self.cache_mode = cache_mode;
        self
    }

    pub fn with_rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
        self.rate_limit = rate_limit;
        self
    }
}

fn parse_var<T, L>(lookup: &L, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    L: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { name, value: raw }),
    }
}
