//! Data access façade for the stock dashboard.
//!
//! Every operation follows the same path:
//!
//! ```text
//! cache lookup ──hit──▶ decoded value
//!      │ miss
//!      ▼
//! RetryPolicy ──attempt──▶ RequestQueue ──▶ RateLimiter ──▶ HttpClient
//!      │ success
//!      ▼
//! cache write (per-endpoint TTL)
//! ```
//!
//! One cache, one queue and one limiter are shared by all operations.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::cache::{CacheMode, CacheStore, Lookup};
use crate::classifier::{AssumeOnline, ErrorClassifier, NetworkStatus};
use crate::clock::{Clock, TokioClock};
use crate::config::ClientConfig;
use crate::error::{AppError, ErrorKind, RawError};
use crate::http_client::{HttpClient, HttpRequest, RateLimitInfo, ReqwestHttpClient};
use crate::queue::RequestQueue;
use crate::retry::RetryPolicy;
use crate::throttling::{Lane, RateLimiter};
use crate::{
    format_date, PriceHistory, PriceRange, StockDetails, Symbol, TickerPage, ValidationError,
};

const HISTORY_QUERY: &str = "adjusted=true&sort=asc&limit=50000";

/// Shared handle to the upstream market data API.
///
/// Cheap to clone; clones share the cache, queue and limiter.
#[derive(Clone)]
pub struct MarketDataClient {
    http: Arc<dyn HttpClient>,
    config: ClientConfig,
    cache: CacheStore,
    queue: RequestQueue,
    retry: RetryPolicy,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for MarketDataClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarketDataClient")
            .field("base_url", &self.config.base_url)
            .field("cache_mode", &self.config.cache_mode)
            .field("queue", &self.queue)
            .finish_non_exhaustive()
    }
}

/// Wiring for a [`MarketDataClient`]; defaults to reqwest and the tokio clock.
pub struct MarketDataClientBuilder {
    config: ClientConfig,
    http: Option<Arc<dyn HttpClient>>,
    clock: Option<Arc<dyn Clock>>,
    network: Option<Arc<dyn NetworkStatus>>,
}

impl MarketDataClientBuilder {
    pub fn http_client(mut self, http: Arc<dyn HttpClient>) -> Self {
        self.http = Some(http);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn network_status(mut self, network: Arc<dyn NetworkStatus>) -> Self {
        self.network = Some(network);
        self
    }

    pub fn build(self) -> MarketDataClient {
        let clock = self.clock.unwrap_or_else(|| Arc::new(TokioClock));
        let http = self
            .http
            .unwrap_or_else(|| Arc::new(ReqwestHttpClient::new()));
        let classifier =
            ErrorClassifier::new(self.network.unwrap_or_else(|| Arc::new(AssumeOnline)));

        let limiter = Arc::new(RateLimiter::new(self.config.rate_limit, Arc::clone(&clock)));
        let queue = RequestQueue::new(limiter, classifier.clone());
        let retry = RetryPolicy::new(self.config.retry, classifier, Arc::clone(&clock));
        let cache = CacheStore::new(self.config.listing_ttl, Arc::clone(&clock));

        MarketDataClient {
            http,
            config: self.config,
            cache,
            queue,
            retry,
            clock,
        }
    }
}

/// One logical request: where to fetch it and how long to keep it.
struct Fetch {
    key: String,
    url: String,
    lane: Lane,
    ttl: Duration,
    stale_on_rate_limit: bool,
}

impl MarketDataClient {
    pub fn new(config: ClientConfig) -> Self {
        Self::builder(config).build()
    }

    pub fn builder(config: ClientConfig) -> MarketDataClientBuilder {
        MarketDataClientBuilder {
            config,
            http: None,
            clock: None,
            network: None,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub fn queue(&self) -> &RequestQueue {
        &self.queue
    }

    /// One page of active stock tickers, optionally filtered by `search`.
    ///
    /// `page_cursor` is the `next_url` of a previous page and must point at
    /// the configured base URL.
    pub async fn fetch_stocks(
        &self,
        search: Option<&str>,
        page_cursor: Option<&str>,
    ) -> Result<TickerPage, AppError> {
        let search = search.map(str::trim).filter(|query| !query.is_empty());
        let page_cursor = page_cursor.map(str::trim).filter(|cursor| !cursor.is_empty());

        let url = match page_cursor {
            Some(cursor) => self.validate_cursor(cursor)?,
            None => self.listing_url(search),
        };

        self.load(Fetch {
            key: format!(
                "stocks-{}-{}",
                search.unwrap_or_default(),
                page_cursor.unwrap_or_default()
            ),
            url,
            lane: Lane::Reference,
            ttl: self.config.listing_ttl,
            stale_on_rate_limit: false,
        })
        .await
    }

    /// Previous trading day aggregate for `ticker`.
    pub async fn fetch_stock_details(&self, ticker: &str) -> Result<StockDetails, AppError> {
        let symbol = Symbol::parse(ticker)?;

        self.load(Fetch {
            key: format!("stock-details-{symbol}"),
            url: format!(
                "{}/v2/aggs/ticker/{}/prev?adjusted=true",
                self.config.base_url,
                symbol.path_segment()
            ),
            lane: Lane::Reference,
            ttl: self.config.details_ttl,
            stale_on_rate_limit: false,
        })
        .await
    }

    /// Price series for the chart view.
    ///
    /// Runs on the chart lane. A rate-limited attempt falls back to an
    /// expired cache entry when one exists.
    pub async fn fetch_price_history(
        &self,
        ticker: &str,
        range: PriceRange,
    ) -> Result<PriceHistory, AppError> {
        let symbol = Symbol::parse(ticker)?;
        let (multiplier, timespan) = range.granularity();
        let (from, to) = range.window(self.clock.now_utc().date());

        let aggregates: StockDetails = self
            .load(Fetch {
                key: format!("price-history-{symbol}-{range}"),
                url: format!(
                    "{}/v2/aggs/ticker/{}/range/{multiplier}/{}/{}/{}?{HISTORY_QUERY}",
                    self.config.base_url,
                    symbol.path_segment(),
                    timespan.as_str(),
                    format_date(from),
                    format_date(to),
                ),
                lane: Lane::Chart,
                ttl: self.config.history_ttl,
                stale_on_rate_limit: true,
            })
            .await?;

        if aggregates.results.is_empty() {
            debug!(symbol = %symbol, range = %range, "no bars for range");
        }

        Ok(PriceHistory {
            symbol,
            range,
            bars: aggregates.results,
        })
    }

    fn listing_url(&self, search: Option<&str>) -> String {
        let mut url = format!(
            "{}/v3/reference/tickers?market=stocks&active=true&sort=ticker&order=asc&limit={}",
            self.config.base_url, self.config.page_size
        );
        if let Some(query) = search {
            url.push_str("&search=");
            url.push_str(&urlencoding::encode(query));
        }
        url
    }

    fn validate_cursor(&self, cursor: &str) -> Result<String, ValidationError> {
        let prefix = format!("{}/", self.config.base_url);
        if cursor.starts_with(&prefix) {
            Ok(cursor.to_owned())
        } else {
            Err(ValidationError::ForeignCursor {
                cursor: cursor.to_owned(),
                base_url: self.config.base_url.clone(),
            })
        }
    }

    async fn load<T>(&self, fetch: Fetch) -> Result<T, AppError>
    where
        T: DeserializeOwned,
    {
        let mode = self.config.cache_mode;
        let mut stale = None;

        if mode != CacheMode::Bypass {
            match self.cache.lookup(&fetch.key).await {
                Lookup::Fresh(body) if mode.reads() => match decode::<T>(&body) {
                    Ok(value) => {
                        debug!(key = %fetch.key, "cache hit");
                        return Ok(value);
                    }
                    Err(error) => {
                        warn!(
                            key = %fetch.key,
                            error = %error,
                            "discarding undecodable cache entry"
                        );
                        self.cache.remove(&fetch.key).await;
                    }
                },
                Lookup::Fresh(body) | Lookup::Expired(body) => stale = Some(body),
                Lookup::Miss => {}
            }
        }

        let has_stale = fetch.stale_on_rate_limit && stale.is_some();
        let outcome = self
            .retry
            .with_retry_until(
                || self.attempt(fetch.lane, &fetch.url),
                |error| has_stale && error.kind() == ErrorKind::RateLimit,
            )
            .await;

        let body = match outcome {
            Ok(body) => body,
            Err(error) if has_stale && error.kind() == ErrorKind::RateLimit => {
                let body = stale.unwrap_or_default();
                warn!(key = %fetch.key, "rate limited; serving stale cache entry");
                return decode(&body);
            }
            Err(error) => return Err(error),
        };

        let value = decode::<T>(&body)?;
        if mode.writes() {
            self.cache.set(fetch.key.as_str(), body, Some(fetch.ttl)).await;
        }
        Ok(value)
    }

    /// One queued, rate-limited request. Each retry lands at the tail of the
    /// queue.
    fn attempt(
        &self,
        lane: Lane,
        url: &str,
    ) -> impl std::future::Future<Output = Result<String, AppError>> + Send + 'static {
        let http = Arc::clone(&self.http);
        let queue = self.queue.clone();
        let mut request = HttpRequest::get(url).with_bearer(&self.config.api_key);
        if let Some(timeout) = self.config.timeout {
            request = request.with_timeout(timeout);
        }

        async move { queue.enqueue(lane, execute(http, request)).await }
    }
}

async fn execute(http: Arc<dyn HttpClient>, request: HttpRequest) -> Result<String, RawError> {
    debug!(url = %request.url, "dispatching upstream request");
    let response = http.execute(request).await?;

    let quota = RateLimitInfo::from_headers(&response);
    if response.status == 429 {
        warn!(
            remaining = ?quota.remaining,
            reset_at = ?quota.reset_at,
            "upstream rate limit hit"
        );
    } else if !quota.is_empty() {
        debug!(remaining = ?quota.remaining, reset_at = ?quota.reset_at, "upstream quota");
    }

    if !response.is_success() {
        return Err(RawError::from_response(&response));
    }
    Ok(response.body)
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, AppError> {
    serde_json::from_str(body).map_err(|error| {
        AppError::new(ErrorKind::ApiError, "Malformed upstream response")
            .with_cause(error.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::{HttpError, HttpResponse};
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;

    #[derive(Default)]
    struct StaticHttpClient {
        urls: Mutex<Vec<String>>,
    }

    impl HttpClient for StaticHttpClient {
        fn execute<'a>(
            &'a self,
            request: HttpRequest,
        ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
            Box::pin(async move {
                self.urls
                    .lock()
                    .expect("url log should not be poisoned")
                    .push(request.url);
                Ok(HttpResponse::ok_json(r#"{"results":[],"status":"OK","count":0}"#))
            })
        }
    }

    fn client(http: Arc<StaticHttpClient>) -> MarketDataClient {
        MarketDataClient::builder(
            ClientConfig::new("key").with_base_url("https://api.example.test"),
        )
        .http_client(http)
        .build()
    }

    #[tokio::test(start_paused = true)]
    async fn listing_url_carries_fixed_query() {
        let http = Arc::new(StaticHttpClient::default());

        client(Arc::clone(&http))
            .fetch_stocks(Some("Apple Inc"), None)
            .await
            .expect("listing succeeds");

        let urls = http.urls.lock().expect("url log should not be poisoned");
        assert_eq!(
            urls.as_slice(),
            [concat!(
                "https://api.example.test/v3/reference/tickers",
                "?market=stocks&active=true&sort=ticker&order=asc&limit=20&search=Apple%20Inc"
            )]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_ticker_fails_before_any_request() {
        let http = Arc::new(StaticHttpClient::default());

        let error = client(Arc::clone(&http))
            .fetch_stock_details("../etc")
            .await
            .expect_err("invalid ticker must fail");

        assert_eq!(error.kind(), ErrorKind::ValidationError);
        assert!(http.urls.lock().expect("url log should not be poisoned").is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn bypass_mode_never_touches_the_cache() {
        let http = Arc::new(StaticHttpClient::default());
        let client = MarketDataClient::builder(
            ClientConfig::new("key").with_cache_mode(CacheMode::Bypass),
        )
        .http_client(Arc::clone(&http) as Arc<dyn HttpClient>)
        .build();

        client.fetch_stocks(None, None).await.expect("first fetch");
        client.fetch_stocks(None, None).await.expect("second fetch");

        assert_eq!(http.urls.lock().expect("url log should not be poisoned").len(), 2);
        assert!(client.cache().is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_history_is_a_valid_series() {
        let http = Arc::new(StaticHttpClient::default());

        let history = client(http)
            .fetch_price_history("msft", PriceRange::OneYear)
            .await
            .expect("empty series is not an error");

        assert!(history.is_empty());
        assert_eq!(history.symbol.as_str(), "MSFT");
    }
}
