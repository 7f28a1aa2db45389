//! Shared fixtures for the stockgrid behavior suites: a scripted transport,
//! a clock with a pinned calendar date, and upstream payload builders.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use stockgrid_core::{Clock, HttpClient, HttpError, HttpRequest, HttpResponse};
use time::macros::datetime;
use time::OffsetDateTime;
use tokio::time::Instant;

pub const BASE_URL: &str = "https://api.example.test";

/// One scripted transport outcome.
#[derive(Debug, Clone)]
pub enum Reply {
    Respond(HttpResponse),
    Fail(HttpError),
}

/// Transport that replays scripted replies, records each request, and
/// tracks how many requests are in flight at once.
#[derive(Debug)]
pub struct ScriptedHttpClient {
    script: Mutex<VecDeque<Reply>>,
    fallback: Mutex<Reply>,
    requests: Mutex<Vec<(Instant, HttpRequest)>>,
    latency: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedHttpClient {
    pub fn new() -> Self {
        Self::with_latency(Duration::ZERO)
    }

    pub fn with_latency(latency: Duration) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(Reply::Respond(HttpResponse::ok_json(empty_page()))),
            requests: Mutex::new(Vec::new()),
            latency,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn push(&self, reply: Reply) -> &Self {
        self.script.lock().expect("script").push_back(reply);
        self
    }

    pub fn respond(&self, status: u16, body: impl Into<String>) -> &Self {
        self.push(Reply::Respond(HttpResponse::new(status, body)))
    }

    /// Reply used once the script runs dry.
    pub fn always(&self, reply: Reply) {
        *self.fallback.lock().expect("fallback") = reply;
    }

    pub fn urls(&self) -> Vec<String> {
        self.requests
            .lock()
            .expect("requests")
            .iter()
            .map(|(_, request)| request.url.clone())
            .collect()
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .expect("requests")
            .iter()
            .map(|(_, request)| request.clone())
            .collect()
    }

    pub fn dispatch_times(&self) -> Vec<Instant> {
        self.requests
            .lock()
            .expect("requests")
            .iter()
            .map(|(at, _)| *at)
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().expect("requests").len()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl Default for ScriptedHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient for ScriptedHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        Box::pin(async move {
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(current, Ordering::SeqCst);
            self.requests
                .lock()
                .expect("requests")
                .push((Instant::now(), request));

            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }

            let reply = self
                .script
                .lock()
                .expect("script")
                .pop_front()
                .unwrap_or_else(|| self.fallback.lock().expect("fallback").clone());
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            match reply {
                Reply::Respond(response) => Ok(response),
                Reply::Fail(error) => Err(error),
            }
        })
    }
}

/// Tokio-backed clock with a pinned wall-clock date.
#[derive(Debug)]
pub struct PinnedDateClock {
    started: Instant,
    wall: OffsetDateTime,
}

impl PinnedDateClock {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            wall: datetime!(2024-03-13 15:00 UTC),
        }
    }
}

impl Default for PinnedDateClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for PinnedDateClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn now_utc(&self) -> OffsetDateTime {
        self.wall + self.started.elapsed()
    }

    fn sleep<'a>(&'a self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(tokio::time::sleep(duration))
    }
}

pub fn empty_page() -> String {
    String::from(r#"{"results":[],"status":"OK","count":0}"#)
}

pub fn ticker_page(tickers: &[&str], next_url: Option<&str>) -> String {
    let results = tickers
        .iter()
        .map(|ticker| {
            serde_json::json!({
                "ticker": ticker,
                "name": format!("{ticker} Inc."),
                "market": "stocks",
                "locale": "us",
                "type": "CS",
            })
        })
        .collect::<Vec<_>>();

    serde_json::json!({
        "results": results,
        "status": "OK",
        "count": tickers.len(),
        "next_url": next_url,
    })
    .to_string()
}

pub fn aggregates(ticker: &str, closes: &[f64]) -> String {
    let results = closes
        .iter()
        .enumerate()
        .map(|(index, close)| {
            serde_json::json!({
                "T": ticker,
                "o": close - 1.0,
                "h": close + 1.0,
                "l": close - 2.0,
                "c": close,
                "v": 1_000_000.0,
                "vw": close,
                "t": 1_710_288_000_000_i64 + index as i64 * 86_400_000,
            })
        })
        .collect::<Vec<_>>();

    serde_json::json!({
        "ticker": ticker,
        "status": "OK",
        "queryCount": closes.len(),
        "resultsCount": closes.len(),
        "adjusted": true,
        "results": results,
    })
    .to_string()
}

pub fn shared(http: ScriptedHttpClient) -> Arc<ScriptedHttpClient> {
    Arc::new(http)
}
