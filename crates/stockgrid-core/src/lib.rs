//! # Stockgrid Core
//!
//! Data access layer for the stock dashboard.
//!
//! ## Overview
//!
//! This crate provides everything between the presentation layer and the
//! upstream market data API:
//!
//! - **Typed domain models** for ticker pages, aggregates, and price history
//! - **Time-expiring response cache** shared by every operation
//! - **FIFO request queue** with at most one upstream call in flight
//! - **Shared rate limiter** with a stricter lane for chart requests
//! - **Error classification** into a closed [`ErrorKind`] taxonomy
//! - **Retry policy** with doubling backoff for transient failures
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`cache`] | TTL cache store and cache modes |
//! | [`classifier`] | Raw failure to [`AppError`] mapping |
//! | [`client`] | The [`MarketDataClient`] façade |
//! | [`clock`] | Injectable time source |
//! | [`config`] | Client configuration and environment loading |
//! | [`domain`] | Domain models (Stock, TickerPage, StockDetails, PriceHistory) |
//! | [`error`] | Core error types |
//! | [`http_client`] | HTTP client abstraction |
//! | [`market`] | New York market session indicator |
//! | [`queue`] | Serializing request queue |
//! | [`retry`] | Retry policy and backoff |
//! | [`throttling`] | Minimum-interval rate limiter |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stockgrid_core::{ClientConfig, MarketDataClient, PriceRange};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = MarketDataClient::new(ClientConfig::from_env()?);
//!
//!     let page = client.fetch_stocks(Some("apple"), None).await?;
//!     for stock in &page.results {
//!         println!("{} {}", stock.ticker, stock.name);
//!     }
//!
//!     let history = client.fetch_price_history("AAPL", PriceRange::OneMonth).await?;
//!     println!("{} bars", history.bars.len());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  CLI / UI       │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ MarketData      │────▶│ Cache Store      │
//! │ Client          │     └──────────────────┘
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ Retry Policy    │────▶│ Error Classifier │
//! └────────┬────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ Request Queue   │────▶│ Rate Limiter     │
//! └────────┬────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ HTTP Client     │
//! │ (reqwest)       │
//! └─────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! Every failure crossing the façade is an [`AppError`]:
//!
//! ```rust
//! use stockgrid_core::{AppError, ErrorKind};
//!
//! fn handle_error(error: &AppError) {
//!     match error.kind() {
//!         ErrorKind::RateLimit => {
//!             // Survived every retry; ask the user to wait
//!         }
//!         ErrorKind::NetworkError => {
//!             // Offer a retry once connectivity returns
//!         }
//!         _ => eprintln!("{}: {}", error.title(), error.user_message()),
//!     }
//! }
//! ```
//!
//! ## Security
//!
//! - The API key is read from the environment and sent only as a bearer header
//! - Page cursors must point at the configured base URL
//! - Tickers are validated before they reach a URL path

pub mod cache;
pub mod classifier;
pub mod client;
pub mod clock;
pub mod config;
pub mod domain;
pub mod error;
pub mod http_client;
pub mod market;
pub mod queue;
pub mod retry;
pub mod throttling;

// Re-export commonly used types at crate root for convenience

// Caching
pub use cache::{CacheMode, CacheStore, Lookup};

// Classification
pub use classifier::{AssumeOnline, ErrorClassifier, NetworkFlag, NetworkStatus};

// Façade
pub use client::{MarketDataClient, MarketDataClientBuilder};

// Time
pub use clock::{Clock, TokioClock};

// Configuration
pub use config::{ClientConfig, ConfigError};

// Domain models
pub use domain::{
    format_date, AggregateBar, PriceHistory, PricePoint, PriceRange, Stock, StockDetails, Symbol,
    TickerPage, Timespan, UtcDateTime,
};

// Error types
pub use error::{AppError, ErrorKind, RawError, ValidationError};

// HTTP client types
pub use http_client::{
    ApiKey, HttpClient, HttpError, HttpErrorKind, HttpRequest, HttpResponse, RateLimitInfo,
    ReqwestHttpClient,
};

// Market session
pub use market::{format_time_until, MarketPhase, MarketSession, TimeUntil};

// Scheduling
pub use queue::RequestQueue;

// Retry logic
pub use retry::{Backoff, RetryConfig, RetryPolicy};

// Throttling
pub use throttling::{Lane, RateLimitConfig, RateLimiter};
