use serde::{Deserialize, Serialize};

use crate::{PriceRange, Symbol, UtcDateTime, ValidationError};

/// Ticker reference row from the listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stock {
    pub ticker: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub market: String,
    #[serde(default)]
    pub locale: String,
    #[serde(default)]
    pub primary_exchange: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub currency_name: Option<String>,
    #[serde(default)]
    pub last_updated_utc: Option<String>,
}

/// One page of the ticker listing.
///
/// `next_url` is an opaque cursor: the full URL of the following page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerPage {
    #[serde(default)]
    pub results: Vec<Stock>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub next_url: Option<String>,
}

impl TickerPage {
    pub fn has_more(&self) -> bool {
        self.next_url.is_some()
    }
}

/// Aggregate (OHLCV) bar in upstream field naming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateBar {
    #[serde(rename = "T", default, skip_serializing_if = "Option::is_none")]
    pub ticker: Option<String>,
    #[serde(rename = "c")]
    pub close: f64,
    #[serde(rename = "h")]
    pub high: f64,
    #[serde(rename = "l")]
    pub low: f64,
    #[serde(rename = "o")]
    pub open: f64,
    #[serde(rename = "v", default)]
    pub volume: f64,
    #[serde(rename = "vw", default, skip_serializing_if = "Option::is_none")]
    pub vwap: Option<f64>,
    /// Bar start, epoch milliseconds.
    #[serde(rename = "t")]
    pub timestamp_ms: i64,
}

impl AggregateBar {
    pub fn starts_at(&self) -> Result<UtcDateTime, ValidationError> {
        UtcDateTime::from_unix_millis(self.timestamp_ms)
    }
}

/// Aggregates payload, shared by the previous-close and range endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockDetails {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub ticker: String,
    #[serde(default)]
    pub query_count: u64,
    #[serde(default)]
    pub results_count: u64,
    #[serde(default)]
    pub adjusted: bool,
    #[serde(default)]
    pub results: Vec<AggregateBar>,
}

impl StockDetails {
    /// Most recent bar, if any.
    pub fn latest(&self) -> Option<&AggregateBar> {
        self.results.iter().max_by_key(|bar| bar.timestamp_ms)
    }
}

/// Price series behind the chart view. May be empty for ranges without data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceHistory {
    pub symbol: Symbol,
    pub range: PriceRange,
    pub bars: Vec<AggregateBar>,
}

/// Close price at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub at: UtcDateTime,
    pub close: f64,
}

impl PriceHistory {
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn points(&self) -> Result<Vec<PricePoint>, ValidationError> {
        self.bars
            .iter()
            .map(|bar| {
                Ok(PricePoint {
                    at: bar.starts_at()?,
                    close: bar.close,
                })
            })
            .collect()
    }
}
