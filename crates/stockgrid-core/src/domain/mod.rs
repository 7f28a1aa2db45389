//! # Domain Models
//!
//! Typed views of the upstream payloads consumed by the dashboard.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Stock`] | Ticker reference row |
//! | [`TickerPage`] | One cursor-paginated page of tickers |
//! | [`StockDetails`] | Aggregates payload (previous close, ranges) |
//! | [`AggregateBar`] | OHLCV bar in upstream field naming |
//! | [`PriceHistory`] | Chart series for a symbol and [`PriceRange`] |
//! | [`Symbol`] | Validated ticker symbol |
//! | [`UtcDateTime`] | UTC timestamp |

mod models;
mod range;
mod symbol;
mod timestamp;

pub use models::{AggregateBar, PriceHistory, PricePoint, Stock, StockDetails, TickerPage};
pub use range::{format_date, PriceRange, Timespan};
pub use symbol::Symbol;
pub use timestamp::UtcDateTime;
