//! CLI argument definitions for stockgrid.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `stocks` | List active stock tickers, optionally filtered |
//! | `details` | Previous trading day aggregate for a ticker |
//! | `history` | Price history for a chart range |
//! | `market` | Current New York market session |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--base-url` | `$STOCKGRID_BASE_URL` | Upstream API base URL |
//! | `--cache-mode` | `use` | Response cache behavior |
//! | `--max-retries` | `$STOCKGRID_MAX_RETRIES` | Retries after the first attempt |
//!
//! # Examples
//!
//! ```bash
//! stockgrid stocks --search apple --pretty
//! stockgrid stocks --pages 3
//! stockgrid details AAPL
//! stockgrid history MSFT --range 3M
//! stockgrid market
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};

use stockgrid_core::CacheMode;

/// Stock dashboard data client.
///
/// Reads `POLYGON_API_KEY` from the environment. Every upstream call goes
/// through one rate-limited, cached request queue.
#[derive(Debug, Parser)]
#[command(name = "stockgrid", author, version, about = "Stock dashboard data client")]
pub struct Cli {
    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Override the upstream API base URL.
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Response cache behavior.
    #[arg(long, global = true, value_enum, default_value_t = CacheModeArg::Use)]
    pub cache_mode: CacheModeArg,

    /// Override the number of retries for transient failures.
    #[arg(long, global = true)]
    pub max_retries: Option<u32>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CacheModeArg {
    /// Serve fresh cached responses, fetch otherwise.
    Use,
    /// Always fetch, then cache the response.
    Refresh,
    /// Always fetch, never cache.
    Bypass,
}

impl From<CacheModeArg> for CacheMode {
    fn from(value: CacheModeArg) -> Self {
        match value {
            CacheModeArg::Use => Self::Use,
            CacheModeArg::Refresh => Self::Refresh,
            CacheModeArg::Bypass => Self::Bypass,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List active stock tickers.
    ///
    /// # Examples
    ///
    ///   stockgrid stocks
    ///   stockgrid stocks --search apple
    ///   stockgrid stocks --pages 3
    Stocks(StocksArgs),

    /// Fetch the previous trading day aggregate for a ticker.
    ///
    /// # Examples
    ///
    ///   stockgrid details AAPL
    Details(DetailsArgs),

    /// Fetch the price history behind the chart view.
    ///
    /// # Examples
    ///
    ///   stockgrid history AAPL
    ///   stockgrid history AAPL --range 1D
    History(HistoryArgs),

    /// Show the current market session in New York time.
    Market,
}

#[derive(Debug, Args)]
pub struct StocksArgs {
    /// Free-form search over ticker and company name.
    #[arg(long)]
    pub search: Option<String>,

    /// `next_url` of a previous page.
    #[arg(long)]
    pub cursor: Option<String>,

    /// Number of pages to follow.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub pages: u32,
}

#[derive(Debug, Args)]
pub struct DetailsArgs {
    /// Market symbol (e.g., AAPL).
    pub ticker: String,
}

#[derive(Debug, Args)]
pub struct HistoryArgs {
    /// Market symbol (e.g., AAPL).
    pub ticker: String,

    /// Chart range: 1D, 1W, 1M, 3M or 1Y.
    #[arg(long, default_value = "1M")]
    pub range: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "stockgrid",
            "stocks",
            "--search",
            "apple",
            "--pages",
            "2",
            "--cache-mode",
            "bypass",
        ])
        .expect("arguments should parse");

        assert_eq!(cli.cache_mode, CacheModeArg::Bypass);
        match cli.command {
            Command::Stocks(args) => {
                assert_eq!(args.search.as_deref(), Some("apple"));
                assert_eq!(args.pages, 2);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn zero_pages_is_rejected() {
        let result = Cli::try_parse_from(["stockgrid", "stocks", "--pages", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn history_defaults_to_one_month() {
        let cli = Cli::try_parse_from(["stockgrid", "history", "AAPL"]).expect("parses");
        match cli.command {
            Command::History(args) => assert_eq!(args.range, "1M"),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
