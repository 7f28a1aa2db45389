use serde::Serialize;
use serde_json::Value;
use tracing::info;

use stockgrid_core::{MarketDataClient, Stock};

use crate::cli::StocksArgs;
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct StocksResponseData {
    results: Vec<Stock>,
    pages: u32,
    next_url: Option<String>,
}

/// Follows `next_url` until `--pages` pages are collected or the listing ends.
pub async fn run(args: &StocksArgs, client: &MarketDataClient) -> Result<Value, CliError> {
    let mut results = Vec::new();
    let mut cursor = args.cursor.clone();
    let mut pages = 0_u32;

    while pages < args.pages {
        let page = client
            .fetch_stocks(args.search.as_deref(), cursor.as_deref())
            .await?;
        pages += 1;
        info!(page = pages, count = page.results.len(), "fetched ticker page");

        results.extend(page.results);
        cursor = page.next_url;
        if cursor.is_none() {
            break;
        }
    }

    Ok(serde_json::to_value(StocksResponseData {
        results,
        pages,
        next_url: cursor,
    })?)
}
