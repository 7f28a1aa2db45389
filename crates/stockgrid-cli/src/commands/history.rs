use serde::Serialize;
use serde_json::Value;

use stockgrid_core::{MarketDataClient, PriceHistory, PricePoint, PriceRange};

use crate::cli::HistoryArgs;
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct HistoryResponseData {
    points: Vec<PricePoint>,
    history: PriceHistory,
}

pub async fn run(args: &HistoryArgs, client: &MarketDataClient) -> Result<Value, CliError> {
    let range = args.range.parse::<PriceRange>()?;
    let history = client.fetch_price_history(&args.ticker, range).await?;

    Ok(serde_json::to_value(HistoryResponseData {
        points: history.points()?,
        history,
    })?)
}
