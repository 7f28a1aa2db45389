use serde::Serialize;
use serde_json::Value;

use stockgrid_core::{AggregateBar, MarketDataClient, StockDetails};

use crate::cli::DetailsArgs;
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct DetailsResponseData {
    latest: Option<AggregateBar>,
    details: StockDetails,
}

pub async fn run(args: &DetailsArgs, client: &MarketDataClient) -> Result<Value, CliError> {
    let details = client.fetch_stock_details(&args.ticker).await?;

    Ok(serde_json::to_value(DetailsResponseData {
        latest: details.latest().cloned(),
        details,
    })?)
}
