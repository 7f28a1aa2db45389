mod details;
mod history;
mod market;
mod stocks;

use serde_json::Value;
use stockgrid_core::{ClientConfig, MarketDataClient};

use crate::cli::{Cli, Command};
use crate::error::CliError;

pub async fn run(cli: &Cli) -> Result<Value, CliError> {
    match &cli.command {
        Command::Stocks(args) => stocks::run(args, &client(cli)?).await,
        Command::Details(args) => details::run(args, &client(cli)?).await,
        Command::History(args) => history::run(args, &client(cli)?).await,
        Command::Market => market::run(),
    }
}

fn client(cli: &Cli) -> Result<MarketDataClient, CliError> {
    let mut config = ClientConfig::from_env()?.with_cache_mode(cli.cache_mode.into());

    if let Some(base_url) = &cli.base_url {
        config = config.with_base_url(base_url.as_str());
    }
    if let Some(max_retries) = cli.max_retries {
        config.retry.max_retries = max_retries;
    }

    Ok(MarketDataClient::new(config))
}
