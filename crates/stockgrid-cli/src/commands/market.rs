use serde_json::Value;

use stockgrid_core::MarketSession;

use crate::error::CliError;

pub fn run() -> Result<Value, CliError> {
    Ok(serde_json::to_value(MarketSession::now())?)
}
