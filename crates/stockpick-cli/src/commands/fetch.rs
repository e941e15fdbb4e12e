use serde::Serialize;

use stockpick_core::{format_iso_date, DateRange, TickerData};

use crate::cli::FetchArgs;
use crate::error::CliError;
use crate::session::Session;

use super::{fetch_stage, CommandResult};

#[derive(Debug, Serialize)]
struct FetchedTicker {
    ticker: String,
    name: String,
    observations: usize,
    first_date: Option<String>,
    last_date: Option<String>,
}

impl From<&TickerData> for FetchedTicker {
    fn from(data: &TickerData) -> Self {
        Self {
            ticker: data.series.ticker().as_str().to_owned(),
            name: data.info.name.clone(),
            observations: data.series.len(),
            first_date: data.series.first_date().map(format_iso_date),
            last_date: data.series.last_date().map(format_iso_date),
        }
    }
}

#[derive(Debug, Serialize)]
struct FetchResponseData {
    portfolio: String,
    range: DateRange,
    tickers: Vec<FetchedTicker>,
    failed: Vec<String>,
}

pub async fn run(session: &Session, args: &FetchArgs) -> Result<CommandResult, CliError> {
    let stage = fetch_stage(session, args).await?;

    let data = serde_json::to_value(FetchResponseData {
        portfolio: stage.portfolio.name().to_owned(),
        range: stage.range,
        tickers: stage.dataset.tickers.iter().map(FetchedTicker::from).collect(),
        failed: stage
            .dataset
            .failures
            .iter()
            .map(|failure| failure.ticker.as_str().to_owned())
            .collect(),
    })?;

    Ok(CommandResult::ok(data)
        .with_warnings(stage.warnings)
        .with_errors(stage.errors)
        .with_cache_hits(stage.dataset.cache_hits))
}
