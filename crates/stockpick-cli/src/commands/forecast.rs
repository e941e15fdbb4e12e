use serde::Serialize;

use stockpick_core::DateRange;
use stockpick_forecast::{forecast_dataset, ForecastConfig, ForecastResult, ModelKind};

use crate::cli::ForecastArgs;
use crate::envelope::EnvelopeError;
use crate::error::CliError;
use crate::session::Session;

use super::{fetch_stage, CommandResult};

#[derive(Debug, Serialize)]
struct ForecastResponseData {
    portfolio: String,
    range: DateRange,
    model: ModelKind,
    horizon: usize,
    confidence: f64,
    forecasts: Vec<ForecastResult>,
}

pub async fn run(session: &Session, args: &ForecastArgs) -> Result<CommandResult, CliError> {
    let stage = fetch_stage(session, &args.data).await?;

    let config = ForecastConfig::new(args.model.into(), args.horizon)
        .with_backtest_window(args.backtest_window)
        .with_confidence(args.confidence);
    let batch = forecast_dataset(&stage.dataset, &config)?;

    let mut errors = stage.errors;
    errors.extend(batch.failures.iter().map(|failure| {
        EnvelopeError::new(failure.error.code(), failure.error.to_string())
            .with_ticker(failure.ticker.as_str())
    }));

    let data = serde_json::to_value(ForecastResponseData {
        portfolio: stage.portfolio.name().to_owned(),
        range: stage.range,
        model: config.model,
        horizon: config.horizon,
        confidence: config.confidence,
        forecasts: batch.results,
    })?;

    Ok(CommandResult::ok(data)
        .with_warnings(stage.warnings)
        .with_errors(errors)
        .with_cache_hits(stage.dataset.cache_hits))
}
