use serde::Serialize;

use stockpick_analytics::{
    correlation_matrix, monthly_return_profile, price_statistics, yearly_candles,
    CorrelationMatrix, MonthlyReturnProfile, TickerStats, YearlyCandle,
};
use stockpick_core::{DateRange, TickerData};
use stockpick_forecast::{forecast_dataset, ForecastConfig, ForecastResult, ModelKind};

use crate::cli::ReportArgs;
use crate::envelope::EnvelopeError;
use crate::error::CliError;
use crate::session::Session;

use super::stats::{Rankings, StatsCharts};
use super::{fetch_stage, CommandResult};

#[derive(Debug, Serialize)]
struct InfoSummary {
    ticker: String,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    exchange: Option<String>,
    currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sector: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    market_cap: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pe_ratio: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dividend_yield: Option<f64>,
}

impl From<&TickerData> for InfoSummary {
    fn from(data: &TickerData) -> Self {
        Self {
            ticker: data.info.ticker.as_str().to_owned(),
            name: data.info.name.clone(),
            exchange: data.info.exchange.clone(),
            currency: data.info.currency.clone(),
            sector: data.info.sector.clone(),
            market_cap: data.info.market_cap,
            pe_ratio: data.info.pe_ratio,
            dividend_yield: data.info.dividend_yield,
        }
    }
}

#[derive(Debug, Serialize)]
struct TickerSeasonality {
    ticker: String,
    yearly_candles: Vec<YearlyCandle>,
    monthly_returns: Vec<MonthlyReturnProfile>,
}

#[derive(Debug, Serialize)]
struct ReportResponseData {
    portfolio: String,
    range: DateRange,
    info: Vec<InfoSummary>,
    statistics: Vec<TickerStats>,
    rankings: Rankings,
    correlation: CorrelationMatrix,
    charts: StatsCharts,
    seasonality: Vec<TickerSeasonality>,
    model: ModelKind,
    horizon: usize,
    forecasts: Vec<ForecastResult>,
}

pub async fn run(session: &Session, args: &ReportArgs) -> Result<CommandResult, CliError> {
    let stage = fetch_stage(session, &args.forecast.data).await?;

    let statistics = price_statistics(&stage.dataset);
    let config = ForecastConfig::new(args.forecast.model.into(), args.forecast.horizon)
        .with_backtest_window(args.forecast.backtest_window)
        .with_confidence(args.forecast.confidence);
    let batch = forecast_dataset(&stage.dataset, &config)?;

    let mut errors = stage.errors;
    errors.extend(batch.failures.iter().map(|failure| {
        EnvelopeError::new(failure.error.code(), failure.error.to_string())
            .with_ticker(failure.ticker.as_str())
    }));

    let seasonality = stage
        .dataset
        .tickers
        .iter()
        .map(|data| TickerSeasonality {
            ticker: data.series.ticker().as_str().to_owned(),
            yearly_candles: yearly_candles(&data.series),
            monthly_returns: monthly_return_profile(&data.series),
        })
        .collect();

    let data = serde_json::to_value(ReportResponseData {
        portfolio: stage.portfolio.name().to_owned(),
        range: stage.range,
        info: stage.dataset.tickers.iter().map(InfoSummary::from).collect(),
        rankings: Rankings::from_stats(&statistics),
        correlation: correlation_matrix(&stage.dataset),
        charts: StatsCharts::from_dataset(&stage.dataset, args.window),
        seasonality,
        model: config.model,
        horizon: config.horizon,
        forecasts: batch.results,
        statistics,
    })?;

    Ok(CommandResult::ok(data)
        .with_warnings(stage.warnings)
        .with_errors(errors)
        .with_cache_hits(stage.dataset.cache_hits))
}
