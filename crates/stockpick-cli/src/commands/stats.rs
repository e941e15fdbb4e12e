use serde::Serialize;

use stockpick_analytics::{
    correlation_matrix, normalized_prices, price_statistics, rank_by, rolling_volatility_all,
    ChartSeries, CorrelationMatrix, RankMetric, RankedTicker, TickerStats,
};
use stockpick_core::{DateRange, MarketDataSet};

use crate::cli::StatsArgs;
use crate::error::CliError;
use crate::session::Session;

use super::{fetch_stage, CommandResult};

/// Cross-ticker rankings, one list per metric, best first.
#[derive(Debug, Serialize)]
pub(crate) struct Rankings {
    total_return: Vec<RankedTicker>,
    volatility: Vec<RankedTicker>,
    max_drawdown: Vec<RankedTicker>,
}

impl Rankings {
    pub(crate) fn from_stats(stats: &[TickerStats]) -> Self {
        Self {
            total_return: rank_by(stats, RankMetric::TotalReturn),
            volatility: rank_by(stats, RankMetric::Volatility),
            max_drawdown: rank_by(stats, RankMetric::MaxDrawdown),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct StatsCharts {
    normalized_prices: Vec<ChartSeries>,
    rolling_volatility: Vec<ChartSeries>,
}

impl StatsCharts {
    pub(crate) fn from_dataset(dataset: &MarketDataSet, window: usize) -> Self {
        Self {
            normalized_prices: normalized_prices(dataset),
            rolling_volatility: rolling_volatility_all(dataset, window),
        }
    }
}

#[derive(Debug, Serialize)]
struct StatsResponseData {
    portfolio: String,
    range: DateRange,
    statistics: Vec<TickerStats>,
    rankings: Rankings,
    correlation: CorrelationMatrix,
    charts: StatsCharts,
}

pub async fn run(session: &Session, args: &StatsArgs) -> Result<CommandResult, CliError> {
    let stage = fetch_stage(session, &args.data).await?;

    let statistics = price_statistics(&stage.dataset);
    let data = serde_json::to_value(StatsResponseData {
        portfolio: stage.portfolio.name().to_owned(),
        range: stage.range,
        rankings: Rankings::from_stats(&statistics),
        correlation: correlation_matrix(&stage.dataset),
        charts: StatsCharts::from_dataset(&stage.dataset, args.window),
        statistics,
    })?;

    Ok(CommandResult::ok(data)
        .with_warnings(stage.warnings)
        .with_errors(stage.errors)
        .with_cache_hits(stage.dataset.cache_hits))
}
