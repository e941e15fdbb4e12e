use serde::Serialize;

use stockpick_core::{MarketDataSet, PriceSeries, Ticker};

/// Fixed trading-day count used for annualization.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Summary statistics for one ticker over the observed range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickerStats {
    pub ticker: Ticker,
    pub observations: usize,
    pub first_close: f64,
    pub last_close: f64,
    pub mean_close: f64,
    pub min_close: f64,
    pub max_close: f64,
    /// Absolute change between the first and last close.
    pub abs_change: f64,
    /// Relative change between the first and last close, in percent.
    pub rel_change_pct: f64,
    /// Fractional return over the range (`last/first - 1`).
    pub total_return: f64,
    /// Stddev of daily log returns, annualized by √252.
    pub annualized_volatility: f64,
    /// Largest peak-to-trough fall as a fraction, always `<= 0`.
    pub max_drawdown: f64,
    /// Largest trough-to-peak rise as a fraction, always `>= 0`.
    pub max_rise: f64,
}

/// Compute summary statistics for one series. `None` when it has no bars.
pub fn ticker_statistics(series: &PriceSeries) -> Option<TickerStats> {
    let closes = series.closes();
    let (first, last) = (*closes.first()?, *closes.last()?);

    let returns = series.daily_log_returns();
    let annualized_volatility = sample_stddev(&returns) * TRADING_DAYS_PER_YEAR.sqrt();

    Some(TickerStats {
        ticker: series.ticker().clone(),
        observations: closes.len(),
        first_close: first,
        last_close: last,
        mean_close: mean(&closes),
        min_close: closes.iter().copied().fold(f64::INFINITY, f64::min),
        max_close: closes.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        abs_change: last - first,
        rel_change_pct: if first != 0.0 {
            (last - first) / first * 100.0
        } else {
            0.0
        },
        total_return: if first != 0.0 { last / first - 1.0 } else { 0.0 },
        annualized_volatility,
        max_drawdown: max_drawdown(&closes),
        max_rise: max_rise(&closes),
    })
}

/// Statistics for every ticker in the dataset, in portfolio order.
/// Tickers without observations are omitted.
pub fn price_statistics(dataset: &MarketDataSet) -> Vec<TickerStats> {
    dataset.series().filter_map(ticker_statistics).collect()
}

/// Metric to rank the portfolio by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RankMetric {
    TotalReturn,
    Volatility,
    MaxDrawdown,
}

impl RankMetric {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TotalReturn => "total_return",
            Self::Volatility => "volatility",
            Self::MaxDrawdown => "max_drawdown",
        }
    }

    fn value_of(self, stats: &TickerStats) -> f64 {
        match self {
            Self::TotalReturn => stats.total_return,
            Self::Volatility => stats.annualized_volatility,
            Self::MaxDrawdown => stats.max_drawdown,
        }
    }
}

/// One row of a ranking, best first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedTicker {
    pub rank: usize,
    pub ticker: Ticker,
    pub value: f64,
}

/// Rank tickers by a metric, descending. Ties keep portfolio order.
pub fn rank_by(stats: &[TickerStats], metric: RankMetric) -> Vec<RankedTicker> {
    let mut indexed: Vec<(usize, f64)> = stats
        .iter()
        .enumerate()
        .map(|(index, s)| (index, metric.value_of(s)))
        .collect();
    indexed.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    indexed
        .into_iter()
        .enumerate()
        .map(|(position, (index, value))| RankedTicker {
            rank: position + 1,
            ticker: stats[index].ticker.clone(),
            value,
        })
        .collect()
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n−1 denominator); 0.0 below two samples.
pub(crate) fn sample_stddev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance =
        values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

fn max_drawdown(closes: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut worst = 0.0f64;
    for &close in closes {
        peak = peak.max(close);
        if peak > 0.0 {
            worst = worst.min((close - peak) / peak);
        }
    }
    worst
}

fn max_rise(closes: &[f64]) -> f64 {
    let mut trough = f64::INFINITY;
    let mut best = 0.0f64;
    for &close in closes {
        trough = trough.min(close);
        if trough > 0.0 {
            best = best.max((close - trough) / trough);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockpick_core::{DailyBar, PriceSeries};

    fn series(symbol: &str, closes: &[f64]) -> PriceSeries {
        let ticker = Ticker::parse(symbol).expect("ticker");
        let mut date = stockpick_core::parse_iso_date("2024-01-01").expect("date");
        let bars = closes
            .iter()
            .map(|&close| {
                let bar = DailyBar::new(
                    date,
                    close,
                    close * 1.01 + 0.01,
                    (close * 0.99).max(0.0),
                    close,
                    Some(1000),
                )
                .expect("bar");
                date = stockpick_core::next_weekday(date);
                bar
            })
            .collect();
        PriceSeries::new(ticker, bars).expect("series")
    }

    #[test]
    fn constant_series_has_exactly_zero_volatility() {
        let stats = ticker_statistics(&series("FLAT", &[50.0; 40])).expect("stats");
        assert_eq!(stats.annualized_volatility, 0.0);
        assert_eq!(stats.total_return, 0.0);
        assert_eq!(stats.max_drawdown, 0.0);
        assert_eq!(stats.max_rise, 0.0);
    }

    #[test]
    fn change_metrics_match_endpoints() {
        let stats = ticker_statistics(&series("UP", &[100.0, 110.0, 121.0])).expect("stats");
        assert!((stats.abs_change - 21.0).abs() < 1e-9);
        assert!((stats.rel_change_pct - 21.0).abs() < 1e-9);
        assert!((stats.total_return - 0.21).abs() < 1e-9);
    }

    #[test]
    fn drawdown_and_rise_track_extremes() {
        let stats =
            ticker_statistics(&series("SWING", &[100.0, 150.0, 75.0, 120.0])).expect("stats");
        // 150 -> 75 is the worst fall.
        assert!((stats.max_drawdown + 0.5).abs() < 1e-9);
        // 75 -> 120 beats 100 -> 150.
        assert!((stats.max_rise - 0.6).abs() < 1e-9);
    }

    #[test]
    fn ranking_is_descending_and_stable() {
        let stats = vec![
            ticker_statistics(&series("A", &[100.0, 110.0])).expect("stats"),
            ticker_statistics(&series("B", &[100.0, 130.0])).expect("stats"),
            ticker_statistics(&series("C", &[100.0, 110.0])).expect("stats"),
        ];
        let ranked = rank_by(&stats, RankMetric::TotalReturn);
        let order: Vec<&str> = ranked.iter().map(|r| r.ticker.as_str()).collect();
        assert_eq!(order, vec!["B", "A", "C"]);
        assert_eq!(ranked[0].rank, 1);
    }

    #[test]
    fn empty_series_yields_no_stats() {
        let ticker = Ticker::parse("NONE").expect("ticker");
        let empty = PriceSeries::new(ticker, Vec::new()).expect("series");
        assert!(ticker_statistics(&empty).is_none());
    }
}
