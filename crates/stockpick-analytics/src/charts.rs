//! Chart-ready series.
//!
//! These functions reduce a dataset to plain `(date, value)` rows or
//! small aggregate records; rendering them is the presentation layer's
//! concern.

use serde::Serialize;
use time::Date;

use stockpick_core::domain::iso_date_serde;
use stockpick_core::{MarketDataSet, PriceSeries, Ticker};

use crate::stats::{sample_stddev, TRADING_DAYS_PER_YEAR};

/// One `(date, value)` sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    #[serde(with = "iso_date_serde")]
    pub date: Date,
    pub value: f64,
}

/// A named line of samples for one ticker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub ticker: Ticker,
    pub points: Vec<ChartPoint>,
}

/// Closes rebased to 100.0 at each ticker's first observation, making
/// price evolution comparable across tickers.
pub fn normalized_prices(dataset: &MarketDataSet) -> Vec<ChartSeries> {
    dataset
        .series()
        .filter_map(|series| {
            let first = series.bars().first()?.close;
            if first == 0.0 {
                return None;
            }
            Some(ChartSeries {
                ticker: series.ticker().clone(),
                points: series
                    .bars()
                    .iter()
                    .map(|bar| ChartPoint {
                        date: bar.date,
                        value: bar.close / first * 100.0,
                    })
                    .collect(),
            })
        })
        .collect()
}

/// Annualized volatility over a trailing window of daily log returns.
/// Each point is stamped with the window's final date; series shorter
/// than the window produce no points.
pub fn rolling_volatility(series: &PriceSeries, window: usize) -> ChartSeries {
    let returns = series.daily_log_returns();
    let mut points = Vec::new();

    if window > 0 && returns.len() >= window {
        for end in window..=returns.len() {
            let slice = &returns[end - window..end];
            points.push(ChartPoint {
                // Return k is realized on bar k+1.
                date: series.bars()[end].date,
                value: sample_stddev(slice) * TRADING_DAYS_PER_YEAR.sqrt(),
            });
        }
    }

    ChartSeries {
        ticker: series.ticker().clone(),
        points,
    }
}

/// Rolling volatility for every ticker in the dataset.
pub fn rolling_volatility_all(dataset: &MarketDataSet, window: usize) -> Vec<ChartSeries> {
    dataset
        .series()
        .map(|series| rolling_volatility(series, window))
        .collect()
}

/// One calendar year aggregated to a candle: first open, max high,
/// min low, last close.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearlyCandle {
    pub year: i32,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// Relative open-to-close change for the year, in percent.
    pub change_pct: f64,
}

/// Aggregate a daily series into one candle per calendar year.
pub fn yearly_candles(series: &PriceSeries) -> Vec<YearlyCandle> {
    let mut candles: Vec<YearlyCandle> = Vec::new();

    for bar in series.bars() {
        let year = bar.date.year();
        match candles.last_mut() {
            Some(candle) if candle.year == year => {
                candle.high = candle.high.max(bar.high);
                candle.low = candle.low.min(bar.low);
                candle.close = bar.close;
            }
            _ => candles.push(YearlyCandle {
                year,
                open: bar.open,
                high: bar.high,
                low: bar.low,
                close: bar.close,
                change_pct: 0.0,
            }),
        }
    }

    for candle in &mut candles {
        candle.change_pct = if candle.open != 0.0 {
            (candle.close - candle.open) / candle.open * 100.0
        } else {
            0.0
        };
    }
    candles
}

/// Moments of daily log returns grouped by calendar month, a compact
/// seasonality profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyReturnProfile {
    /// Calendar month, 1..=12.
    pub month: u8,
    pub observations: usize,
    pub mean_return: f64,
    pub stddev_return: f64,
}

/// Group a series' daily log returns by the calendar month they were
/// realized in. Months with no observations are omitted.
pub fn monthly_return_profile(series: &PriceSeries) -> Vec<MonthlyReturnProfile> {
    let mut buckets: [Vec<f64>; 12] = Default::default();

    for pair in series.bars().windows(2) {
        let month = pair[1].date.month() as usize;
        buckets[month - 1].push((pair[1].close / pair[0].close).ln());
    }

    buckets
        .iter()
        .enumerate()
        .filter(|(_, returns)| !returns.is_empty())
        .map(|(index, returns)| MonthlyReturnProfile {
            month: index as u8 + 1,
            observations: returns.len(),
            mean_return: returns.iter().sum::<f64>() / returns.len() as f64,
            stddev_return: sample_stddev(returns),
        })
        .collect()
}
