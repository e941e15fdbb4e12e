//! Univariate close-price forecasting.
//!
//! For each ticker the engine splits the series into a training prefix
//! and a trailing backtest window, fits a difference model on the prefix,
//! scores multi-step forecasts against the held-out closes, then refits
//! on the full series and emits forward forecasts with analytic
//! confidence intervals.
//!
//! Two models are supported:
//!
//! | Model | Behavior |
//! |-------|----------|
//! | `naive-drift` | next close = last close + mean historical daily change |
//! | `autoregressive` | AR(p) on daily differences, order chosen from a fixed lag grid |
//!
//! Interval half-widths grow as z·σ·√k with σ the in-sample residual
//! stddev, treating per-step forecast errors as independent.

mod model;

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;
use time::Date;
use tracing::debug;

use stockpick_core::domain::iso_date_serde;
use stockpick_core::{next_weekday, MarketDataSet, PriceSeries, Ticker};

use crate::model::{fit_autoregressive, fit_naive_drift, normal_quantile_two_sided, DiffModelFit};

pub use crate::model::LAG_GRID;

/// Minimum training observations before a model may be fitted.
pub const MIN_TRAINING_OBSERVATIONS: usize = 30;

/// Default held-out window length for backtesting.
pub const DEFAULT_BACKTEST_WINDOW: usize = 28;

/// Which forecasting model to fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ModelKind {
    #[serde(rename = "naive-drift")]
    NaiveDrift,
    #[serde(rename = "autoregressive")]
    Autoregressive,
}

impl ModelKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NaiveDrift => "naive-drift",
            Self::Autoregressive => "autoregressive",
        }
    }
}

impl Display for ModelKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = ForecastError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "naive-drift" => Ok(Self::NaiveDrift),
            "autoregressive" => Ok(Self::Autoregressive),
            other => Err(ForecastError::UnknownModel {
                value: other.to_owned(),
            }),
        }
    }
}

/// Forecasting parameters for one request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastConfig {
    pub model: ModelKind,
    /// Forward steps to forecast (trading days).
    pub horizon: usize,
    /// Trailing observations held out for backtesting.
    pub backtest_window: usize,
    /// Two-sided confidence level for interval bounds, in (0, 1).
    pub confidence: f64,
}

impl ForecastConfig {
    pub fn new(model: ModelKind, horizon: usize) -> Self {
        Self {
            model,
            horizon,
            backtest_window: DEFAULT_BACKTEST_WINDOW,
            confidence: 0.95,
        }
    }

    pub fn with_backtest_window(mut self, backtest_window: usize) -> Self {
        self.backtest_window = backtest_window;
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    fn validate(&self) -> Result<(), ForecastError> {
        if self.horizon == 0 {
            return Err(ForecastError::InvalidConfig {
                detail: String::from("horizon must be at least 1"),
            });
        }
        if self.backtest_window == 0 {
            return Err(ForecastError::InvalidConfig {
                detail: String::from("backtest window must be at least 1"),
            });
        }
        if !(self.confidence > 0.0 && self.confidence < 1.0) {
            return Err(ForecastError::InvalidConfig {
                detail: format!("confidence {} is outside (0, 1)", self.confidence),
            });
        }
        Ok(())
    }
}

/// Forecasting errors. `InsufficientHistory` is per-ticker and non-fatal
/// for a batch; the rest indicate a bad request.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ForecastError {
    #[error("training history has {observations} observations, {required} required")]
    InsufficientHistory { observations: usize, required: usize },

    #[error("unknown model '{value}', expected one of naive-drift, autoregressive")]
    UnknownModel { value: String },

    #[error("invalid forecast configuration: {detail}")]
    InvalidConfig { detail: String },
}

impl ForecastError {
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InsufficientHistory { .. } => "forecast.insufficient_history",
            Self::UnknownModel { .. } => "forecast.unknown_model",
            Self::InvalidConfig { .. } => "forecast.invalid_config",
        }
    }
}

/// One forward step: point estimate with interval bounds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastPoint {
    #[serde(with = "iso_date_serde")]
    pub date: Date,
    pub mean: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Backtest error metrics over the held-out window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestReport {
    pub window: usize,
    pub mae: f64,
    pub rmse: f64,
}

/// Forecast output for one ticker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastResult {
    pub ticker: Ticker,
    pub model: ModelKind,
    pub confidence: f64,
    pub backtest: BacktestReport,
    pub points: Vec<ForecastPoint>,
}

/// A ticker whose forecast was omitted, with the reason.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastFailure {
    pub ticker: Ticker,
    pub error: ForecastError,
}

/// Per-ticker outcomes for a whole dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastBatch {
    pub results: Vec<ForecastResult>,
    pub failures: Vec<ForecastFailure>,
}

/// Forecast every ticker in the dataset, isolating per-ticker failures.
pub fn forecast_dataset(
    dataset: &MarketDataSet,
    config: &ForecastConfig,
) -> Result<ForecastBatch, ForecastError> {
    config.validate()?;

    let mut batch = ForecastBatch {
        results: Vec::new(),
        failures: Vec::new(),
    };
    for series in dataset.series() {
        match forecast_ticker(series, config) {
            Ok(result) => batch.results.push(result),
            Err(error) => batch.failures.push(ForecastFailure {
                ticker: series.ticker().clone(),
                error,
            }),
        }
    }
    Ok(batch)
}

/// Fit, backtest, and forecast one ticker's series.
pub fn forecast_ticker(
    series: &PriceSeries,
    config: &ForecastConfig,
) -> Result<ForecastResult, ForecastError> {
    config.validate()?;

    let closes = series.closes();
    let training_len = closes.len().saturating_sub(config.backtest_window);
    if training_len < MIN_TRAINING_OBSERVATIONS {
        return Err(ForecastError::InsufficientHistory {
            observations: training_len,
            required: MIN_TRAINING_OBSERVATIONS,
        });
    }

    // Backtest: fit on the prefix, score multi-step forecasts against the
    // held-out closes.
    let (training, held_out) = closes.split_at(training_len);
    let training_fit = fit(config.model, &differences(training));
    let last_training_close = training[training.len() - 1];
    let predicted = walk_forward(
        &training_fit,
        &differences(training),
        last_training_close,
        held_out.len(),
    );
    let backtest = score_backtest(&predicted, held_out);
    debug!(
        ticker = %series.ticker(),
        model = %config.model,
        mae = backtest.mae,
        rmse = backtest.rmse,
        "backtest complete"
    );

    // Refit on the full series for the forward forecast.
    let full_diffs = differences(&closes);
    let full_fit = fit(config.model, &full_diffs);
    let last_close = closes[closes.len() - 1];
    let forward = walk_forward(&full_fit, &full_diffs, last_close, config.horizon);

    let z = normal_quantile_two_sided(config.confidence);
    let sigma = full_fit.residual_stddev;
    let last_date = series.last_date().ok_or(ForecastError::InsufficientHistory {
        observations: 0,
        required: MIN_TRAINING_OBSERVATIONS,
    })?;

    let mut points = Vec::with_capacity(config.horizon);
    let mut date = last_date;
    for (step, &mean) in forward.iter().enumerate() {
        date = next_weekday(date);
        let half_width = z * sigma * ((step + 1) as f64).sqrt();
        points.push(ForecastPoint {
            date,
            mean,
            lower: mean - half_width,
            upper: mean + half_width,
        });
    }

    Ok(ForecastResult {
        ticker: series.ticker().clone(),
        model: config.model,
        confidence: config.confidence,
        backtest,
        points,
    })
}

fn fit(model: ModelKind, diffs: &[f64]) -> DiffModelFit {
    match model {
        ModelKind::NaiveDrift => fit_naive_drift(diffs),
        ModelKind::Autoregressive => fit_autoregressive(diffs),
    }
}

fn differences(closes: &[f64]) -> Vec<f64> {
    closes.windows(2).map(|pair| pair[1] - pair[0]).collect()
}

/// Turn predicted differences into a predicted close path.
fn walk_forward(
    fit: &DiffModelFit,
    history_diffs: &[f64],
    last_close: f64,
    steps: usize,
) -> Vec<f64> {
    let diffs = fit.forecast_diffs(history_diffs, steps);
    let mut closes = Vec::with_capacity(steps);
    let mut price = last_close;
    for diff in diffs {
        price += diff;
        closes.push(price);
    }
    closes
}

fn score_backtest(predicted: &[f64], actual: &[f64]) -> BacktestReport {
    let n = predicted.len().min(actual.len());
    if n == 0 {
        return BacktestReport {
            window: 0,
            mae: 0.0,
            rmse: 0.0,
        };
    }

    let mut abs_sum = 0.0;
    let mut sq_sum = 0.0;
    for (p, a) in predicted.iter().zip(actual.iter()) {
        let error = p - a;
        abs_sum += error.abs();
        sq_sum += error * error;
    }

    BacktestReport {
        window: n,
        mae: abs_sum / n as f64,
        rmse: (sq_sum / n as f64).sqrt(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockpick_core::DailyBar;

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
                    None,
                )
                .expect("bar");
                date = stockpick_core::next_weekday(date);
                bar
            })
            .collect();
        PriceSeries::new(ticker, bars).expect("series")
    }

    fn config(model: ModelKind) -> ForecastConfig {
        ForecastConfig::new(model, 5).with_backtest_window(10)
    }

    #[test]
    fn naive_drift_on_constant_series_forecasts_the_constant() {
        let constant = series("FLAT", &[42.0; 60]);
        let result =
            forecast_ticker(&constant, &config(ModelKind::NaiveDrift)).expect("forecast");

        for point in &result.points {
            assert_eq!(point.mean, 42.0);
            assert_eq!(point.lower, 42.0);
            assert_eq!(point.upper, 42.0);
        }
        assert_eq!(result.backtest.mae, 0.0);
    }

    #[test]
    fn autoregressive_on_constant_series_forecasts_the_constant() {
        let constant = series("FLAT", &[42.0; 60]);
        let result =
            forecast_ticker(&constant, &config(ModelKind::Autoregressive)).expect("forecast");

        for point in &result.points {
            assert!((point.mean - 42.0).abs() < 1e-9);
        }
    }

    #[test]
    fn insufficient_history_below_thirty_training_observations() {
        // 39 closes minus a 10-bar window leaves 29 training observations.
        let short = series("SHORT", &[50.0; 39]);
        let error =
            forecast_ticker(&short, &config(ModelKind::NaiveDrift)).expect_err("must fail");
        assert_eq!(
            error,
            ForecastError::InsufficientHistory {
                observations: 29,
                required: 30
            }
        );

        // Exactly 30 training observations is accepted.
        let exact = series("EXACT", &[50.0; 40]);
        assert!(forecast_ticker(&exact, &config(ModelKind::NaiveDrift)).is_ok());
    }

    #[test]
    fn horizon_dates_strictly_follow_the_series_and_skip_weekends() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64 * 0.1).collect();
        let data = series("TREND", &closes);
        let result = forecast_ticker(&data, &config(ModelKind::NaiveDrift)).expect("forecast");

        let last = data.last_date().expect("last date");
        let mut previous = last;
        for point in &result.points {
            assert!(point.date > previous);
            assert!(!matches!(
                point.date.weekday(),
                time::Weekday::Saturday | time::Weekday::Sunday
            ));
            previous = point.date;
        }
    }

    #[test]
    fn drift_forecast_extends_a_linear_trend() {
        // Perfectly linear closes: drift = 1.0 per step, zero residual.
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let data = series("LINE", &closes);
        let result = forecast_ticker(&data, &config(ModelKind::NaiveDrift)).expect("forecast");

        assert_eq!(result.backtest.mae, 0.0);
        let last = closes[closes.len() - 1];
        for (step, point) in result.points.iter().enumerate() {
            assert!((point.mean - (last + (step + 1) as f64)).abs() < 1e-9);
        }
    }

    #[test]
    fn intervals_widen_with_the_horizon() {
        // Alternating moves give a nonzero residual stddev.
        let closes: Vec<f64> = (0..60)
            .map(|i| if i % 2 == 0 { 100.0 } else { 102.0 })
            .collect();
        let data = series("CHOP", &closes);
        let result = forecast_ticker(&data, &config(ModelKind::NaiveDrift)).expect("forecast");

        let widths: Vec<f64> = result
            .points
            .iter()
            .map(|point| point.upper - point.lower)
            .collect();
        assert!(widths[0] > 0.0);
        for pair in widths.windows(2) {
            assert!(pair[1] > pair[0]);
        }
    }

    #[test]
    fn model_kind_parses_recognized_values_only() {
        assert_eq!(
            "naive-drift".parse::<ModelKind>().expect("parse"),
            ModelKind::NaiveDrift
        );
        assert_eq!(
            " Autoregressive ".parse::<ModelKind>().expect("parse"),
            ModelKind::Autoregressive
        );
        assert!(matches!(
            "arima".parse::<ModelKind>(),
            Err(ForecastError::UnknownModel { .. })
        ));
    }

    #[test]
    fn zero_horizon_is_rejected() {
        let data = series("FLAT", &[42.0; 60]);
        let bad = ForecastConfig::new(ModelKind::NaiveDrift, 0);
        assert!(matches!(
            forecast_ticker(&data, &bad),
            Err(ForecastError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn dataset_batch_isolates_per_ticker_failures() {
        let range = stockpick_core::DateRange::parse("2024-01-01", "2024-12-31").expect("range");
        let info = |ticker: &Ticker| {
            stockpick_core::TickerInfo::new(
                ticker.clone(),
                ticker.as_str(),
                None,
                "USD",
                None,
                None,
                None,
                None,
                None,
            )
            .expect("info")
        };
        let long = series("LONG", &[100.0; 60]);
        let short = series("SHORT", &[100.0; 12]);
        let dataset = stockpick_core::MarketDataSet {
            range,
            tickers: vec![
                stockpick_core::TickerData {
                    info: info(long.ticker()),
                    series: long,
                },
                stockpick_core::TickerData {
                    info: info(short.ticker()),
                    series: short,
                },
            ],
            failures: Vec::new(),
            cache_hits: 0,
            warnings: Vec::new(),
        };

        let batch =
            forecast_dataset(&dataset, &config(ModelKind::NaiveDrift)).expect("batch");
        assert_eq!(batch.results.len(), 1);
        assert_eq!(batch.failures.len(), 1);
        assert_eq!(batch.failures[0].ticker.as_str(), "SHORT");
        assert!(matches!(
            batch.failures[0].error,
            ForecastError::InsufficientHistory { .. }
        ));
    }
}
