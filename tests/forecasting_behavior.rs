//! Behavior-driven tests for the forecasting engine.

use stockpick_forecast::{
    forecast_ticker, ForecastConfig, ForecastError, ModelKind, MIN_TRAINING_OBSERVATIONS,
};
use stockpick_tests::{constant_series, trending_series};

fn config(model: ModelKind) -> ForecastConfig {
    ForecastConfig::new(model, 10).with_backtest_window(20)
}

// =============================================================================
// Random-walk-with-drift null
// =============================================================================

#[test]
fn when_prices_never_move_both_models_forecast_the_constant_price() {
    // Given: A constant series comfortably above the history minimum
    let flat = constant_series("FLAT", "2024-01-01", 80, 123.45);

    for model in [ModelKind::NaiveDrift, ModelKind::Autoregressive] {
        // When: A forecast is produced
        let result = forecast_ticker(&flat, &config(model)).expect("forecast");

        // Then: Every horizon step is the constant with degenerate bounds
        assert_eq!(result.points.len(), 10);
        for point in &result.points {
            assert!((point.mean - 123.45).abs() < 1e-9, "model {model}");
            assert!((point.upper - point.lower).abs() < 1e-9, "model {model}");
        }
        assert!(result.backtest.mae < 1e-9);
    }
}

#[test]
fn when_prices_climb_linearly_the_drift_model_extends_the_line() {
    // Given: A perfect 0.5-per-day climb
    let line = trending_series("LINE", "2024-01-01", 90, 100.0, 0.5);

    // When: The naive-drift forecast is produced
    let result = forecast_ticker(&line, &config(ModelKind::NaiveDrift)).expect("forecast");

    // Then: The backtest is exact and the forward path continues the climb
    assert!(result.backtest.mae < 1e-9);
    assert!(result.backtest.rmse < 1e-9);
    let last = 100.0 + 0.5 * 89.0;
    for (step, point) in result.points.iter().enumerate() {
        let expected = last + 0.5 * (step + 1) as f64;
        assert!((point.mean - expected).abs() < 1e-9);
    }
}

// =============================================================================
// History minimum
// =============================================================================

#[test]
fn when_training_history_is_one_short_of_the_minimum_the_forecast_is_refused() {
    // Given: 49 closes and a 20-bar window leave 29 training observations
    let short = constant_series("SHORT", "2024-01-01", 49, 50.0);

    // When/Then: The forecast fails with the history error
    let error =
        forecast_ticker(&short, &config(ModelKind::NaiveDrift)).expect_err("must refuse");
    assert_eq!(
        error,
        ForecastError::InsufficientHistory {
            observations: MIN_TRAINING_OBSERVATIONS - 1,
            required: MIN_TRAINING_OBSERVATIONS,
        }
    );

    // And: One more observation is accepted
    let exact = constant_series("EXACT", "2024-01-01", 50, 50.0);
    assert!(forecast_ticker(&exact, &config(ModelKind::NaiveDrift)).is_ok());
}

// =============================================================================
// Horizon dates
// =============================================================================

#[test]
fn when_a_forecast_is_emitted_horizon_dates_strictly_follow_the_series() {
    // Given: A series ending mid-week
    let data = trending_series("DATES", "2024-01-01", 60, 100.0, 0.25);
    let last = data.last_date().expect("series has bars");

    // When: A forecast is produced
    let result = forecast_ticker(&data, &config(ModelKind::NaiveDrift)).expect("forecast");

    // Then: Dates are strictly increasing weekdays after the last bar
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

// =============================================================================
// Intervals
// =============================================================================

#[test]
fn when_residuals_are_nonzero_intervals_widen_monotonically() {
    // Given: A noisy alternating series
    let closes: Vec<f64> = (0..80)
        .map(|i| if i % 2 == 0 { 200.0 } else { 203.0 })
        .collect();
    let data = stockpick_tests::series_from("CHOP", "2024-01-01", &closes);

    // When: A 90% forecast is produced
    let result = forecast_ticker(
        &data,
        &config(ModelKind::NaiveDrift).with_confidence(0.90),
    )
    .expect("forecast");

    // Then: Bounds bracket the mean and widen with the horizon
    let mut last_width = 0.0;
    for point in &result.points {
        assert!(point.lower < point.mean && point.mean < point.upper);
        let width = point.upper - point.lower;
        assert!(width > last_width);
        last_width = width;
    }
}

#[test]
fn when_confidence_rises_intervals_get_wider() {
    let closes: Vec<f64> = (0..80)
        .map(|i| 150.0 + ((i * 7) % 5) as f64)
        .collect();
    let data = stockpick_tests::series_from("VAR", "2024-01-01", &closes);

    let narrow = forecast_ticker(
        &data,
        &config(ModelKind::NaiveDrift).with_confidence(0.80),
    )
    .expect("forecast");
    let wide = forecast_ticker(
        &data,
        &config(ModelKind::NaiveDrift).with_confidence(0.99),
    )
    .expect("forecast");

    let narrow_width = narrow.points[0].upper - narrow.points[0].lower;
    let wide_width = wide.points[0].upper - wide.points[0].lower;
    assert!(wide_width > narrow_width);
}

// =============================================================================
// Autoregression
// =============================================================================

#[test]
fn when_changes_mean_revert_the_autoregressive_model_beats_naive_drift_in_backtest() {
    // Given: Strongly mean-reverting daily changes (d_t = -0.8 d_{t-1})
    let mut closes = vec![100.0, 104.0];
    for _ in 0..118 {
        let n = closes.len();
        let diff = closes[n - 1] - closes[n - 2];
        closes.push(closes[n - 1] - 0.8 * diff);
    }
    let data = stockpick_tests::series_from("REVERT", "2024-01-01", &closes);

    // When: Both models are backtested on the same window
    let ar = forecast_ticker(&data, &config(ModelKind::Autoregressive)).expect("ar");
    let drift = forecast_ticker(&data, &config(ModelKind::NaiveDrift)).expect("drift");

    // Then: The autoregressive backtest error is strictly smaller
    assert!(ar.backtest.mae < drift.backtest.mae);
}
