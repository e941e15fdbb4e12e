//! Descriptive statistics and chart-ready series.
//!
//! Everything in this crate is a pure, deterministic function of an
//! in-memory dataset; there is no I/O and no randomness. Volatility is
//! annualized as stddev of daily log returns times √252 (fixed
//! trading-day convention).

mod charts;
mod correlation;
mod stats;

pub use charts::{
    monthly_return_profile, normalized_prices, rolling_volatility, rolling_volatility_all,
    yearly_candles, ChartPoint, ChartSeries, MonthlyReturnProfile, YearlyCandle,
};
pub use correlation::{correlation_matrix, CorrelationMatrix};
pub use stats::{
    price_statistics, rank_by, ticker_statistics, RankMetric, RankedTicker, TickerStats,
    TRADING_DAYS_PER_YEAR,
};
