use serde::{Deserialize, Serialize};
use time::Date;

use crate::domain::date::{format_iso_date, iso_date_serde, DateRange};
use crate::{Ticker, ValidationError};

/// One trading day's OHLCV values for a ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    #[serde(with = "iso_date_serde")]
    pub date: Date,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: Option<u64>,
}

impl DailyBar {
    pub fn new(
        date: Date,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: Option<u64>,
    ) -> Result<Self, ValidationError> {
        validate_non_negative("open", open)?;
        validate_non_negative("high", high)?;
        validate_non_negative("low", low)?;
        validate_non_negative("close", close)?;

        if high < low {
            return Err(ValidationError::InvalidBarRange);
        }
        if open < low || open > high || close < low || close > high {
            return Err(ValidationError::InvalidBarBounds);
        }

        Ok(Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        })
    }
}

/// Daily bars for one ticker, ordered by strictly increasing date.
///
/// The ordering invariant is enforced at construction; missing trading days
/// are simply absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSeries {
    ticker: Ticker,
    bars: Vec<DailyBar>,
}

impl PriceSeries {
    pub fn new(ticker: Ticker, bars: Vec<DailyBar>) -> Result<Self, ValidationError> {
        for pair in bars.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(ValidationError::OutOfOrderBars {
                    date: format_iso_date(pair[1].date),
                });
            }
        }
        Ok(Self { ticker, bars })
    }

    pub fn ticker(&self) -> &Ticker {
        &self.ticker
    }

    pub fn bars(&self) -> &[DailyBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first_date(&self) -> Option<Date> {
        self.bars.first().map(|bar| bar.date)
    }

    pub fn last_date(&self) -> Option<Date> {
        self.bars.last().map(|bar| bar.date)
    }

    /// Closing prices in date order.
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|bar| bar.close).collect()
    }

    /// Natural-log returns between consecutive closes; one element shorter
    /// than the series.
    pub fn daily_log_returns(&self) -> Vec<f64> {
        self.bars
            .windows(2)
            .map(|pair| (pair[1].close / pair[0].close).ln())
            .collect()
    }

    /// The sub-series whose bars fall within `range`. Ordering is preserved,
    /// so the invariant holds without revalidation.
    pub fn slice(&self, range: &DateRange) -> Self {
        Self {
            ticker: self.ticker.clone(),
            bars: self
                .bars
                .iter()
                .filter(|bar| range.contains(bar.date))
                .cloned()
                .collect(),
        }
    }
}

/// Instrument metadata and slow-moving financial metrics for a ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerInfo {
    pub ticker: Ticker,
    pub name: String,
    pub exchange: Option<String>,
    pub currency: String,
    pub sector: Option<String>,
    pub description: Option<String>,
    pub market_cap: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub dividend_yield: Option<f64>,
}

impl TickerInfo {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        ticker: Ticker,
        name: impl Into<String>,
        exchange: Option<String>,
        currency: impl AsRef<str>,
        sector: Option<String>,
        description: Option<String>,
        market_cap: Option<f64>,
        pe_ratio: Option<f64>,
        dividend_yield: Option<f64>,
    ) -> Result<Self, ValidationError> {
        validate_optional_non_negative("market_cap", market_cap)?;
        validate_optional_finite("pe_ratio", pe_ratio)?;
        validate_optional_non_negative("dividend_yield", dividend_yield)?;

        Ok(Self {
            ticker,
            name: name.into(),
            exchange,
            currency: validate_currency_code(currency.as_ref())?,
            sector,
            description,
            market_cap,
            pe_ratio,
            dividend_yield,
        })
    }
}

/// Validate and normalize a currency to an uppercase 3-letter code.
pub fn validate_currency_code(input: &str) -> Result<String, ValidationError> {
    let normalized = input.trim().to_ascii_uppercase();
    let is_valid = normalized.len() == 3 && normalized.chars().all(|ch| ch.is_ascii_alphabetic());

    if !is_valid {
        return Err(ValidationError::InvalidCurrency {
            value: input.to_owned(),
        });
    }

    Ok(normalized)
}

fn validate_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field });
    }
    Ok(())
}

fn validate_optional_non_negative(
    field: &'static str,
    value: Option<f64>,
) -> Result<(), ValidationError> {
    if let Some(value) = value {
        validate_non_negative(field, value)?;
    }
    Ok(())
}

fn validate_optional_finite(
    field: &'static str,
    value: Option<f64>,
) -> Result<(), ValidationError> {
    if let Some(value) = value {
        if !value.is_finite() {
            return Err(ValidationError::NonFiniteValue { field });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::date::parse_iso_date;

    fn date(value: &str) -> Date {
        parse_iso_date(value).expect("test date")
    }

    fn bar(day: &str, close: f64) -> DailyBar {
        DailyBar::new(date(day), close, close + 1.0, close - 1.0, close, Some(100))
            .expect("test bar")
    }

    #[test]
    fn validates_currency() {
        assert_eq!(
            validate_currency_code("usd").expect("must normalize"),
            "USD"
        );
        assert!(matches!(
            validate_currency_code("USDT"),
            Err(ValidationError::InvalidCurrency { .. })
        ));
    }

    #[test]
    fn rejects_invalid_bar_bounds() {
        let err = DailyBar::new(date("2024-01-02"), 10.0, 12.0, 9.0, 12.5, Some(10))
            .expect_err("must fail");
        assert!(matches!(err, ValidationError::InvalidBarBounds));
    }

    #[test]
    fn rejects_high_below_low() {
        let err = DailyBar::new(date("2024-01-02"), 10.0, 9.0, 11.0, 10.0, None)
            .expect_err("must fail");
        assert!(matches!(err, ValidationError::InvalidBarRange));
    }

    #[test]
    fn series_requires_strictly_increasing_dates() {
        let ticker = Ticker::parse("AAPL").expect("ticker");
        let err = PriceSeries::new(
            ticker,
            vec![bar("2024-01-03", 10.0), bar("2024-01-03", 11.0)],
        )
        .expect_err("must fail");
        assert!(matches!(err, ValidationError::OutOfOrderBars { .. }));
    }

    #[test]
    fn slice_keeps_only_bars_in_range() {
        let ticker = Ticker::parse("AAPL").expect("ticker");
        let series = PriceSeries::new(
            ticker,
            vec![
                bar("2024-01-02", 10.0),
                bar("2024-01-03", 11.0),
                bar("2024-02-01", 12.0),
            ],
        )
        .expect("series");

        let range = DateRange::parse("2024-01-01", "2024-01-31").expect("range");
        let sliced = series.slice(&range);
        assert_eq!(sliced.len(), 2);
        assert_eq!(sliced.last_date(), Some(date("2024-01-03")));
    }

    #[test]
    fn log_returns_have_expected_length_and_sign() {
        let ticker = Ticker::parse("AAPL").expect("ticker");
        let series = PriceSeries::new(
            ticker,
            vec![bar("2024-01-02", 10.0), bar("2024-01-03", 11.0)],
        )
        .expect("series");

        let returns = series.daily_log_returns();
        assert_eq!(returns.len(), 1);
        assert!(returns[0] > 0.0);
    }
}
