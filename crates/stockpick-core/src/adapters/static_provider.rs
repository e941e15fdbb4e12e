//! Deterministic in-memory provider.
//!
//! Serves installed fixtures, or seeded synthetic walks for offline runs.
//! Tests use it to exercise the pipeline without a network; error
//! injection simulates unknown symbols and provider outages.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use time::{Date, Weekday};

use crate::domain::{DailyBar, DateRange, PriceSeries, Ticker, TickerInfo};
use crate::provider::{MarketDataProvider, ProviderError, ProviderId};

#[derive(Debug, Clone)]
struct Entry {
    info: TickerInfo,
    bars: Vec<DailyBar>,
}

/// In-memory provider with deterministic contents.
#[derive(Debug, Default)]
pub struct StaticProvider {
    entries: HashMap<Ticker, Entry>,
    failures: HashMap<Ticker, ProviderError>,
    outage: Option<ProviderError>,
}

impl StaticProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider pre-populated with a synthetic random walk per ticker,
    /// derived only from the ticker text, so repeated runs agree.
    pub fn seeded(tickers: &[Ticker], range: &DateRange) -> Self {
        let mut provider = Self::new();
        for ticker in tickers {
            let entry = synthetic_entry(ticker, range);
            provider.entries.insert(ticker.clone(), entry);
        }
        provider
    }

    /// Install an explicit fixture for a ticker.
    pub fn insert(&mut self, info: TickerInfo, bars: Vec<DailyBar>) {
        let ticker = info.ticker.clone();
        self.entries.insert(ticker, Entry { info, bars });
    }

    /// Make every call for `ticker` fail with `error`.
    pub fn fail_ticker(&mut self, ticker: Ticker, error: ProviderError) {
        self.failures.insert(ticker, error);
    }

    /// Make every call fail with `error`, simulating a provider outage.
    pub fn fail_all(&mut self, error: ProviderError) {
        self.outage = Some(error);
    }

    fn lookup(&self, ticker: &Ticker) -> Result<&Entry, ProviderError> {
        if let Some(error) = &self.outage {
            return Err(error.clone());
        }
        if let Some(error) = self.failures.get(ticker) {
            return Err(error.clone());
        }
        self.entries
            .get(ticker)
            .ok_or_else(|| ProviderError::unknown_symbol(ticker))
    }
}

impl MarketDataProvider for StaticProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Static
    }

    fn info<'a>(
        &'a self,
        ticker: &'a Ticker,
    ) -> Pin<Box<dyn Future<Output = Result<TickerInfo, ProviderError>> + Send + 'a>> {
        let result = self.lookup(ticker).map(|entry| entry.info.clone());
        Box::pin(async move { result })
    }

    fn history<'a>(
        &'a self,
        ticker: &'a Ticker,
        range: DateRange,
    ) -> Pin<Box<dyn Future<Output = Result<PriceSeries, ProviderError>> + Send + 'a>> {
        let result = self.lookup(ticker).and_then(|entry| {
            let bars: Vec<DailyBar> = entry
                .bars
                .iter()
                .filter(|bar| range.contains(bar.date))
                .cloned()
                .collect();
            if bars.is_empty() {
                return Err(ProviderError::no_data(
                    ticker,
                    format!("no fixture data between {range}"),
                ));
            }
            PriceSeries::new(ticker.clone(), bars)
                .map_err(|error| ProviderError::decode(ticker, error.to_string()))
        });
        Box::pin(async move { result })
    }
}

// ---------------------------------------------------------------------------
// Synthetic series generation
// ---------------------------------------------------------------------------

fn seed_from(ticker: &Ticker) -> u64 {
    ticker.as_str().bytes().fold(0x9E37_79B9_7F4A_7C15, |acc, byte| {
        (acc.rotate_left(7) ^ u64::from(byte)).wrapping_mul(0x100_0000_01B3)
    })
}

fn next_unit(state: &mut u64) -> f64 {
    // Plain LCG; quality is irrelevant, determinism is the point.
    *state = state
        .wrapping_mul(6_364_136_223_846_793_005)
        .wrapping_add(1_442_695_040_888_963_407);
    (*state >> 11) as f64 / (1u64 << 53) as f64
}

fn synthetic_entry(ticker: &Ticker, range: &DateRange) -> Entry {
    let mut state = seed_from(ticker);
    let mut price = 40.0 + next_unit(&mut state) * 160.0;
    let mut bars = Vec::new();

    let mut date: Option<Date> = Some(range.start());
    while let Some(current) = date {
        if current > range.end() {
            break;
        }
        if !matches!(current.weekday(), Weekday::Saturday | Weekday::Sunday) {
            let step = (next_unit(&mut state) * 2.0 - 1.0) * 0.02 * price;
            let open = price;
            let close = (price + step).max(1.0);
            let high = open.max(close) * (1.0 + next_unit(&mut state) * 0.005);
            let low = (open.min(close) * (1.0 - next_unit(&mut state) * 0.005)).max(0.5);
            let volume = 1_000_000 + (next_unit(&mut state) * 9_000_000.0) as u64;

            if let Ok(bar) = DailyBar::new(current, open, high, low, close, Some(volume)) {
                bars.push(bar);
            }
            price = close;
        }
        date = current.next_day();
    }

    let info = TickerInfo::new(
        ticker.clone(),
        format!("{ticker} Demo Co."),
        Some(String::from("DEMO")),
        "USD",
        Some(String::from("Synthetic")),
        None,
        Some(1.0e9 + next_unit(&mut state) * 9.0e9),
        Some(10.0 + next_unit(&mut state) * 30.0),
        None,
    )
    .expect("synthetic info is always valid");

    Entry { info, bars }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticker(symbol: &str) -> Ticker {
        Ticker::parse(symbol).expect("ticker")
    }

    fn range() -> DateRange {
        DateRange::parse("2024-01-01", "2024-03-31").expect("range")
    }

    #[tokio::test]
    async fn seeded_series_are_deterministic() {
        let tickers = vec![ticker("AAPL")];
        let a = StaticProvider::seeded(&tickers, &range());
        let b = StaticProvider::seeded(&tickers, &range());

        let series_a = a.history(&tickers[0], range()).await.expect("series");
        let series_b = b.history(&tickers[0], range()).await.expect("series");
        assert_eq!(series_a, series_b);
        assert!(series_a.len() > 50);
    }

    #[tokio::test]
    async fn seeded_series_skip_weekends_and_stay_in_range() {
        let tickers = vec![ticker("MSFT")];
        let provider = StaticProvider::seeded(&tickers, &range());
        let series = provider.history(&tickers[0], range()).await.expect("series");

        for bar in series.bars() {
            assert!(range().contains(bar.date));
            assert!(!matches!(
                bar.date.weekday(),
                Weekday::Saturday | Weekday::Sunday
            ));
        }
    }

    #[tokio::test]
    async fn unknown_ticker_is_a_non_fatal_failure() {
        let provider = StaticProvider::new();
        let error = provider
            .history(&ticker("NOPE"), range())
            .await
            .expect_err("must fail");
        assert!(!error.is_fatal());
    }

    #[tokio::test]
    async fn outage_injection_is_fatal() {
        let mut provider = StaticProvider::seeded(&[ticker("AAPL")], &range());
        provider.fail_all(ProviderError::provider_down("maintenance window"));

        let error = provider
            .info(&ticker("AAPL"))
            .await
            .expect_err("must fail");
        assert!(error.is_fatal());
    }
}
