//! The fetch pass: cache check, provider calls, cache write-through.
//!
//! One call to [`Fetcher::fetch`] serves one user request. Tickers are
//! processed sequentially in portfolio order; a ticker whose fetch fails
//! non-fatally is excluded and reported, a fatal provider error aborts the
//! batch and leaves previously cached data untouched.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use stockpick_store::{BarRecord, InfoRecord, PortfolioCache, RangeRecord, StoreError};

use crate::domain::{
    format_iso_date, parse_iso_date, DailyBar, DateRange, Portfolio, PriceSeries, Ticker,
    TickerInfo,
};
use crate::provider::{MarketDataProvider, ProviderError, ProviderId};
use crate::ValidationError;

/// Fetch-level failure. Only fatal conditions surface here; per-ticker
/// problems are collected in [`MarketDataSet::failures`].
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("provider failure: {0}")]
    Provider(ProviderError),

    #[error(transparent)]
    Cache(#[from] StoreError),
}

/// Everything fetched for one ticker.
#[derive(Debug, Clone, PartialEq)]
pub struct TickerData {
    pub info: TickerInfo,
    pub series: PriceSeries,
}

/// A ticker excluded from the dataset, with the reason.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchFailure {
    pub ticker: Ticker,
    pub error: ProviderError,
}

/// The merged in-memory dataset one fetch pass produces.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketDataSet {
    pub range: DateRange,
    pub tickers: Vec<TickerData>,
    pub failures: Vec<FetchFailure>,
    pub cache_hits: usize,
    pub warnings: Vec<String>,
}

impl MarketDataSet {
    pub fn get(&self, ticker: &Ticker) -> Option<&TickerData> {
        self.tickers.iter().find(|data| data.series.ticker() == ticker)
    }

    pub fn series(&self) -> impl Iterator<Item = &PriceSeries> {
        self.tickers.iter().map(|data| &data.series)
    }

    pub fn len(&self) -> usize {
        self.tickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }
}

/// Fetches portfolio data through the cache.
pub struct Fetcher {
    provider: Arc<dyn MarketDataProvider>,
    cache: PortfolioCache,
}

impl Fetcher {
    pub fn new(provider: Arc<dyn MarketDataProvider>, cache: PortfolioCache) -> Self {
        Self { provider, cache }
    }

    pub fn provider_id(&self) -> ProviderId {
        self.provider.id()
    }

    /// Fetch info and history for every ticker in the portfolio.
    ///
    /// A ticker cached for a superset of `range` is served from disk and
    /// sliced; everything else goes to the provider and is written back to
    /// the cache. Cache write problems degrade to warnings.
    pub async fn fetch(
        &self,
        portfolio: &Portfolio,
        range: DateRange,
    ) -> Result<MarketDataSet, FetchError> {
        let mut dataset = MarketDataSet {
            range,
            tickers: Vec::with_capacity(portfolio.len()),
            failures: Vec::new(),
            cache_hits: 0,
            warnings: Vec::new(),
        };

        for ticker in portfolio.tickers() {
            match self.load_cached(ticker, &range) {
                Ok(Some(data)) => {
                    debug!(%ticker, %range, "serving from cache");
                    dataset.cache_hits += 1;
                    dataset.tickers.push(data);
                    continue;
                }
                Ok(None) => {}
                Err(warning) => {
                    warn!(%ticker, %warning, "unreadable cache entry, refetching");
                    dataset.warnings.push(warning);
                }
            }

            match self.fetch_remote(ticker, &range).await {
                Ok((data, mut warnings)) => {
                    dataset.warnings.append(&mut warnings);
                    dataset.tickers.push(data);
                }
                Err(error) if error.is_fatal() => {
                    warn!(%ticker, %error, "aborting batch on fatal provider error");
                    return Err(FetchError::Provider(error));
                }
                Err(error) => {
                    info!(%ticker, %error, "excluding ticker from dataset");
                    dataset.failures.push(FetchFailure {
                        ticker: ticker.clone(),
                        error,
                    });
                }
            }
        }

        info!(
            portfolio = portfolio.name(),
            fetched = dataset.len(),
            failed = dataset.failures.len(),
            cache_hits = dataset.cache_hits,
            "fetch pass complete"
        );
        Ok(dataset)
    }

    async fn fetch_remote(
        &self,
        ticker: &Ticker,
        range: &DateRange,
    ) -> Result<(TickerData, Vec<String>), ProviderError> {
        let info = self.provider.info(ticker).await?;
        let series = self.provider.history(ticker, *range).await?;
        let mut warnings = Vec::new();

        if let Err(error) = self.store(ticker, range, &info, &series) {
            // A failed cache write only costs a refetch next time.
            warnings.push(format!("cache write for {ticker} failed: {error}"));
        }

        Ok((TickerData { info, series }, warnings))
    }

    fn store(
        &self,
        ticker: &Ticker,
        range: &DateRange,
        info: &TickerInfo,
        series: &PriceSeries,
    ) -> Result<(), StoreError> {
        self.cache.store_info(ticker.as_str(), &info_to_record(info))?;
        self.cache.store_series(
            ticker.as_str(),
            &RangeRecord {
                start: format_iso_date(range.start()),
                end: format_iso_date(range.end()),
            },
            &series_to_records(series),
        )
    }

    /// `Ok(Some)` on a usable superset entry, `Ok(None)` on a clean miss,
    /// `Err(warning)` when the entry exists but cannot be trusted.
    fn load_cached(
        &self,
        ticker: &Ticker,
        range: &DateRange,
    ) -> Result<Option<TickerData>, String> {
        let describe = |error: &dyn std::fmt::Display| format!("cache entry for {ticker}: {error}");

        let Some(cached_range) = self
            .cache
            .cached_range(ticker.as_str())
            .map_err(|error| describe(&error))?
        else {
            return Ok(None);
        };

        let cached_range = DateRange::parse(&cached_range.start, &cached_range.end)
            .map_err(|error| describe(&error))?;
        if !cached_range.covers(range) {
            debug!(%ticker, cached = %cached_range, requested = %range, "cached range too narrow");
            return Ok(None);
        }

        let Some(info_record) = self
            .cache
            .load_info(ticker.as_str())
            .map_err(|error| describe(&error))?
        else {
            return Ok(None);
        };
        let Some(bar_records) = self
            .cache
            .load_series(ticker.as_str())
            .map_err(|error| describe(&error))?
        else {
            return Ok(None);
        };

        let info = record_to_info(info_record).map_err(|error| describe(&error))?;
        let series =
            records_to_series(ticker, bar_records).map_err(|error| describe(&error))?;
        // A range manifest is only ever written next to a non-empty bar
        // file, so an empty series means the entry is damaged.
        if series.is_empty() {
            return Err(describe(&"bar file holds no rows"));
        }

        Ok(Some(TickerData {
            info,
            series: series.slice(range),
        }))
    }
}

// ---------------------------------------------------------------------------
// Domain <-> cache record conversion
// ---------------------------------------------------------------------------

fn info_to_record(info: &TickerInfo) -> InfoRecord {
    InfoRecord {
        symbol: info.ticker.as_str().to_owned(),
        name: info.name.clone(),
        exchange: info.exchange.clone(),
        currency: info.currency.clone(),
        sector: info.sector.clone(),
        description: info.description.clone(),
        market_cap: info.market_cap,
        pe_ratio: info.pe_ratio,
        dividend_yield: info.dividend_yield,
    }
}

fn record_to_info(record: InfoRecord) -> Result<TickerInfo, ValidationError> {
    TickerInfo::new(
        Ticker::parse(&record.symbol)?,
        record.name,
        record.exchange,
        record.currency,
        record.sector,
        record.description,
        record.market_cap,
        record.pe_ratio,
        record.dividend_yield,
    )
}

fn series_to_records(series: &PriceSeries) -> Vec<BarRecord> {
    series
        .bars()
        .iter()
        .map(|bar| BarRecord {
            date: format_iso_date(bar.date),
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
        })
        .collect()
}

fn records_to_series(
    ticker: &Ticker,
    records: Vec<BarRecord>,
) -> Result<PriceSeries, ValidationError> {
    let mut bars = Vec::with_capacity(records.len());
    for record in records {
        bars.push(DailyBar::new(
            parse_iso_date(&record.date)?,
            record.open,
            record.high,
            record.low,
            record.close,
            record.volume,
        )?);
    }
    PriceSeries::new(ticker.clone(), bars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::StaticProvider;
    use tempfile::tempdir;

    fn ticker(symbol: &str) -> Ticker {
        Ticker::parse(symbol).expect("ticker")
    }

    fn portfolio(symbols: &str) -> Portfolio {
        Portfolio::parse("test", symbols).expect("portfolio").portfolio
    }

    fn range(start: &str, end: &str) -> DateRange {
        DateRange::parse(start, end).expect("range")
    }

    fn fetcher_with(provider: StaticProvider, dir: &std::path::Path) -> Fetcher {
        let cache = PortfolioCache::open(dir, "test").expect("cache");
        Fetcher::new(Arc::new(provider), cache)
    }

    #[tokio::test]
    async fn fetch_populates_dataset_and_cache() {
        let temp = tempdir().expect("tempdir");
        let wide = range("2024-01-01", "2024-06-30");
        let provider =
            StaticProvider::seeded(&[ticker("AAPL"), ticker("MSFT")], &wide);
        let fetcher = fetcher_with(provider, temp.path());

        let dataset = fetcher
            .fetch(&portfolio("AAPL\nMSFT\n"), wide)
            .await
            .expect("fetch");

        assert_eq!(dataset.len(), 2);
        assert!(dataset.failures.is_empty());
        assert_eq!(dataset.cache_hits, 0);

        // Everything within range, strictly ordered by construction.
        for series in dataset.series() {
            assert!(wide.contains(series.first_date().expect("first")));
            assert!(wide.contains(series.last_date().expect("last")));
        }
    }

    #[tokio::test]
    async fn second_fetch_is_served_from_cache() {
        let temp = tempdir().expect("tempdir");
        let wide = range("2024-01-01", "2024-06-30");
        let provider = StaticProvider::seeded(&[ticker("AAPL")], &wide);
        let fetcher = fetcher_with(provider, temp.path());

        let first = fetcher
            .fetch(&portfolio("AAPL\n"), wide)
            .await
            .expect("first fetch");
        assert_eq!(first.cache_hits, 0);

        // Narrower range is covered by the cached entry; provider would
        // fail if consulted because the fixture below is removed.
        let narrow = range("2024-02-01", "2024-03-31");
        let empty_provider = StaticProvider::new();
        let cache = PortfolioCache::open(temp.path(), "test").expect("cache");
        let cached_fetcher = Fetcher::new(Arc::new(empty_provider), cache);

        let second = cached_fetcher
            .fetch(&portfolio("AAPL\n"), narrow)
            .await
            .expect("second fetch");
        assert_eq!(second.cache_hits, 1);
        assert_eq!(second.len(), 1);
        let series = &second.tickers[0].series;
        assert!(narrow.contains(series.first_date().expect("first")));
        assert!(narrow.contains(series.last_date().expect("last")));
    }

    #[tokio::test]
    async fn wider_request_invalidates_cached_entry() {
        let temp = tempdir().expect("tempdir");
        let narrow = range("2024-02-01", "2024-03-31");
        let provider = StaticProvider::seeded(&[ticker("AAPL")], &narrow);
        let fetcher = fetcher_with(provider, temp.path());

        fetcher
            .fetch(&portfolio("AAPL\n"), narrow)
            .await
            .expect("seed the cache");

        // The wider request must bypass the cache and hit the provider.
        let wide = range("2024-01-01", "2024-06-30");
        let wide_provider = StaticProvider::seeded(&[ticker("AAPL")], &wide);
        let cache = PortfolioCache::open(temp.path(), "test").expect("cache");
        let wide_fetcher = Fetcher::new(Arc::new(wide_provider), cache);

        let dataset = wide_fetcher
            .fetch(&portfolio("AAPL\n"), wide)
            .await
            .expect("fetch");
        assert_eq!(dataset.cache_hits, 0);
        assert_eq!(dataset.len(), 1);
    }

    #[tokio::test]
    async fn unknown_ticker_is_isolated() {
        let temp = tempdir().expect("tempdir");
        let wide = range("2024-01-01", "2024-06-30");
        let provider = StaticProvider::seeded(&[ticker("AAPL")], &wide);
        let fetcher = fetcher_with(provider, temp.path());

        let dataset = fetcher
            .fetch(&portfolio("AAPL\nNOPE\n"), wide)
            .await
            .expect("fetch");

        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.failures.len(), 1);
        assert_eq!(dataset.failures[0].ticker, ticker("NOPE"));
    }

    #[tokio::test]
    async fn fatal_provider_error_aborts_but_keeps_cache() {
        let temp = tempdir().expect("tempdir");
        let wide = range("2024-01-01", "2024-06-30");
        let provider = StaticProvider::seeded(&[ticker("AAPL")], &wide);
        let fetcher = fetcher_with(provider, temp.path());
        fetcher
            .fetch(&portfolio("AAPL\n"), wide)
            .await
            .expect("seed the cache");

        let mut broken = StaticProvider::seeded(&[ticker("AAPL")], &wide);
        broken.fail_all(ProviderError::connection("refused"));
        let cache = PortfolioCache::open(temp.path(), "test").expect("cache");
        let broken_fetcher = Fetcher::new(Arc::new(broken), cache);

        // Cache still covers the original range, so this succeeds offline.
        let cached = broken_fetcher
            .fetch(&portfolio("AAPL\n"), wide)
            .await
            .expect("cache-served fetch");
        assert_eq!(cached.cache_hits, 1);

        // A wider request must go out and hits the outage.
        let wider = range("2023-01-01", "2024-06-30");
        let error = broken_fetcher
            .fetch(&portfolio("AAPL\n"), wider)
            .await
            .expect_err("must abort");
        assert!(matches!(error, FetchError::Provider(_)));

        // The cached files survive the aborted batch.
        let cache = PortfolioCache::open(temp.path(), "test").expect("cache");
        assert!(cache.load_series("AAPL").expect("load").is_some());
    }
}
