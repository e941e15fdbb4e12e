//! # stockpick-core
//!
//! Domain types, provider contract, and the fetch pipeline for the
//! stockpick portfolio toolkit.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`domain`] | Validated domain models (Ticker, DailyBar, PriceSeries, Portfolio) |
//! | [`provider`] | `MarketDataProvider` contract and error classification |
//! | [`adapters`] | Provider implementations (Yahoo, deterministic static) |
//! | [`http_client`] | Transport seam (reqwest, noop, scripted test client) |
//! | [`fetch`] | The cache-aware fetch pass producing a `MarketDataSet` |
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use stockpick_core::{DateRange, Fetcher, Portfolio, ReqwestHttpClient, YahooAdapter};
//! use stockpick_store::PortfolioCache;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let parse = Portfolio::parse("big_tech", "AAPL\nMSFT\n")?;
//!     let range = DateRange::parse("2023-01-01", "2024-01-01")?;
//!
//!     let http = Arc::new(ReqwestHttpClient::new());
//!     let provider = Arc::new(YahooAdapter::new(http));
//!     let cache = PortfolioCache::open("data".as_ref(), parse.portfolio.name())?;
//!
//!     let dataset = Fetcher::new(provider, cache)
//!         .fetch(&parse.portfolio, range)
//!         .await?;
//!     println!("fetched {} tickers", dataset.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Error handling
//!
//! Per-ticker provider failures are collected in
//! [`MarketDataSet::failures`] and never abort the batch; fatal provider
//! failures ([`ProviderError::is_fatal`]) abort with
//! [`FetchError::Provider`] and leave the cache as it was.

pub mod adapters;
pub mod domain;
pub mod error;
pub mod fetch;
pub mod http_client;
pub mod provider;

pub use adapters::{StaticProvider, YahooAdapter};
pub use domain::{
    format_iso_date, next_weekday, parse_iso_date, validate_currency_code, DailyBar, DateRange,
    Portfolio, PortfolioParse, PriceSeries, SkippedLine, Ticker, TickerInfo,
};
pub use error::{PortfolioError, ValidationError};
pub use fetch::{FetchError, FetchFailure, Fetcher, MarketDataSet, TickerData};
pub use http_client::{
    HttpClient, HttpError, HttpRequest, HttpResponse, NoopHttpClient, ReqwestHttpClient,
    ScriptedHttpClient,
};
pub use provider::{MarketDataProvider, ProviderError, ProviderErrorKind, ProviderId};

// Cache types are re-exported so downstream crates depend on one surface.
pub use stockpick_store::{
    BarRecord, CacheEntryStatus, InfoRecord, PortfolioCache, RangeRecord, StoreError,
};
