//! Per-invocation context.
//!
//! One [`Session`] is built from the parsed CLI and passed to every
//! command; pipeline stages never reach for ambient global state.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use time::{Duration, OffsetDateTime};
use tracing::debug;

use stockpick_core::{
    DateRange, Fetcher, Portfolio, PortfolioCache, PortfolioParse, ProviderId,
    ReqwestHttpClient, StaticProvider, YahooAdapter,
};

use crate::cli::Cli;
use crate::error::CliError;

const DATA_DIR_ENV: &str = "STOCKPICK_DATA_DIR";
const DEFAULT_RANGE_DAYS: i64 = 5 * 365;

/// Everything one command invocation needs: cache root, provider choice,
/// and timeouts.
#[derive(Debug, Clone)]
pub struct Session {
    data_dir: PathBuf,
    offline: bool,
    timeout_ms: u64,
}

impl Session {
    pub fn from_cli(cli: &Cli) -> Self {
        let data_dir = cli
            .data_dir
            .clone()
            .or_else(|| std::env::var(DATA_DIR_ENV).ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("data"));

        Self {
            data_dir,
            offline: cli.offline,
            timeout_ms: cli.timeout_ms,
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn provider_id(&self) -> ProviderId {
        if self.offline {
            ProviderId::Static
        } else {
            ProviderId::Yahoo
        }
    }

    /// Read and parse a portfolio file. The file stem names the portfolio
    /// (and its cache directory).
    pub fn load_portfolio(&self, path: &Path) -> Result<PortfolioParse, CliError> {
        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("portfolio")
            .to_owned();
        let content = std::fs::read_to_string(path)?;
        debug!(portfolio = %name, path = %path.display(), "loaded portfolio file");
        Ok(Portfolio::parse(name, &content)?)
    }

    /// Resolve the requested range; the end defaults to today (UTC) and
    /// the start to five years earlier.
    pub fn resolve_range(
        &self,
        start: &Option<String>,
        end: &Option<String>,
    ) -> Result<DateRange, CliError> {
        let end_date = match end {
            Some(value) => stockpick_core::parse_iso_date(value)?,
            None => OffsetDateTime::now_utc().date(),
        };
        let start_date = match start {
            Some(value) => stockpick_core::parse_iso_date(value)?,
            None => end_date - Duration::days(DEFAULT_RANGE_DAYS),
        };
        Ok(DateRange::new(start_date, end_date)?)
    }

    pub fn open_cache(&self, portfolio_name: &str) -> Result<PortfolioCache, CliError> {
        Ok(PortfolioCache::open(&self.data_dir, portfolio_name)?)
    }

    /// Build the fetcher for one pass: cache plus either the real provider
    /// or a synthetic one seeded from the portfolio.
    pub fn fetcher(
        &self,
        portfolio: &Portfolio,
        range: &DateRange,
    ) -> Result<Fetcher, CliError> {
        let cache = self.open_cache(portfolio.name())?;
        let fetcher = if self.offline {
            Fetcher::new(
                Arc::new(StaticProvider::seeded(portfolio.tickers(), range)),
                cache,
            )
        } else {
            let http = Arc::new(ReqwestHttpClient::new());
            Fetcher::new(
                Arc::new(YahooAdapter::new(http).with_timeout_ms(self.timeout_ms)),
                cache,
            )
        };
        Ok(fetcher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(args)
    }

    #[test]
    fn explicit_data_dir_wins() {
        let cli = cli(&[
            "stockpick",
            "--data-dir",
            "/tmp/elsewhere",
            "cache",
            "status",
            "demo",
        ]);
        let session = Session::from_cli(&cli);
        assert_eq!(session.data_dir(), Path::new("/tmp/elsewhere"));
    }

    #[test]
    fn offline_flag_selects_the_static_provider() {
        let cli = cli(&["stockpick", "--offline", "cache", "status", "demo"]);
        let session = Session::from_cli(&cli);
        assert_eq!(session.provider_id(), ProviderId::Static);
    }

    #[test]
    fn range_defaults_cover_five_years() {
        let cli = cli(&["stockpick", "cache", "status", "demo"]);
        let session = Session::from_cli(&cli);
        let range = session.resolve_range(&None, &None).expect("range");
        assert_eq!(range.calendar_days(), DEFAULT_RANGE_DAYS + 1);
    }

    #[test]
    fn explicit_range_is_validated() {
        let cli = cli(&["stockpick", "cache", "status", "demo"]);
        let session = Session::from_cli(&cli);
        let result = session.resolve_range(
            &Some(String::from("2024-06-01")),
            &Some(String::from("2024-01-01")),
        );
        assert!(result.is_err());
    }
}
