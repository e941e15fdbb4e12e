//! CLI argument definitions.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `fetch` | Download and cache portfolio data |
//! | `stats` | Summary statistics, rankings, correlation, chart series |
//! | `forecast` | Backtested forward forecasts per ticker |
//! | `report` | The full pipeline in one pass |
//! | `cache` | Inspect or clear a portfolio's cache directory |
//!
//! # Global options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `table` | Output format (table, json, ndjson) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--strict` | `false` | Treat warnings and per-ticker errors as failures |
//! | `--data-dir` | `$STOCKPICK_DATA_DIR` or `./data` | Cache root directory |
//! | `--offline` | `false` | Serve deterministic synthetic data, no network |
//! | `--timeout-ms` | `10000` | Provider request timeout |

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use stockpick_forecast::ModelKind;

/// Compare and forecast the market performance of a ticker portfolio.
///
/// Reads a portfolio file (one ticker per line), downloads daily price
/// history and instrument metadata, caches both on disk, and renders
/// statistics, chart-ready series, and model forecasts.
#[derive(Debug, Parser)]
#[command(
    name = "stockpick",
    author,
    version,
    about = "Portfolio statistics and forecasting from daily market data"
)]
pub struct Cli {
    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Treat warnings and per-ticker errors as failures (exit code 5).
    #[arg(long, global = true, default_value_t = false)]
    pub strict: bool,

    /// Cache root directory. Falls back to $STOCKPICK_DATA_DIR, then ./data.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Serve deterministic synthetic data instead of calling the provider.
    #[arg(long, global = true, default_value_t = false)]
    pub offline: bool,

    /// Provider request timeout in milliseconds.
    #[arg(long, global = true, default_value_t = 10_000)]
    pub timeout_ms: u64,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable metadata plus indented data.
    Table,
    /// Single JSON object output.
    Json,
    /// Newline-delimited JSON (one object per line).
    Ndjson,
}

/// Forecasting model selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModelChoice {
    /// Last close plus the historical mean daily change.
    NaiveDrift,
    /// Autoregression on daily changes, order picked from a small lag grid.
    Autoregressive,
}

impl From<ModelChoice> for ModelKind {
    fn from(choice: ModelChoice) -> Self {
        match choice {
            ModelChoice::NaiveDrift => ModelKind::NaiveDrift,
            ModelChoice::Autoregressive => ModelKind::Autoregressive,
        }
    }
}

/// Available CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// 📥 Download portfolio data into the cache.
    ///
    /// # Examples
    ///
    ///   stockpick fetch portfolios/big_tech.txt --start 2023-01-01 --end 2024-01-01
    Fetch(FetchArgs),

    /// 📊 Compute statistics, rankings, correlation, and chart series.
    ///
    /// # Examples
    ///
    ///   stockpick stats portfolios/big_tech.txt --start 2023-01-01 --end 2024-01-01
    ///   stockpick stats portfolios/big_tech.txt --window 10 --format json --pretty
    Stats(StatsArgs),

    /// 📈 Backtest a model per ticker and emit forward forecasts.
    ///
    /// # Examples
    ///
    ///   stockpick forecast portfolios/big_tech.txt --horizon 28
    ///   stockpick forecast portfolios/big_tech.txt --model autoregressive --confidence 0.9
    Forecast(ForecastArgs),

    /// 📋 Run the whole pipeline: fetch, statistics, and forecasts.
    ///
    /// # Examples
    ///
    ///   stockpick report portfolios/big_tech.txt --start 2020-01-01 --horizon 28
    Report(ReportArgs),

    /// 🗄️ Inspect or clear a portfolio's cache directory.
    ///
    /// # Examples
    ///
    ///   stockpick cache status big_tech
    ///   stockpick cache clear big_tech
    Cache(CacheArgs),
}

/// Arguments shared by every data-consuming command.
#[derive(Debug, Args)]
pub struct FetchArgs {
    /// Portfolio file, one ticker per line. The file stem names the
    /// cache directory.
    pub portfolio: PathBuf,

    /// Range start (YYYY-MM-DD). Defaults to five years before the end.
    #[arg(long)]
    pub start: Option<String>,

    /// Range end (YYYY-MM-DD). Defaults to today (UTC).
    #[arg(long)]
    pub end: Option<String>,
}

#[derive(Debug, Args)]
pub struct StatsArgs {
    #[command(flatten)]
    pub data: FetchArgs,

    /// Rolling volatility window in trading days.
    #[arg(long, default_value_t = 21)]
    pub window: usize,
}

#[derive(Debug, Args)]
pub struct ForecastArgs {
    #[command(flatten)]
    pub data: FetchArgs,

    /// Forward horizon in trading days.
    #[arg(long, default_value_t = 28)]
    pub horizon: usize,

    /// Forecasting model.
    #[arg(long, value_enum, default_value_t = ModelChoice::NaiveDrift)]
    pub model: ModelChoice,

    /// Trailing observations held out for the backtest.
    #[arg(long, default_value_t = 28)]
    pub backtest_window: usize,

    /// Two-sided confidence level for forecast intervals.
    #[arg(long, default_value_t = 0.95)]
    pub confidence: f64,
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    #[command(flatten)]
    pub forecast: ForecastArgs,

    /// Rolling volatility window in trading days.
    #[arg(long, default_value_t = 21)]
    pub window: usize,
}

#[derive(Debug, Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheCommand,
}

#[derive(Debug, Subcommand)]
pub enum CacheCommand {
    /// List cached tickers, bar counts, and covered ranges.
    Status {
        /// Portfolio name (the portfolio file's stem).
        name: String,
    },
    /// Delete every cache file for the portfolio.
    Clear {
        /// Portfolio name (the portfolio file's stem).
        name: String,
    },
}
