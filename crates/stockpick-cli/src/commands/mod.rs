mod cache;
mod fetch;
mod forecast;
mod report;
mod stats;

use std::time::Instant;

use serde_json::Value;

use stockpick_core::{DateRange, MarketDataSet, Portfolio};

use crate::cli::{Cli, Command, FetchArgs};
use crate::envelope::{Envelope, EnvelopeError, EnvelopeMeta};
use crate::error::CliError;
use crate::session::Session;

pub struct CommandResult {
    pub data: Value,
    pub warnings: Vec<String>,
    pub errors: Vec<EnvelopeError>,
    pub cache_hits: usize,
}

impl CommandResult {
    pub fn ok(data: Value) -> Self {
        Self {
            data,
            warnings: Vec::new(),
            errors: Vec::new(),
            cache_hits: 0,
        }
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings.extend(warnings);
        self
    }

    pub fn with_errors(mut self, errors: Vec<EnvelopeError>) -> Self {
        self.errors.extend(errors);
        self
    }

    pub fn with_cache_hits(mut self, cache_hits: usize) -> Self {
        self.cache_hits = cache_hits;
        self
    }
}

pub async fn run(cli: &Cli) -> Result<Envelope<Value>, CliError> {
    let session = Session::from_cli(cli);
    let started = Instant::now();

    let result = match &cli.command {
        Command::Fetch(args) => fetch::run(&session, args).await?,
        Command::Stats(args) => stats::run(&session, args).await?,
        Command::Forecast(args) => forecast::run(&session, args).await?,
        Command::Report(args) => report::run(&session, args).await?,
        Command::Cache(args) => cache::run(&session, args)?,
    };

    let mut meta = EnvelopeMeta::new(command_name(&cli.command), session.provider_id());
    meta.latency_ms = started.elapsed().as_millis() as u64;
    meta.cache_hits = result.cache_hits;
    meta.warnings = result.warnings;

    Ok(Envelope {
        meta,
        data: result.data,
        errors: result.errors,
    })
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Fetch(_) => "fetch",
        Command::Stats(_) => "stats",
        Command::Forecast(_) => "forecast",
        Command::Report(_) => "report",
        Command::Cache(_) => "cache",
    }
}

/// Output of the shared fetch stage every data command starts with.
pub(crate) struct StageData {
    pub portfolio: Portfolio,
    pub range: DateRange,
    pub dataset: MarketDataSet,
    pub warnings: Vec<String>,
    pub errors: Vec<EnvelopeError>,
}

/// Load the portfolio, resolve the range, and run one fetch pass,
/// folding skipped lines and per-ticker failures into warnings/errors.
pub(crate) async fn fetch_stage(
    session: &Session,
    args: &FetchArgs,
) -> Result<StageData, CliError> {
    let parse = session.load_portfolio(&args.portfolio)?;
    let range = session.resolve_range(&args.start, &args.end)?;

    let mut warnings: Vec<String> = parse
        .skipped
        .iter()
        .map(|skipped| {
            format!(
                "line {}: '{}' skipped ({})",
                skipped.line, skipped.content, skipped.reason
            )
        })
        .collect();

    let fetcher = session.fetcher(&parse.portfolio, &range)?;
    let dataset = fetcher.fetch(&parse.portfolio, range).await?;
    warnings.extend(dataset.warnings.iter().cloned());

    let errors: Vec<EnvelopeError> = dataset
        .failures
        .iter()
        .map(|failure| {
            EnvelopeError::new(failure.error.code(), failure.error.message())
                .with_ticker(failure.ticker.as_str())
        })
        .collect();

    Ok(StageData {
        portfolio: parse.portfolio,
        range,
        dataset,
        warnings,
        errors,
    })
}
