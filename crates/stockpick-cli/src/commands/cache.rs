use serde::Serialize;

use stockpick_core::CacheEntryStatus;

use crate::cli::{CacheArgs, CacheCommand};
use crate::error::CliError;
use crate::session::Session;

use super::CommandResult;

#[derive(Debug, Serialize)]
struct CacheEntryRow {
    ticker: String,
    has_info: bool,
    bar_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    cached_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cached_end: Option<String>,
}

impl From<CacheEntryStatus> for CacheEntryRow {
    fn from(status: CacheEntryStatus) -> Self {
        let (cached_start, cached_end) = match status.cached_range {
            Some(range) => (Some(range.start), Some(range.end)),
            None => (None, None),
        };
        Self {
            ticker: status.symbol,
            has_info: status.has_info,
            bar_count: status.bar_count,
            cached_start,
            cached_end,
        }
    }
}

#[derive(Debug, Serialize)]
struct CacheStatusData {
    portfolio: String,
    entries: Vec<CacheEntryRow>,
}

#[derive(Debug, Serialize)]
struct CacheClearData {
    portfolio: String,
    removed_files: usize,
}

pub fn run(session: &Session, args: &CacheArgs) -> Result<CommandResult, CliError> {
    match &args.command {
        CacheCommand::Status { name } => {
            let cache = session.open_cache(name)?;
            let entries = cache
                .status()?
                .into_iter()
                .map(CacheEntryRow::from)
                .collect();
            let data = serde_json::to_value(CacheStatusData {
                portfolio: name.clone(),
                entries,
            })?;
            Ok(CommandResult::ok(data))
        }
        CacheCommand::Clear { name } => {
            let cache = session.open_cache(name)?;
            let removed_files = cache.clear()?;
            let data = serde_json::to_value(CacheClearData {
                portfolio: name.clone(),
                removed_files,
            })?;
            Ok(CommandResult::ok(data))
        }
    }
}
