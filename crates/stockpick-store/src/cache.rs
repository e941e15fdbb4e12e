use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::StoreError;
use crate::records::{BarRecord, InfoRecord, RangeRecord};

const INFO_SUFFIX: &str = ".info.json";
const BARS_SUFFIX: &str = ".bars.csv";
const RANGE_SUFFIX: &str = ".range.json";

/// Per-ticker summary returned by [`PortfolioCache::status`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntryStatus {
    pub symbol: String,
    pub has_info: bool,
    pub bar_count: usize,
    pub cached_range: Option<RangeRecord>,
}

/// File-backed cache for one portfolio.
///
/// Opening the cache creates the portfolio directory under the data root.
/// Concurrent writers to the same entry are not coordinated beyond
/// atomic-rename file replacement; the last writer wins.
#[derive(Debug, Clone)]
pub struct PortfolioCache {
    dir: PathBuf,
    portfolio: String,
}

impl PortfolioCache {
    /// Open (and create if needed) the cache directory for a portfolio.
    pub fn open(root: &Path, portfolio: &str) -> Result<Self, StoreError> {
        validate_component(portfolio).map_err(|_| StoreError::InvalidPortfolioName {
            value: portfolio.to_owned(),
        })?;

        let dir = root.join(portfolio);
        fs::create_dir_all(&dir)?;
        debug!(portfolio, dir = %dir.display(), "opened portfolio cache");

        Ok(Self {
            dir,
            portfolio: portfolio.to_owned(),
        })
    }

    pub fn portfolio(&self) -> &str {
        &self.portfolio
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist instrument metadata for a symbol.
    pub fn store_info(&self, symbol: &str, info: &InfoRecord) -> Result<(), StoreError> {
        let payload = serde_json::to_vec_pretty(info)?;
        self.write_atomic(&self.entry_path(symbol, INFO_SUFFIX)?, &payload)
    }

    /// Load instrument metadata, `Ok(None)` when never cached.
    pub fn load_info(&self, symbol: &str) -> Result<Option<InfoRecord>, StoreError> {
        let path = self.entry_path(symbol, INFO_SUFFIX)?;
        let Some(bytes) = read_if_exists(&path)? else {
            return Ok(None);
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|error| StoreError::Corrupt {
                path,
                detail: error.to_string(),
            })
    }

    /// Persist a bar series together with the range it covers.
    pub fn store_series(
        &self,
        symbol: &str,
        range: &RangeRecord,
        bars: &[BarRecord],
    ) -> Result<(), StoreError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for bar in bars {
            writer.serialize(bar)?;
        }
        let payload = writer
            .into_inner()
            .map_err(|error| std::io::Error::other(error.to_string()))?;

        self.write_atomic(&self.entry_path(symbol, BARS_SUFFIX)?, &payload)?;
        self.write_atomic(
            &self.entry_path(symbol, RANGE_SUFFIX)?,
            &serde_json::to_vec_pretty(range)?,
        )?;
        debug!(symbol, bars = bars.len(), "cached bar series");
        Ok(())
    }

    /// Load a cached bar series, `Ok(None)` when never cached.
    pub fn load_series(&self, symbol: &str) -> Result<Option<Vec<BarRecord>>, StoreError> {
        let path = self.entry_path(symbol, BARS_SUFFIX)?;
        let Some(bytes) = read_if_exists(&path)? else {
            return Ok(None);
        };

        let mut reader = csv::Reader::from_reader(bytes.as_slice());
        let mut bars = Vec::new();
        for row in reader.deserialize() {
            let bar: BarRecord = row.map_err(|error| StoreError::Corrupt {
                path: path.clone(),
                detail: error.to_string(),
            })?;
            bars.push(bar);
        }
        Ok(Some(bars))
    }

    /// The date range the cached bar file covers, if any.
    pub fn cached_range(&self, symbol: &str) -> Result<Option<RangeRecord>, StoreError> {
        let path = self.entry_path(symbol, RANGE_SUFFIX)?;
        let Some(bytes) = read_if_exists(&path)? else {
            return Ok(None);
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|error| StoreError::Corrupt {
                path,
                detail: error.to_string(),
            })
    }

    /// Per-ticker summary of what the portfolio directory holds.
    pub fn status(&self) -> Result<Vec<CacheEntryStatus>, StoreError> {
        let mut symbols: Vec<String> = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let name = entry?.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(symbol) = name.strip_suffix(BARS_SUFFIX) {
                symbols.push(symbol.to_owned());
            }
        }
        symbols.sort();

        let mut statuses = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            let bar_count = self.load_series(&symbol)?.map_or(0, |bars| bars.len());
            statuses.push(CacheEntryStatus {
                has_info: self.load_info(&symbol)?.is_some(),
                bar_count,
                cached_range: self.cached_range(&symbol)?,
                symbol,
            });
        }
        Ok(statuses)
    }

    /// Remove every cache file for this portfolio. Returns the number of
    /// files deleted; the directory itself is kept.
    pub fn clear(&self) -> Result<usize, StoreError> {
        let mut removed = 0;
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.is_file() {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }
        debug!(portfolio = %self.portfolio, removed, "cleared portfolio cache");
        Ok(removed)
    }

    fn entry_path(&self, symbol: &str, suffix: &str) -> Result<PathBuf, StoreError> {
        validate_component(symbol).map_err(|_| StoreError::InvalidSymbolName {
            value: symbol.to_owned(),
        })?;
        Ok(self.dir.join(format!("{symbol}{suffix}")))
    }

    fn write_atomic(&self, path: &Path, payload: &[u8]) -> Result<(), StoreError> {
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, payload)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

// Read a file's bytes, yielding `Ok(None)` when the file does not exist.
fn read_if_exists(path: &Path) -> Result<Option<Vec<u8>>, StoreError> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(error) => Err(StoreError::Io(error)),
    }
}

// Portfolio names and symbols become path components; anything that could
// escape the cache directory is rejected.
fn validate_component(value: &str) -> Result<(), ()> {
    if value.is_empty() || value.len() > 64 {
        return Err(());
    }
    let safe = value
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-' | '_'));
    if !safe || value.starts_with('.') {
        return Err(());
    }
    Ok(())
}
