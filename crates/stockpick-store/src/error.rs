use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by cache operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("portfolio name '{value}' is not usable as a directory name")]
    InvalidPortfolioName { value: String },

    #[error("symbol '{value}' is not usable as a file name")]
    InvalidSymbolName { value: String },

    #[error("cache entry {path} is corrupt: {detail}")]
    Corrupt { path: PathBuf, detail: String },

    #[error("cache I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("cache JSON error: {0}")]
    Serde(#[from] serde_json::Error),
}
