//! On-disk cache for portfolio market data.
//!
//! The cache holds one directory per portfolio. Within a portfolio
//! directory every ticker owns three flat files:
//!
//! | File | Contents |
//! |------|----------|
//! | `<SYMBOL>.info.json` | instrument metadata and fundamentals |
//! | `<SYMBOL>.bars.csv` | daily OHLCV rows (`date,open,high,low,close,volume`) |
//! | `<SYMBOL>.range.json` | the date range the bar file covers |
//!
//! Records are plain serde structs with string dates; interpreting them as
//! validated domain types is the caller's job. All writes go through a
//! temporary file followed by a rename, so readers never observe a torn
//! file even when two processes race on the same entry.

mod cache;
mod error;
mod records;

pub use cache::{CacheEntryStatus, PortfolioCache};
pub use error::StoreError;
pub use records::{BarRecord, InfoRecord, RangeRecord};
