//! Market-data provider contract.
//!
//! A provider exposes two capabilities: instrument metadata (`info`) and
//! historical daily bars (`history`). Errors carry a kind that decides the
//! partial-failure policy: non-fatal kinds exclude one ticker from the
//! batch, fatal kinds abort the whole fetch.

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::domain::{DateRange, PriceSeries, Ticker, TickerInfo};

/// Identifies a data provider implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderId {
    Yahoo,
    Static,
}

impl ProviderId {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Yahoo => "yahoo",
            Self::Static => "static",
        }
    }
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider error classification.
///
/// `UnknownSymbol`, `NoData`, and `Decode` affect a single ticker and are
/// isolated; `Connection`, `RateLimited`, and `ProviderDown` indicate the
/// provider itself is unreachable and abort the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    UnknownSymbol,
    NoData,
    Decode,
    Connection,
    RateLimited,
    ProviderDown,
}

/// Structured provider error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    kind: ProviderErrorKind,
    message: String,
    ticker: Option<Ticker>,
}

impl ProviderError {
    pub fn unknown_symbol(ticker: &Ticker) -> Self {
        Self {
            kind: ProviderErrorKind::UnknownSymbol,
            message: format!("provider does not recognize symbol '{ticker}'"),
            ticker: Some(ticker.clone()),
        }
    }

    pub fn no_data(ticker: &Ticker, message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::NoData,
            message: message.into(),
            ticker: Some(ticker.clone()),
        }
    }

    pub fn decode(ticker: &Ticker, message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::Decode,
            message: message.into(),
            ticker: Some(ticker.clone()),
        }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::Connection,
            message: message.into(),
            ticker: None,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::RateLimited,
            message: message.into(),
            ticker: None,
        }
    }

    pub fn provider_down(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::ProviderDown,
            message: message.into(),
            ticker: None,
        }
    }

    pub const fn kind(&self) -> ProviderErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn ticker(&self) -> Option<&Ticker> {
        self.ticker.as_ref()
    }

    /// Fatal errors abort the whole fetch batch; non-fatal errors exclude
    /// one ticker and let the rest proceed.
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self.kind,
            ProviderErrorKind::Connection
                | ProviderErrorKind::RateLimited
                | ProviderErrorKind::ProviderDown
        )
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            ProviderErrorKind::UnknownSymbol => "provider.unknown_symbol",
            ProviderErrorKind::NoData => "provider.no_data",
            ProviderErrorKind::Decode => "provider.decode",
            ProviderErrorKind::Connection => "provider.connection",
            ProviderErrorKind::RateLimited => "provider.rate_limited",
            ProviderErrorKind::ProviderDown => "provider.down",
        }
    }
}

impl Display for ProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for ProviderError {}

/// Provider adapter contract.
///
/// Implementations must be `Send + Sync`; methods return boxed futures so
/// the trait stays object-safe behind `Arc<dyn MarketDataProvider>`.
pub trait MarketDataProvider: Send + Sync {
    /// Unique provider identifier.
    fn id(&self) -> ProviderId;

    /// Fetch instrument metadata and fundamentals for one ticker.
    fn info<'a>(
        &'a self,
        ticker: &'a Ticker,
    ) -> Pin<Box<dyn Future<Output = Result<TickerInfo, ProviderError>> + Send + 'a>>;

    /// Fetch daily bars for one ticker over an inclusive date range.
    ///
    /// Returned bars must fall within the range with strictly increasing
    /// dates; adapters are responsible for dropping rows the upstream API
    /// returns outside it.
    fn history<'a>(
        &'a self,
        ticker: &'a Ticker,
        range: DateRange,
    ) -> Pin<Box<dyn Future<Output = Result<PriceSeries, ProviderError>> + Send + 'a>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatality_follows_error_kind() {
        let ticker = Ticker::parse("AAPL").expect("ticker");
        assert!(!ProviderError::unknown_symbol(&ticker).is_fatal());
        assert!(!ProviderError::no_data(&ticker, "empty window").is_fatal());
        assert!(ProviderError::connection("refused").is_fatal());
        assert!(ProviderError::rate_limited("429").is_fatal());
    }

    #[test]
    fn codes_are_stable() {
        assert_eq!(
            ProviderError::provider_down("503").code(),
            "provider.down"
        );
    }
}
