use thiserror::Error;

use stockpick_core::{
    FetchError, PortfolioError, ProviderError, StoreError, ValidationError,
};
use stockpick_forecast::ForecastError;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Portfolio(#[from] PortfolioError),

    #[error(transparent)]
    Forecast(#[from] ForecastError),

    #[error("{0}; retry once the provider is reachable again")]
    Provider(ProviderError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("strict mode failed: warnings={warning_count}, errors={error_count}")]
    StrictModeViolation {
        warning_count: usize,
        error_count: usize,
    },

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<FetchError> for CliError {
    fn from(error: FetchError) -> Self {
        match error {
            FetchError::Provider(provider) => Self::Provider(provider),
            FetchError::Cache(store) => Self::Store(store),
        }
    }
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 2,
            Self::Portfolio(_) => 2,
            Self::Forecast(_) => 2,
            Self::Serialization(_) => 4,
            Self::StrictModeViolation { .. } => 5,
            Self::Provider(_) => 6,
            Self::Store(_) => 10,
            Self::Io(_) => 10,
        }
    }
}
