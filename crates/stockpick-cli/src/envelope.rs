//! Response envelope for machine-readable output.
//!
//! Every command renders `{meta, data, errors}`. Per-ticker failures are
//! reported in `errors` with stable codes while the command still exits
//! with the data it could produce.

use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use stockpick_core::ProviderId;

/// Standard response envelope for all machine-readable outputs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope<T> {
    pub meta: EnvelopeMeta,
    pub data: T,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<EnvelopeError>,
}

/// Metadata attached to every envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnvelopeMeta {
    pub command: String,
    pub provider: ProviderId,
    pub generated_at: String,
    pub latency_ms: u64,
    pub cache_hits: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl EnvelopeMeta {
    pub fn new(command: impl Into<String>, provider: ProviderId) -> Self {
        Self {
            command: command.into(),
            provider,
            generated_at: OffsetDateTime::now_utc()
                .format(&Rfc3339)
                .unwrap_or_else(|_| String::from("<unformattable>")),
            latency_ms: 0,
            cache_hits: 0,
            warnings: Vec::new(),
        }
    }
}

/// Structured error payload for partial or failed responses.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnvelopeError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticker: Option<String>,
}

impl EnvelopeError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            ticker: None,
        }
    }

    pub fn with_ticker(mut self, ticker: impl Into<String>) -> Self {
        self.ticker = Some(ticker.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_errors_and_warnings_are_omitted_from_json() {
        let envelope = Envelope {
            meta: EnvelopeMeta::new("stats", ProviderId::Static),
            data: serde_json::json!({"ok": true}),
            errors: Vec::new(),
        };
        let rendered = serde_json::to_string(&envelope).expect("serialize");
        assert!(!rendered.contains("\"errors\""));
        assert!(!rendered.contains("\"warnings\""));
    }

    #[test]
    fn ticker_errors_carry_code_and_symbol() {
        let error = EnvelopeError::new("provider.unknown_symbol", "no such symbol")
            .with_ticker("NOPE");
        let rendered = serde_json::to_string(&error).expect("serialize");
        assert!(rendered.contains("provider.unknown_symbol"));
        assert!(rendered.contains("NOPE"));
    }
}
