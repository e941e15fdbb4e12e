//! Yahoo Finance adapter.
//!
//! Uses the unauthenticated chart and quoteSummary endpoints. Upstream
//! responses are decoded into loose serde structs first and then mapped
//! onto validated domain types; rows with missing OHLC values are dropped.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Deserialize;
use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::domain::{DailyBar, DateRange, PriceSeries, Ticker, TickerInfo};
use crate::http_client::{HttpClient, HttpError, HttpRequest, HttpResponse};
use crate::provider::{MarketDataProvider, ProviderError, ProviderId};

const CHART_BASE: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const SUMMARY_BASE: &str = "https://query1.finance.yahoo.com/v10/finance/quoteSummary";
const SUMMARY_MODULES: &str = "price%2CsummaryProfile%2CsummaryDetail";

/// Adapter for Yahoo Finance's unofficial JSON API.
pub struct YahooAdapter {
    http: Arc<dyn HttpClient>,
    timeout_ms: u64,
}

impl YahooAdapter {
    pub fn new(http: Arc<dyn HttpClient>) -> Self {
        Self {
            http,
            timeout_ms: 10_000,
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    async fn execute(
        &self,
        url: String,
        ticker: &Ticker,
    ) -> Result<HttpResponse, ProviderError> {
        let request = HttpRequest::get(url)
            .with_header("accept", "application/json")
            .with_timeout_ms(self.timeout_ms);

        let response = self
            .http
            .execute(request)
            .await
            .map_err(|error| map_transport_error(&error))?;

        if response.is_success() {
            return Ok(response);
        }

        Err(match response.status {
            404 => ProviderError::unknown_symbol(ticker),
            429 => ProviderError::rate_limited("Yahoo rate limit exceeded (HTTP 429)"),
            status if status >= 500 => {
                ProviderError::provider_down(format!("Yahoo returned HTTP {status}"))
            }
            status => ProviderError::no_data(
                ticker,
                format!("Yahoo returned unexpected HTTP {status}"),
            ),
        })
    }
}

fn map_transport_error(error: &HttpError) -> ProviderError {
    if error.is_timeout() {
        ProviderError::connection(format!("Yahoo request timed out: {error}"))
    } else {
        ProviderError::connection(format!("Yahoo unreachable: {error}"))
    }
}

fn unix_range(range: &DateRange) -> (i64, i64) {
    let start = range.start().midnight().assume_utc().unix_timestamp();
    // period2 is exclusive upstream; push it past the final requested day.
    let end = range
        .end()
        .next_day()
        .unwrap_or(range.end())
        .midnight()
        .assume_utc()
        .unix_timestamp();
    (start, end)
}

impl MarketDataProvider for YahooAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Yahoo
    }

    fn info<'a>(
        &'a self,
        ticker: &'a Ticker,
    ) -> Pin<Box<dyn Future<Output = Result<TickerInfo, ProviderError>> + Send + 'a>> {
        Box::pin(async move {
            let url = format!(
                "{SUMMARY_BASE}/{}?modules={SUMMARY_MODULES}",
                ticker.as_str()
            );
            let response = self.execute(url, ticker).await?;
            decode_info(ticker, &response.body)
        })
    }

    fn history<'a>(
        &'a self,
        ticker: &'a Ticker,
        range: DateRange,
    ) -> Pin<Box<dyn Future<Output = Result<PriceSeries, ProviderError>> + Send + 'a>> {
        Box::pin(async move {
            let (period1, period2) = unix_range(&range);
            let url = format!(
                "{CHART_BASE}/{}?interval=1d&period1={period1}&period2={period2}",
                ticker.as_str()
            );
            let response = self.execute(url, ticker).await?;
            decode_history(ticker, &range, &response.body)
        })
    }
}

// ---------------------------------------------------------------------------
// Upstream response shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ApiError {
    code: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartPayload,
}

#[derive(Debug, Deserialize)]
struct ChartPayload {
    result: Option<Vec<ChartResult>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    timestamp: Option<Vec<i64>>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    quote: Vec<ChartQuoteBlock>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartQuoteBlock {
    open: Option<Vec<Option<f64>>>,
    high: Option<Vec<Option<f64>>>,
    low: Option<Vec<Option<f64>>>,
    close: Option<Vec<Option<f64>>>,
    volume: Option<Vec<Option<u64>>>,
}

#[derive(Debug, Deserialize)]
struct SummaryEnvelope {
    #[serde(rename = "quoteSummary")]
    quote_summary: SummaryPayload,
}

#[derive(Debug, Deserialize)]
struct SummaryPayload {
    result: Option<Vec<SummaryResult>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct SummaryResult {
    price: Option<PriceModule>,
    #[serde(rename = "summaryProfile")]
    summary_profile: Option<ProfileModule>,
    #[serde(rename = "summaryDetail")]
    summary_detail: Option<DetailModule>,
}

#[derive(Debug, Deserialize)]
struct PriceModule {
    #[serde(rename = "longName")]
    long_name: Option<String>,
    #[serde(rename = "shortName")]
    short_name: Option<String>,
    #[serde(rename = "exchangeName")]
    exchange_name: Option<String>,
    currency: Option<String>,
    #[serde(rename = "marketCap")]
    market_cap: Option<RawValue>,
}

#[derive(Debug, Deserialize)]
struct ProfileModule {
    sector: Option<String>,
    #[serde(rename = "longBusinessSummary")]
    long_business_summary: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DetailModule {
    #[serde(rename = "trailingPE")]
    trailing_pe: Option<RawValue>,
    #[serde(rename = "dividendYield")]
    dividend_yield: Option<RawValue>,
}

#[derive(Debug, Deserialize)]
struct RawValue {
    raw: Option<f64>,
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

fn map_api_error(ticker: &Ticker, error: &ApiError) -> ProviderError {
    let description = error
        .description
        .clone()
        .or_else(|| error.code.clone())
        .unwrap_or_else(|| String::from("unspecified Yahoo error"));

    match error.code.as_deref() {
        Some("Not Found") => ProviderError::unknown_symbol(ticker),
        _ => ProviderError::no_data(ticker, description),
    }
}

fn decode_info(ticker: &Ticker, body: &str) -> Result<TickerInfo, ProviderError> {
    let envelope: SummaryEnvelope = serde_json::from_str(body)
        .map_err(|error| ProviderError::decode(ticker, format!("quoteSummary decode: {error}")))?;

    if let Some(error) = &envelope.quote_summary.error {
        return Err(map_api_error(ticker, error));
    }

    let result = envelope
        .quote_summary
        .result
        .and_then(|mut results| (!results.is_empty()).then(|| results.remove(0)))
        .ok_or_else(|| ProviderError::no_data(ticker, "quoteSummary returned no result"))?;

    let price = result.price.unwrap_or(PriceModule {
        long_name: None,
        short_name: None,
        exchange_name: None,
        currency: None,
        market_cap: None,
    });

    let name = price
        .long_name
        .or(price.short_name)
        .unwrap_or_else(|| ticker.as_str().to_owned());
    let currency = price.currency.unwrap_or_else(|| String::from("USD"));
    let (sector, description) = match result.summary_profile {
        Some(profile) => (profile.sector, profile.long_business_summary),
        None => (None, None),
    };
    let (pe_ratio, dividend_yield) = match result.summary_detail {
        Some(detail) => (
            detail.trailing_pe.and_then(|v| v.raw),
            detail.dividend_yield.and_then(|v| v.raw),
        ),
        None => (None, None),
    };

    TickerInfo::new(
        ticker.clone(),
        name,
        price.exchange_name,
        currency,
        sector,
        description,
        price.market_cap.and_then(|v| v.raw),
        pe_ratio,
        dividend_yield,
    )
    .map_err(|error| ProviderError::decode(ticker, format!("quoteSummary fields: {error}")))
}

fn decode_history(
    ticker: &Ticker,
    range: &DateRange,
    body: &str,
) -> Result<PriceSeries, ProviderError> {
    let envelope: ChartEnvelope = serde_json::from_str(body)
        .map_err(|error| ProviderError::decode(ticker, format!("chart decode: {error}")))?;

    if let Some(error) = &envelope.chart.error {
        return Err(map_api_error(ticker, error));
    }

    let result = envelope
        .chart
        .result
        .and_then(|mut results| (!results.is_empty()).then(|| results.remove(0)))
        .ok_or_else(|| ProviderError::no_data(ticker, "chart returned no result"))?;

    let timestamps = result.timestamp.unwrap_or_default();
    let quote = result
        .indicators
        .quote
        .into_iter()
        .next()
        .unwrap_or_default();

    let opens = quote.open.unwrap_or_default();
    let highs = quote.high.unwrap_or_default();
    let lows = quote.low.unwrap_or_default();
    let closes = quote.close.unwrap_or_default();
    let volumes = quote.volume.unwrap_or_default();

    let mut bars: Vec<DailyBar> = Vec::with_capacity(timestamps.len());
    let mut dropped = 0usize;

    for (index, ts) in timestamps.iter().enumerate() {
        let Ok(moment) = OffsetDateTime::from_unix_timestamp(*ts) else {
            dropped += 1;
            continue;
        };
        let date = moment.date();
        if !range.contains(date) {
            continue;
        }
        // Duplicate calendar dates occasionally appear when a live bar
        // accompanies the final settled bar; keep the first.
        if bars.last().is_some_and(|last| last.date >= date) {
            dropped += 1;
            continue;
        }

        let (Some(open), Some(high), Some(low), Some(close)) = (
            value_at(&opens, index),
            value_at(&highs, index),
            value_at(&lows, index),
            value_at(&closes, index),
        ) else {
            dropped += 1;
            continue;
        };

        match DailyBar::new(date, open, high, low, close, value_at(&volumes, index)) {
            Ok(bar) => bars.push(bar),
            Err(error) => {
                debug!(%ticker, %date, %error, "dropping malformed bar");
                dropped += 1;
            }
        }
    }

    if dropped > 0 {
        warn!(%ticker, dropped, "dropped incomplete rows from Yahoo chart response");
    }

    if bars.is_empty() {
        return Err(ProviderError::no_data(
            ticker,
            format!("no trading data between {range}"),
        ));
    }

    PriceSeries::new(ticker.clone(), bars)
        .map_err(|error| ProviderError::decode(ticker, format!("chart ordering: {error}")))
}

fn value_at<T: Copy>(values: &[Option<T>], index: usize) -> Option<T> {
    values.get(index).copied().flatten()
}
