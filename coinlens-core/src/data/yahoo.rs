//! Yahoo Finance live price provider.
//!
//! Fetches the last week of hourly bars for `{ASSET}-USD` from the v8
//! chart API, with exponential-backoff retry behind the circuit breaker.

use chrono::DateTime;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::circuit_breaker::CircuitBreaker;
use super::provider::{DataError, PriceProvider};
use crate::domain::{Bar, PriceSeries};

const CHART_ENDPOINT: &str = "https://query2.finance.yahoo.com/v8/finance/chart";
pub const DEFAULT_RANGE: &str = "7d";
pub const DEFAULT_INTERVAL: &str = "1h";
const RATE_LIMIT_FALLBACK_SECS: u64 = 60;

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct QuoteData {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<f64>>,
}

/// Ticker symbol for a crypto asset ("BTC" → "BTC-USD"); symbols that
/// already carry a quote currency are left alone.
pub fn ticker_for(asset: &str) -> String {
    if asset.contains('-') {
        asset.to_string()
    } else {
        format!("{}-USD", asset.to_uppercase())
    }
}

enum Failure {
    Retry(DataError),
    Fatal(DataError),
}

pub struct YahooProvider {
    client: reqwest::blocking::Client,
    circuit_breaker: Arc<CircuitBreaker>,
    max_retries: u32,
    base_delay: Duration,
}

impl YahooProvider {
    pub fn new(circuit_breaker: Arc<CircuitBreaker>) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (X11; Linux x86_64) coinlens")
            .build()
            .map_err(|e| DataError::NetworkUnreachable(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            circuit_breaker,
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        })
    }

    fn chart_url(ticker: &str) -> String {
        format!("{CHART_ENDPOINT}/{ticker}?range={DEFAULT_RANGE}&interval={DEFAULT_INTERVAL}")
    }

    fn parse_response(ticker: &str, resp: ChartResponse) -> Result<PriceSeries, DataError> {
        let result = resp.chart.result.ok_or_else(|| match resp.chart.error {
            Some(err) if err.code == "Not Found" => DataError::SymbolNotFound {
                symbol: ticker.to_string(),
            },
            Some(err) => {
                DataError::ResponseFormatChanged(format!("{}: {}", err.code, err.description))
            }
            None => DataError::ResponseFormatChanged("empty result with no error".into()),
        })?;

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("result array is empty".into()))?;
        let timestamps = data
            .timestamp
            .ok_or_else(|| DataError::ResponseFormatChanged("no timestamps".into()))?;
        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("no quote data".into()))?;

        let at = |v: &[Option<f64>], i: usize| v.get(i).copied().flatten();
        let mut bars = Vec::with_capacity(timestamps.len());
        for (i, &ts) in timestamps.iter().enumerate() {
            let timestamp = DateTime::from_timestamp(ts, 0)
                .map(|dt| dt.naive_utc())
                .ok_or_else(|| {
                    DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}"))
                })?;

            // Hours with no trade carry a null close
            let Some(close) = at(&quote.close, i) else {
                continue;
            };
            let body = Bar::from_body(
                timestamp,
                at(&quote.open, i).unwrap_or(close),
                close,
                at(&quote.volume, i).unwrap_or(0.0),
            );
            bars.push(Bar {
                high: at(&quote.high, i).unwrap_or(body.high),
                low: at(&quote.low, i).unwrap_or(body.low),
                ..body
            });
        }

        let series = PriceSeries::from_unsorted(bars);
        if series.is_empty() {
            return Err(DataError::SymbolNotFound {
                symbol: ticker.to_string(),
            });
        }
        Ok(series)
    }

    /// One HTTP round trip.
    fn attempt(&self, url: &str, ticker: &str) -> Result<PriceSeries, Failure> {
        use reqwest::StatusCode;

        let resp = self.client.get(url).send().map_err(|e| {
            let err = DataError::NetworkUnreachable(e.to_string());
            if e.is_connect() || e.is_timeout() {
                Failure::Retry(err)
            } else {
                Failure::Fatal(err)
            }
        })?;

        match resp.status() {
            StatusCode::FORBIDDEN => {
                self.circuit_breaker.trip();
                Err(Failure::Fatal(DataError::CircuitBreakerTripped))
            }
            StatusCode::NOT_FOUND => Err(Failure::Fatal(DataError::SymbolNotFound {
                symbol: ticker.to_string(),
            })),
            StatusCode::TOO_MANY_REQUESTS => {
                self.circuit_breaker.record_failure();
                let retry_after_secs = resp
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok()?.parse::<u64>().ok())
                    .unwrap_or(RATE_LIMIT_FALLBACK_SECS);
                warn!(ticker, retry_after_secs, "rate limited");
                Err(Failure::Retry(DataError::RateLimited { retry_after_secs }))
            }
            status if !status.is_success() => {
                self.circuit_breaker.record_failure();
                let message = format!("HTTP {status} for {ticker}");
                Err(Failure::Retry(DataError::NetworkUnreachable(message)))
            }
            _ => {
                let chart: ChartResponse = resp.json().map_err(|e| {
                    Failure::Fatal(DataError::ResponseFormatChanged(format!("{ticker}: {e}")))
                })?;
                Self::parse_response(ticker, chart).map_err(Failure::Fatal)
            }
        }
    }

    fn fetch_with_retry(&self, ticker: &str) -> Result<PriceSeries, DataError> {
        let url = Self::chart_url(ticker);
        let mut last_error = DataError::NetworkUnreachable("no attempt made".into());

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                std::thread::sleep(self.base_delay * 2u32.pow(attempt - 1));
            }
            if !self.circuit_breaker.is_allowed() {
                return Err(DataError::CircuitBreakerTripped);
            }
            match self.attempt(&url, ticker) {
                Ok(series) => {
                    self.circuit_breaker.record_success();
                    debug!(ticker, bars = series.len(), attempt, "fetched live history");
                    return Ok(series);
                }
                Err(Failure::Retry(e)) => last_error = e,
                Err(Failure::Fatal(e)) => return Err(e),
            }
        }
        Err(last_error)
    }
}

impl PriceProvider for YahooProvider {
    fn name(&self) -> &str {
        "Yahoo Finance"
    }

    fn fetch_recent(&self, asset: &str) -> Result<PriceSeries, DataError> {
        self.fetch_with_retry(&ticker_for(asset))
    }

    fn is_available(&self) -> bool {
        self.circuit_breaker.is_allowed()
    }
}
