//! Price provider trait, provenance tags, and structured data errors.
//!
//! The PriceProvider trait abstracts over live sources (Yahoo Finance) so the
//! snapshot refresh can be driven by a mock in tests.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::PriceSeries;

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("no data available: {0}")]
    Unavailable(String),

    #[error("could not parse price table: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("hard stop: data provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,
}

/// Where a series came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    /// Per-asset history file.
    Csv,
    /// Online-history file written by a previous live refresh.
    OnlineCsv,
    /// Deterministic placeholder generated because no real data could be read.
    Synthetic,
    /// Fetched live from Yahoo Finance.
    Yahoo,
}

/// A series together with its provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadedSeries {
    pub asset: String,
    pub series: PriceSeries,
    pub source: DataSource,
}

impl LoadedSeries {
    pub fn is_synthetic(&self) -> bool {
        self.source == DataSource::Synthetic
    }
}

/// Live price source (Yahoo Finance, or a mock in tests).
pub trait PriceProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch the recent intraday history for an asset (e.g. "BTC").
    fn fetch_recent(&self, asset: &str) -> Result<PriceSeries, DataError>;

    /// Check if the provider is currently available (not rate-limited, not blocked).
    fn is_available(&self) -> bool;
}
