//! Data layer: ingestion, normalization, synthetic fallback, live provider.

pub mod canonical;
pub mod circuit_breaker;
pub mod columns;
pub mod dates;
pub mod encoding;
pub mod ingest;
pub mod number;
pub mod provider;
pub mod synthetic;
pub mod yahoo;

pub use canonical::write_canonical_csv;
pub use ingest::{ingest_bytes, load_asset_file, normalize_upload, IngestStats, Ingested};
pub use provider::{DataError, DataSource, LoadedSeries, PriceProvider};
pub use synthetic::{base_price, synthetic_series};
