//! CoinLens Runner — store-backed analysis, comparison, snapshots, alerts, export.
//!
//! This crate builds on `coinlens-core` to provide:
//! - A flat-file asset store with synthetic fallback on load
//! - Single and batch analysis with per-asset failure isolation
//! - Backtest, correlation, sentiment and simulation entry points
//! - Cross-asset metric comparison
//! - Snapshot store and one-shot live refresh
//! - Persistent alert rules
//! - CSV/JSON record export
//! - TOML application config

pub mod alerts;
pub mod compare;
pub mod config;
pub mod export;
pub mod runner;
pub mod snapshot;
pub mod store;

pub use alerts::{AlertBook, AlertBookError};
pub use compare::{compare_assets, CompareMetric, Comparison, MetricValue};
pub use config::{AppConfig, BacktestSettings, ConfigError};
pub use export::{export_records_csv, export_records_json, write_export, ExportFormat};
pub use runner::{
    analyze_asset, analyze_batch, analyze_loaded, backtest_asset, correlate_assets, run_simulation,
    sentiment_for_asset, summarize_simulation, AssetReport, RunError,
};
pub use snapshot::{
    refresh_snapshots, InMemorySnapshotStore, PricePoint, RefreshOptions, RefreshSummary,
    SnapshotStore, LIVE_HISTORY_CAP,
};
pub use store::{AssetStore, StoreError};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn asset_report_is_send_sync() {
        assert_send::<AssetReport>();
        assert_sync::<AssetReport>();
    }

    #[test]
    fn store_types_are_send_sync() {
        assert_send::<AssetStore>();
        assert_sync::<AssetStore>();
        assert_send::<InMemorySnapshotStore>();
        assert_sync::<InMemorySnapshotStore>();
    }

    #[test]
    fn config_is_send_sync() {
        assert_send::<AppConfig>();
        assert_sync::<AppConfig>();
    }

    #[test]
    fn alert_book_is_send_sync() {
        assert_send::<AlertBook>();
        assert_sync::<AlertBook>();
    }

    #[test]
    fn comparison_is_send_sync() {
        assert_send::<Comparison>();
        assert_sync::<Comparison>();
    }

    #[test]
    fn errors_are_send_sync() {
        assert_send::<RunError>();
        assert_sync::<RunError>();
        assert_send::<ConfigError>();
        assert_sync::<ConfigError>();
    }
}
