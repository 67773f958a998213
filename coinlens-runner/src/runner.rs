//! Runner entry points: store-backed analysis, backtests, correlation,
//! sentiment and simulation.
//!
//! Single-asset analysis returns an [`AssetReport`] status envelope instead of
//! an error so batch callers can isolate failures per asset.

use chrono::NaiveDateTime;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use coinlens_core::analysis::{
    analyze_series, sentiment_history, AnalysisConfig, AnalysisError, AnalysisRecord, AssetAnalysis,
    SentimentReport,
};
use coinlens_core::backtest::{backtest, BacktestResult, Strategy};
use coinlens_core::correlation::{correlate, CorrelationReport};
use coinlens_core::data::{DataSource, LoadedSeries};
use coinlens_core::domain::PriceSeries;
use coinlens_core::simulation::{
    simulate_market, summarize_series, SimulationError, SimulationParams, SimulationSummary,
};

use crate::store::{AssetStore, StoreError};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("analysis error: {0}")]
    Analysis(#[from] AnalysisError),
    #[error("simulation error: {0}")]
    Simulation(#[from] SimulationError),
}

/// Status envelope for one asset's analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetReport {
    pub asset: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub source: DataSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AssetAnalysis>,
}

impl AssetReport {
    pub fn from_result(
        asset: &str,
        source: DataSource,
        result: Result<AssetAnalysis, AnalysisError>,
    ) -> Self {
        match result {
            Ok(analysis) => Self {
                asset: asset.to_string(),
                success: true,
                error: None,
                source,
                analysis: Some(analysis),
            },
            Err(e) => Self {
                asset: asset.to_string(),
                success: false,
                error: Some(e.to_string()),
                source,
                analysis: None,
            },
        }
    }

    pub fn record(&self) -> Option<AnalysisRecord> {
        self.analysis.as_ref().map(AnalysisRecord::from)
    }
}

pub fn analyze_loaded(loaded: &LoadedSeries, config: &AnalysisConfig) -> AssetReport {
    let result = analyze_series(&loaded.asset, &loaded.series, loaded.source, config);
    match &result {
        Ok(a) => info!(
            asset = %loaded.asset,
            source = ?loaded.source,
            decision = %a.decision.label,
            "asset analysed"
        ),
        Err(e) => warn!(asset = %loaded.asset, error = %e, "asset analysis failed"),
    }
    AssetReport::from_result(&loaded.asset, loaded.source, result)
}

/// Load and analyse one asset. Never fails; see [`AssetReport::success`].
pub fn analyze_asset(
    store: &AssetStore,
    asset: &str,
    config: &AnalysisConfig,
    as_of: NaiveDateTime,
) -> AssetReport {
    analyze_loaded(&store.load(asset, as_of), config)
}

/// Analyse many assets in parallel. Output order matches `assets`; one bad
/// asset never affects the others.
pub fn analyze_batch(
    store: &AssetStore,
    assets: &[String],
    config: &AnalysisConfig,
    as_of: NaiveDateTime,
) -> Vec<AssetReport> {
    let reports: Vec<AssetReport> = assets
        .par_iter()
        .map(|asset| analyze_asset(store, asset, config, as_of))
        .collect();
    let failed = reports.iter().filter(|r| !r.success).count();
    info!(assets = reports.len(), failed, "batch analysis finished");
    reports
}

pub fn backtest_asset(
    store: &AssetStore,
    asset: &str,
    strategy: Strategy,
    initial_capital: f64,
    as_of: NaiveDateTime,
) -> Result<(DataSource, BacktestResult), RunError> {
    let loaded = store.load(asset, as_of);
    let result = backtest(&loaded.series, initial_capital, strategy)?;
    Ok((loaded.source, result))
}

/// Correlate stored assets. Series are loaded in parallel.
pub fn correlate_assets(
    store: &AssetStore,
    assets: &[String],
    as_of: NaiveDateTime,
) -> Result<CorrelationReport, RunError> {
    let loaded: Vec<LoadedSeries> = assets.par_iter().map(|a| store.load(a, as_of)).collect();
    let refs: Vec<(&str, &PriceSeries)> =
        loaded.iter().map(|l| (l.asset.as_str(), &l.series)).collect();
    Ok(correlate(&refs)?)
}

pub fn sentiment_for_asset(
    store: &AssetStore,
    asset: &str,
    as_of: NaiveDateTime,
) -> Result<SentimentReport, RunError> {
    let loaded = store.load(asset, as_of);
    Ok(sentiment_history(&loaded.series)?)
}

/// Simulate a market, store it under `name`, and summarise it.
pub fn run_simulation(
    store: &AssetStore,
    name: &str,
    params: &SimulationParams,
    seed: u64,
    end: NaiveDateTime,
) -> Result<SimulationSummary, RunError> {
    let series = simulate_market(params, seed, end)?;
    let path = store.save_simulation(name, &series)?;
    info!(name, path = %path.display(), bars = series.len(), "simulation stored");
    Ok(summarize_series(&series)?)
}

pub fn summarize_simulation(store: &AssetStore, name: &str) -> Result<SimulationSummary, RunError> {
    Ok(summarize_series(&store.load_simulation(name)?)?)
}
