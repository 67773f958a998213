//! Live snapshot store and one-shot refresh.
//!
//! The store is an injected dependency rather than process-wide state: the
//! refresh pass writes to whatever [`SnapshotStore`] it is handed, and readers
//! (anomaly detection, alert evaluation, the CLI) read from the same handle.
//! Periodic scheduling is left to the caller.
//!
//! Alongside the latest snapshot, the store keeps a short per-asset price
//! history (the last [`LIVE_HISTORY_CAP`] refreshed prices) for live charts.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{PoisonError, RwLock};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use coinlens_core::analysis::{AssetSnapshot, DecisionConfig};
use coinlens_core::data::PriceProvider;
use coinlens_core::indicators::IndicatorParams;

use crate::store::AssetStore;

/// Live prices kept per asset; older points are dropped first.
pub const LIVE_HISTORY_CAP: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: NaiveDateTime,
    pub price: f64,
}

/// Keyed storage for the latest snapshot of each asset.
pub trait SnapshotStore: Send + Sync {
    fn get(&self, asset: &str) -> Option<AssetSnapshot>;
    fn put(&self, snapshot: AssetSnapshot);
    /// All snapshots, ordered by asset.
    fn list(&self) -> Vec<AssetSnapshot>;
    /// Append a live price, keeping at most [`LIVE_HISTORY_CAP`] per asset.
    fn record_price(&self, asset: &str, point: PricePoint);
    /// Recorded prices for `asset`, oldest first.
    fn history(&self, asset: &str) -> Vec<PricePoint>;
    /// Drop snapshots and price history.
    fn clear(&self);
}

#[derive(Debug, Default)]
pub struct InMemorySnapshotStore {
    inner: RwLock<BTreeMap<String, AssetSnapshot>>,
    history: RwLock<HashMap<String, VecDeque<PricePoint>>>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for InMemorySnapshotStore {
    fn get(&self, asset: &str) -> Option<AssetSnapshot> {
        let map = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        map.get(asset).cloned()
    }

    fn put(&self, snapshot: AssetSnapshot) {
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        map.insert(snapshot.asset.clone(), snapshot);
    }

    fn list(&self) -> Vec<AssetSnapshot> {
        let map = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        map.values().cloned().collect()
    }

    fn record_price(&self, asset: &str, point: PricePoint) {
        let mut history = self.history.write().unwrap_or_else(PoisonError::into_inner);
        let ring = history.entry(asset.to_string()).or_default();
        ring.push_back(point);
        while ring.len() > LIVE_HISTORY_CAP {
            ring.pop_front();
        }
    }

    fn history(&self, asset: &str) -> Vec<PricePoint> {
        let history = self.history.read().unwrap_or_else(PoisonError::into_inner);
        history
            .get(asset)
            .map(|ring| ring.iter().copied().collect())
            .unwrap_or_default()
    }

    fn clear(&self) {
        self.inner.write().unwrap_or_else(PoisonError::into_inner).clear();
        self.history.write().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

/// Outcome of one refresh pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RefreshSummary {
    pub updated: Vec<String>,
    /// (asset, error message)
    pub failed: Vec<(String, String)>,
}

/// Settings for [`refresh_snapshots`].
#[derive(Debug, Clone, Default)]
pub struct RefreshOptions<'a> {
    pub indicators: IndicatorParams,
    pub decision: DecisionConfig,
    /// When set, fetched history is also written as `<ASSET>_online.csv`.
    pub history: Option<&'a AssetStore>,
}

/// Fetch every asset once and store a fresh snapshot for each. Per-asset
/// failures are logged and reported, never propagated.
pub fn refresh_snapshots(
    provider: &dyn PriceProvider,
    store: &dyn SnapshotStore,
    assets: &[String],
    options: &RefreshOptions<'_>,
) -> RefreshSummary {
    let mut summary = RefreshSummary::default();

    for asset in assets {
        if !provider.is_available() {
            warn!(asset = %asset, provider = provider.name(), "provider unavailable, skipping");
            summary.failed.push((asset.clone(), format!("{} unavailable", provider.name())));
            continue;
        }

        let series = match provider.fetch_recent(asset) {
            Ok(series) => series,
            Err(e) => {
                warn!(asset = %asset, error = %e, "live fetch failed");
                summary.failed.push((asset.clone(), e.to_string()));
                continue;
            }
        };

        if let Some(history) = options.history {
            if let Err(e) = history.save_online(asset, &series) {
                warn!(asset = %asset, error = %e, "could not persist online history");
            }
        }

        match AssetSnapshot::from_series(asset, &series, &options.indicators, &options.decision) {
            Ok(snapshot) => {
                let point = PricePoint {
                    timestamp: snapshot.as_of,
                    price: snapshot.price,
                };
                store.record_price(asset, point);
                store.put(snapshot);
                summary.updated.push(asset.clone());
            }
            Err(e) => {
                warn!(asset = %asset, error = %e, "snapshot skipped");
                summary.failed.push((asset.clone(), e.to_string()));
            }
        }
    }

    info!(
        updated = summary.updated.len(),
        failed = summary.failed.len(),
        provider = provider.name(),
        "snapshot refresh finished"
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use coinlens_core::data::{DataError, DataSource};
    use coinlens_core::domain::{Bar, PriceSeries};

    struct MockProvider;

    impl PriceProvider for MockProvider {
        fn name(&self) -> &str {
            "mock"
        }

        fn fetch_recent(&self, asset: &str) -> Result<PriceSeries, DataError> {
            if asset == "GONE" {
                return Err(DataError::SymbolNotFound {
                    symbol: asset.to_string(),
                });
            }
            let base = NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap();
            let bars = (0..48)
                .map(|i| {
                    let close = 100.0 + i as f64;
                    Bar {
                        timestamp: base + Duration::hours(i),
                        open: close - 0.5,
                        high: close + 1.0,
                        low: close - 1.0,
                        close,
                        volume: 10.0,
                    }
                })
                .collect();
            Ok(PriceSeries::new(bars).unwrap())
        }

        fn is_available(&self) -> bool {
            true
        }
    }

    #[test]
    fn refresh_stores_snapshots_and_skips_failures() {
        let store = InMemorySnapshotStore::new();
        let assets = vec!["BTC".to_string(), "GONE".to_string(), "ETH".to_string()];
        let summary = refresh_snapshots(&MockProvider, &store, &assets, &RefreshOptions::default());

        assert_eq!(summary.updated, vec!["BTC", "ETH"]);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].0, "GONE");

        let btc = store.get("BTC").unwrap();
        assert_eq!(btc.price, 147.0);
        assert_eq!(btc.volume, 480.0);
        assert_eq!(store.list().len(), 2);
        assert!(store.history("GONE").is_empty());

        refresh_snapshots(&MockProvider, &store, &assets, &RefreshOptions::default());
        let prices: Vec<f64> = store.history("BTC").iter().map(|p| p.price).collect();
        assert_eq!(prices, vec![147.0, 147.0]);
        assert_eq!(store.history("ETH")[0].timestamp, btc.as_of);

        store.clear();
        assert!(store.list().is_empty());
        assert!(store.history("BTC").is_empty());
    }

    #[test]
    fn history_keeps_the_latest_hundred_points() {
        let store = InMemorySnapshotStore::new();
        let base = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        for i in 0..105 {
            let point = PricePoint {
                timestamp: base + Duration::minutes(i),
                price: i as f64,
            };
            store.record_price("BTC", point);
        }
        store.record_price("ETH", PricePoint { timestamp: base, price: 1.0 });

        let btc = store.history("BTC");
        assert_eq!(btc.len(), LIVE_HISTORY_CAP);
        assert_eq!(btc[0].price, 5.0);
        assert_eq!(btc[99].price, 104.0);
        assert_eq!(btc[99].timestamp, base + Duration::minutes(104));
        assert_eq!(store.history("ETH").len(), 1);
    }

    #[test]
    fn refresh_persists_online_history() {
        let dir = tempfile::tempdir().unwrap();
        let history = AssetStore::new(dir.path());
        let store = InMemorySnapshotStore::new();
        let options = RefreshOptions {
            history: Some(&history),
            ..RefreshOptions::default()
        };
        refresh_snapshots(&MockProvider, &store, &["SOL".to_string()], &options);

        let end = NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let loaded = history.load("SOL", end);
        assert_eq!(loaded.source, DataSource::OnlineCsv);
        assert_eq!(loaded.series.len(), 48);
    }
}
