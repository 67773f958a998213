//! Flat-file asset store: one canonical CSV per asset.
//!
//! Layout under the data directory:
//! - `<ASSET>.csv` — curated history
//! - `<ASSET>_online.csv` — history written by a live refresh, read when no
//!   curated file exists
//! - `simulations/<NAME>.csv` — Monte Carlo output, never listed as an asset
//! - `temp_*` — upload scratch files, never listed

use chrono::NaiveDateTime;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use coinlens_core::data::{
    ingest_bytes, load_asset_file, normalize_upload, write_canonical_csv, DataError, IngestStats,
    LoadedSeries,
};
use coinlens_core::domain::PriceSeries;

pub const ONLINE_SUFFIX: &str = "_online";
pub const TEMP_PREFIX: &str = "temp_";
pub const SIMULATION_DIR: &str = "simulations";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("data error: {0}")]
    Data(#[from] DataError),

    #[error("invalid asset name '{0}' (letters, digits, '-' and '_' only)")]
    InvalidName(String),

    #[error("no stored file for '{0}'")]
    NotFound(String),
}

#[derive(Debug, Clone)]
pub struct AssetStore {
    root: PathBuf,
}

fn validate_name(name: &str) -> Result<(), StoreError> {
    let ok = !name.is_empty()
        && !name.starts_with(TEMP_PREFIX)
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if ok {
        Ok(())
    } else {
        Err(StoreError::InvalidName(name.to_string()))
    }
}

impl AssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn curated_path(&self, asset: &str) -> PathBuf {
        self.root.join(format!("{asset}.csv"))
    }

    fn online_path(&self, asset: &str) -> PathBuf {
        self.root.join(format!("{asset}{ONLINE_SUFFIX}.csv"))
    }

    fn simulation_path(&self, name: &str) -> PathBuf {
        self.root.join(SIMULATION_DIR).join(format!("{name}.csv"))
    }

    /// The file history is read from: curated first, then online.
    pub fn path_for(&self, asset: &str) -> Option<PathBuf> {
        [self.curated_path(asset), self.online_path(asset)]
            .into_iter()
            .find(|p| p.is_file())
    }

    /// Asset names with a stored file, sorted, each listed once.
    pub fn list_assets(&self) -> Result<Vec<String>, StoreError> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }
        let mut assets = BTreeSet::new();
        for entry in std::fs::read_dir(&self.root)? {
            let path = entry?.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("csv") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if stem.starts_with(TEMP_PREFIX) {
                continue;
            }
            let name = stem.strip_suffix(ONLINE_SUFFIX).unwrap_or(stem);
            if !name.is_empty() {
                assets.insert(name.to_string());
            }
        }
        Ok(assets.into_iter().collect())
    }

    /// Load an asset's history, degrading to the synthetic series ending at
    /// `fallback_end` when nothing usable is stored.
    pub fn load(&self, asset: &str, fallback_end: NaiveDateTime) -> LoadedSeries {
        let path = self.path_for(asset);
        debug!(asset, path = ?path, "loading asset history");
        load_asset_file(asset, path.as_deref(), fallback_end)
    }

    fn write(&self, path: &Path, series: &PriceSeries) -> Result<PathBuf, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, write_canonical_csv(series)?)?;
        Ok(path.to_path_buf())
    }

    pub fn save(&self, asset: &str, series: &PriceSeries) -> Result<PathBuf, StoreError> {
        validate_name(asset)?;
        self.write(&self.curated_path(asset), series)
    }

    pub fn save_online(&self, asset: &str, series: &PriceSeries) -> Result<PathBuf, StoreError> {
        validate_name(asset)?;
        self.write(&self.online_path(asset), series)
    }

    /// Remove every stored file for an asset.
    pub fn delete(&self, asset: &str) -> Result<(), StoreError> {
        validate_name(asset)?;
        let mut removed = false;
        for path in [self.curated_path(asset), self.online_path(asset)] {
            if path.is_file() {
                std::fs::remove_file(&path)?;
                removed = true;
            }
        }
        if removed {
            info!(asset, "deleted asset history");
            Ok(())
        } else {
            Err(StoreError::NotFound(asset.to_string()))
        }
    }

    /// Normalize an uploaded table and store it as the asset's curated history.
    pub fn import_upload(
        &self,
        asset: &str,
        bytes: &[u8],
    ) -> Result<(PathBuf, IngestStats), StoreError> {
        validate_name(asset)?;
        let ingested = normalize_upload(bytes)?;
        let path = self.save(asset, &ingested.series)?;
        info!(
            asset,
            rows = ingested.series.len(),
            encoding = ?ingested.stats.encoding,
            "imported upload"
        );
        Ok((path, ingested.stats))
    }

    pub fn save_simulation(&self, name: &str, series: &PriceSeries) -> Result<PathBuf, StoreError> {
        validate_name(name)?;
        self.write(&self.simulation_path(name), series)
    }

    pub fn load_simulation(&self, name: &str) -> Result<PriceSeries, StoreError> {
        validate_name(name)?;
        let path = self.simulation_path(name);
        if !path.is_file() {
            return Err(StoreError::NotFound(name.to_string()));
        }
        Ok(ingest_bytes(&std::fs::read(path)?)?.series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use coinlens_core::data::DataSource;

    fn end() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    const UPLOAD: &str = "Date,Close\n2024-01-01,10\n2024-01-02,11\n2024-01-03,12\n";

    #[test]
    fn import_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = AssetStore::new(dir.path());
        let (path, stats) = store.import_upload("BTC", UPLOAD.as_bytes()).unwrap();
        assert!(path.ends_with("BTC.csv"));
        assert_eq!(stats.rows_read, 3);

        let loaded = store.load("BTC", end());
        assert_eq!(loaded.source, DataSource::Csv);
        assert_eq!(loaded.series.closes(), vec![10.0, 11.0, 12.0]);
    }

    #[test]
    fn missing_asset_is_synthetic() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = AssetStore::new(dir.path()).load("DOGE", end());
        assert!(loaded.is_synthetic());
    }

    #[test]
    fn online_file_used_when_no_curated_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = AssetStore::new(dir.path());
        let series = normalize_upload(UPLOAD.as_bytes()).unwrap().series;
        store.save_online("ETH", &series).unwrap();
        assert_eq!(store.load("ETH", end()).source, DataSource::OnlineCsv);
        store.save("ETH", &series).unwrap();
        assert_eq!(store.load("ETH", end()).source, DataSource::Csv);
    }

    #[test]
    fn listing_skips_temp_and_simulations() {
        let dir = tempfile::tempdir().unwrap();
        let store = AssetStore::new(dir.path());
        let series = normalize_upload(UPLOAD.as_bytes()).unwrap().series;
        store.save("SOL", &series).unwrap();
        store.save_online("SOL", &series).unwrap();
        store.save_online("ADA", &series).unwrap();
        store.save_simulation("run1", &series).unwrap();
        std::fs::write(dir.path().join("temp_upload.csv"), UPLOAD).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();
        assert_eq!(store.list_assets().unwrap(), vec!["ADA", "SOL"]);
    }

    #[test]
    fn delete_removes_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = AssetStore::new(dir.path());
        let series = normalize_upload(UPLOAD.as_bytes()).unwrap().series;
        store.save("XRP", &series).unwrap();
        store.save_online("XRP", &series).unwrap();
        store.delete("XRP").unwrap();
        assert!(store.path_for("XRP").is_none());
        assert!(matches!(store.delete("XRP"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn rejects_path_like_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = AssetStore::new(dir.path());
        assert!(matches!(
            store.import_upload("../etc", UPLOAD.as_bytes()),
            Err(StoreError::InvalidName(_))
        ));
    }

    #[test]
    fn simulation_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = AssetStore::new(dir.path());
        let series = normalize_upload(UPLOAD.as_bytes()).unwrap().series;
        store.save_simulation("bull", &series).unwrap();
        assert_eq!(store.load_simulation("bull").unwrap(), series);
        assert!(matches!(store.load_simulation("bear"), Err(StoreError::NotFound(_))));
    }
}
