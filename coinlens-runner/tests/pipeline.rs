//! End-to-end runner pipeline over a temporary asset store.

use chrono::{NaiveDate, NaiveDateTime};
use coinlens_core::backtest::Strategy;
use coinlens_core::data::DataSource;
use coinlens_runner::{
    analyze_batch, backtest_asset, compare_assets, correlate_assets, export_records_csv,
    write_export, AppConfig, AssetStore, CompareMetric, ExportFormat,
};

fn as_of() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// 40 daily rows, closes 100..=139.
fn rising_upload() -> Vec<u8> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let mut csv = String::from("Date,Close,Volume\n");
    for i in 0..40 {
        let date = start + chrono::Duration::days(i);
        csv.push_str(&format!("{},{},{}\n", date.format("%Y-%m-%d"), 100 + i, 1000 + 10 * i));
    }
    csv.into_bytes()
}

#[test]
fn import_analyze_compare_export() {
    let dir = tempfile::tempdir().unwrap();
    let store = AssetStore::new(dir.path().join("datos"));
    store.import_upload("RISE", &rising_upload()).unwrap();
    assert_eq!(store.list_assets().unwrap(), vec!["RISE".to_string()]);

    let config = AppConfig::default();
    let assets = vec!["RISE".to_string(), "BTC".to_string()];
    let reports = analyze_batch(&store, &assets, &config.analysis(), as_of());

    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(|r| r.success));
    assert_eq!(reports[0].source, DataSource::Csv);
    assert_eq!(reports[1].source, DataSource::Synthetic);
    let rise = reports[0].analysis.as_ref().unwrap();
    assert!((rise.current_price() - 139.0).abs() < 1e-9);
    assert_eq!(rise.bars, 40);

    let cmp = compare_assets(&reports, CompareMetric::Price);
    assert_eq!(cmp.values.len(), 2);
    assert!(cmp.min.unwrap() <= 139.0 && cmp.max.unwrap() >= 139.0);

    let records: Vec<_> = reports.iter().filter_map(|r| r.record()).collect();
    let csv = export_records_csv(&records).unwrap();
    assert_eq!(csv.lines().count(), 3);
    assert!(csv.contains("RISE,139.000000,"));

    let out_dir = dir.path().join("reports");
    let path = write_export(&records, &out_dir, "batch", ExportFormat::Json).unwrap();
    let written = std::fs::read_to_string(path).unwrap();
    assert!(written.contains("\"asset\": \"RISE\""));
}

#[test]
fn backtest_stored_asset() {
    let dir = tempfile::tempdir().unwrap();
    let store = AssetStore::new(dir.path());
    store.import_upload("RISE", &rising_upload()).unwrap();

    let (source, result) =
        backtest_asset(&store, "RISE", Strategy::RsiMacd, 10_000.0, as_of()).unwrap();
    assert_eq!(source, DataSource::Csv);
    assert!((result.buy_and_hold_pct - 39.0).abs() < 1e-9);
    assert_eq!(result.max_drawdown_pct, 0.0);
    assert_eq!(result.trade_count() % 2, 0);
}

#[test]
fn correlate_mixed_sources() {
    let dir = tempfile::tempdir().unwrap();
    let store = AssetStore::new(dir.path());
    let assets: Vec<String> = ["BTC", "ETH", "SOL"].iter().map(|s| s.to_string()).collect();

    let report = correlate_assets(&store, &assets, as_of()).unwrap();
    assert_eq!(report.matrix.labels, assets);
    for i in 0..3 {
        assert_eq!(report.matrix.get(i, i), Some(1.0));
    }
}
