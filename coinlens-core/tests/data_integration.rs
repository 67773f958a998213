//! Integration tests for ingestion against realistic export fixtures.

use chrono::{NaiveDate, NaiveDateTime};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use coinlens_core::data::encoding::TextEncoding;
use coinlens_core::data::{
    ingest_bytes, load_asset_file, normalize_upload, write_canonical_csv, DataSource,
};

static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

fn fixture(name: &str) -> Vec<u8> {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name);
    std::fs::read(path).unwrap()
}

fn scratch_dir() -> PathBuf {
    let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    let dir = std::env::temp_dir().join(format!("coinlens_data_test_{}_{id}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn end() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 30)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

fn assert_approx(actual: f64, expected: f64) {
    assert!((actual - expected).abs() < 1e-9, "expected {expected}, got {actual}");
}

#[test]
fn spanish_export_with_european_numbers() {
    let ingested = ingest_bytes(&fixture("btc_es.csv")).unwrap();
    assert_eq!(ingested.stats.delimiter, ';');
    assert_eq!(ingested.stats.encoding, TextEncoding::Utf8);
    assert!(ingested.stats.synthesized_columns.is_empty());

    let bars = ingested.series.bars();
    assert_eq!(bars.len(), 3);
    // Export is newest-first; the series is ascending
    assert_eq!(bars[0].timestamp.date(), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    assert_approx(bars[0].close, 42_280.2);
    assert_approx(bars[0].open, 42_660.0);
    assert_approx(bars[1].high, 45_881.8);
    assert_approx(bars[2].low, 42_629.6);
    assert_approx(bars[2].volume, 98.73);
}

#[test]
fn latin1_header_is_decoded() {
    let mut bytes = b"Fecha;\xDAltimo\n01.02.2024;1.234,56\n02.02.2024;1.300,00\n".to_vec();
    bytes.extend_from_slice(b"03.02.2024;1.310,50\n");
    let ingested = ingest_bytes(&bytes).unwrap();
    assert_eq!(ingested.stats.encoding, TextEncoding::Latin1);
    assert!(!ingested.stats.close_inferred);
    assert_eq!(ingested.series.closes(), vec![1234.56, 1300.0, 1310.5]);
}

#[test]
fn hourly_export_keeps_times() {
    let ingested = ingest_bytes(&fixture("eth_hourly.csv")).unwrap();
    let series = ingested.series;
    assert_eq!(series.len(), 5);
    let last = series.last_timestamp().unwrap();
    assert_eq!(last.format("%H:%M").to_string(), "04:00");
    // price column named "price" maps to Close; Volume defaults to zero
    assert_approx(series.bars()[1].close, 3412.25);
    assert!(series.volumes().iter().all(|v| *v == 0.0));
}

#[test]
fn canonical_output_reingests_identically() {
    let original = ingest_bytes(&fixture("btc_es.csv")).unwrap().series;
    let text = write_canonical_csv(&original).unwrap();
    assert!(text.starts_with("Date,Open,High,Low,Close,Volume"));
    let again = normalize_upload(text.as_bytes()).unwrap().series;
    assert_eq!(again, original);
}

#[test]
fn unreadable_file_falls_back_to_synthetic() {
    let dir = scratch_dir();
    let path = dir.join("BTC.csv");
    std::fs::write(&path, "just,some\nwords,here\n").unwrap();
    let loaded = load_asset_file("BTC", Some(&path), end());
    assert_eq!(loaded.source, DataSource::Synthetic);
    assert_eq!(loaded.series.last_timestamp(), Some(end()));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn online_file_is_tagged() {
    let dir = scratch_dir();
    let path = dir.join("ETH_online.csv");
    std::fs::write(&path, fixture("eth_hourly.csv")).unwrap();
    let loaded = load_asset_file("ETH", Some(&path), end());
    assert_eq!(loaded.source, DataSource::OnlineCsv);
    assert!(!loaded.is_synthetic());
    assert_eq!(loaded.series.len(), 5);
    let _ = std::fs::remove_dir_all(&dir);
}
