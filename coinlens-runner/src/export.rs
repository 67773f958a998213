//! Record export: CSV and JSON renditions of analysis results.
//!
//! Both formats carry the same flat [`AnalysisRecord`] rows. CSV uses dot
//! decimals with fixed precision so files diff cleanly between runs.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use coinlens_core::analysis::AnalysisRecord;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown export format '{other}' (expected csv or json)")),
        }
    }
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export records as CSV.
///
/// Columns: asset, price, trend, decision, confidence, forecast, pct_change,
/// mean, rsi, macd, volatility_pct, synthetic, timestamp
pub fn export_records_csv(records: &[AnalysisRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "asset",
        "price",
        "trend",
        "decision",
        "confidence",
        "forecast",
        "pct_change",
        "mean",
        "rsi",
        "macd",
        "volatility_pct",
        "synthetic",
        "timestamp",
    ])?;

    for r in records {
        wtr.write_record([
            &r.asset,
            &format!("{:.6}", r.price),
            &r.trend.to_string(),
            &r.decision.to_string(),
            &format!("{:.4}", r.confidence),
            &format!("{:.6}", r.forecast),
            &format!("{:.4}", r.pct_change),
            &format!("{:.6}", r.mean),
            &format!("{:.4}", r.rsi),
            &format!("{:.6}", r.macd),
            &format!("{:.4}", r.volatility_pct),
            &r.synthetic.to_string(),
            &r.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
        ])?;
    }

    let bytes = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_records_json(records: &[AnalysisRecord]) -> Result<String> {
    serde_json::to_string_pretty(records).context("failed to serialize records to JSON")
}

pub fn import_records_json(json: &str) -> Result<Vec<AnalysisRecord>> {
    serde_json::from_str(json).context("failed to deserialize records from JSON")
}

// ─── File output ────────────────────────────────────────────────────

/// Write `records` to `<output_dir>/<name>.<ext>`, creating the directory.
pub fn write_export(
    records: &[AnalysisRecord],
    output_dir: &Path,
    name: &str,
    format: ExportFormat,
) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;

    let body = match format {
        ExportFormat::Csv => export_records_csv(records)?,
        ExportFormat::Json => export_records_json(records)?,
    };
    let path = output_dir.join(format!("{name}.{}", format.extension()));
    std::fs::write(&path, body).with_context(|| format!("failed to write {}", path.display()))?;

    info!(path = %path.display(), rows = records.len(), %format, "export written");
    Ok(path)
}
