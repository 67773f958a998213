//! Canonical CSV writer: ISO dates, dot decimals, fixed column order.
//!
//! Output round-trips through `ingest_bytes` without any locale guessing.

use chrono::{NaiveDateTime, Timelike};

use super::provider::DataError;
use crate::domain::PriceSeries;

pub const CANONICAL_HEADER: [&str; 6] = ["Date", "Open", "High", "Low", "Close", "Volume"];

fn format_timestamp(ts: &NaiveDateTime) -> String {
    if ts.hour() == 0 && ts.minute() == 0 && ts.second() == 0 {
        ts.format("%Y-%m-%d").to_string()
    } else {
        ts.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// Render a series as canonical CSV text.
pub fn write_canonical_csv(series: &PriceSeries) -> Result<String, DataError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    let to_parse = |e: csv::Error| DataError::Parse(e.to_string());

    wtr.write_record(CANONICAL_HEADER).map_err(to_parse)?;
    for bar in series.bars() {
        wtr.write_record([
            format_timestamp(&bar.timestamp),
            bar.open.to_string(),
            bar.high.to_string(),
            bar.low.to_string(),
            bar.close.to_string(),
            bar.volume.to_string(),
        ])
        .map_err(to_parse)?;
    }
    let data = wtr
        .into_inner()
        .map_err(|e| DataError::Io(e.into_error()))?;
    String::from_utf8(data).map_err(|e| DataError::Parse(e.to_string()))
}
