//! Ingestion: raw price tables of unknown shape → canonical PriceSeries.
//!
//! Pipeline:
//! 1. Decode text (UTF-8 / Latin-1 / cp1252), parse with `,` and retry with `;`
//!    when the header collapses to a single column
//! 2. Map headers to OHLCV fields by synonym; detect an unnamed date column
//! 3. Parse dates (strict column formats first, then per cell); drop undated rows
//! 4. Parse locale-formatted numbers, sort by time
//! 5. Synthesize missing Open/High/Low/Volume, forward-fill then back-fill gaps
//! 6. Canonicalize (dedup timestamps, drop non-positive closes)
//!
//! `load_asset_file` is the failure-tolerant entry point: any error degrades to
//! the synthetic series and the result is tagged `DataSource::Synthetic`.

use chrono::NaiveDateTime;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, warn};

use super::columns::{clean_header, map_columns, ColumnMap};
use super::dates::{looks_like_dates, parse_date_column};
use super::encoding::{decode_text, TextEncoding};
use super::number::parse_number;
use super::provider::{DataError, DataSource, LoadedSeries};
use super::synthetic::synthetic_series;
use crate::domain::{Bar, PriceSeries};

/// Diagnostics collected while ingesting one table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestStats {
    pub encoding: TextEncoding,
    pub delimiter: char,
    pub rows_read: usize,
    pub rows_without_date: usize,
    pub close_inferred: bool,
    pub synthesized_columns: Vec<&'static str>,
}

/// A successfully ingested table.
#[derive(Debug, Clone)]
pub struct Ingested {
    pub series: PriceSeries,
    pub stats: IngestStats,
}

struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    encoding: TextEncoding,
    delimiter: char,
}

fn read_with_delimiter(
    text: &str,
    delimiter: u8,
) -> Result<(Vec<String>, Vec<Vec<String>>), DataError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| DataError::Parse(format!("unreadable header: {e}")))?
        .iter()
        .map(clean_header)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| DataError::Parse(e.to_string()))?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok((headers, rows))
}

fn read_table(bytes: &[u8]) -> Result<RawTable, DataError> {
    let (text, encoding) = decode_text(bytes);
    if text.trim().is_empty() {
        return Err(DataError::Unavailable("empty input".into()));
    }

    let (mut headers, mut rows) = read_with_delimiter(&text, b',')?;
    let mut delimiter = ',';
    if headers.len() == 1 {
        (headers, rows) = read_with_delimiter(&text, b';')?;
        delimiter = ';';
    }

    Ok(RawTable {
        headers,
        rows,
        encoding,
        delimiter,
    })
}

fn cell(row: &[String], index: usize) -> &str {
    row.get(index).map(String::as_str).unwrap_or("")
}

fn column(rows: &[Vec<String>], index: usize) -> Vec<&str> {
    rows.iter().map(|r| cell(r, index)).collect()
}

/// Forward-fill then back-fill a column in place.
fn fill_gaps(values: &mut [Option<f64>]) {
    let mut last = None;
    for v in values.iter_mut() {
        match v {
            Some(x) => last = Some(*x),
            None => *v = last,
        }
    }
    let mut next = None;
    for v in values.iter_mut().rev() {
        match v {
            Some(x) => next = Some(*x),
            None => *v = next,
        }
    }
}

fn normalize(bytes: &[u8], infer_close: bool) -> Result<Ingested, DataError> {
    let table = read_table(bytes)?;
    let mut map: ColumnMap = map_columns(&table.headers);

    if map.date.is_none() {
        map.date = (0..table.headers.len())
            .filter(|&i| !map.is_mapped(i))
            .find(|&i| looks_like_dates(&column(&table.rows, i)));
    }
    let date_idx = map
        .date
        .ok_or_else(|| DataError::Parse("no date column found".into()))?;

    let mut close_inferred = false;
    if map.close.is_none() {
        if !infer_close {
            return Err(DataError::Parse("price (Close) column not found".into()));
        }
        map.close = (0..table.headers.len()).find(|&i| i != date_idx);
        close_inferred = map.close.is_some();
    }
    let close_idx = map
        .close
        .ok_or_else(|| DataError::Parse("price (Close) column not found".into()))?;

    let timestamps = parse_date_column(&column(&table.rows, date_idx));
    let parse_col =
        |idx: Option<usize>, row: &[String]| idx.and_then(|i| parse_number(cell(row, i)));

    let mut records: Vec<(NaiveDateTime, [Option<f64>; 5])> = table
        .rows
        .iter()
        .zip(&timestamps)
        .filter_map(|(row, ts)| {
            ts.map(|ts| {
                (
                    ts,
                    [
                        parse_col(map.open, row),
                        parse_col(map.high, row),
                        parse_col(map.low, row),
                        parse_col(Some(close_idx), row),
                        parse_col(map.volume, row),
                    ],
                )
            })
        })
        .collect();
    let rows_without_date = table.rows.len() - records.len();
    if rows_without_date > 0 {
        warn!(rows = rows_without_date, "dropped rows with unparseable dates");
    }
    records.sort_by_key(|(ts, _)| *ts);

    let mut columns: [Vec<Option<f64>>; 5] = Default::default();
    for (_, values) in &records {
        for (col, v) in columns.iter_mut().zip(values) {
            col.push(*v);
        }
    }
    let [mut open, mut high, mut low, mut close, mut volume] = columns;
    fill_gaps(&mut close);

    let mut synthesized_columns = Vec::new();
    if map.open.is_none() {
        synthesized_columns.push("Open");
        open = (0..close.len())
            .map(|i| if i == 0 { close[0] } else { close[i - 1] })
            .collect();
    }
    fill_gaps(&mut open);
    if map.high.is_none() {
        synthesized_columns.push("High");
    }
    fill_gaps(&mut high);
    if map.low.is_none() {
        synthesized_columns.push("Low");
    }
    fill_gaps(&mut low);
    if map.volume.is_none() {
        synthesized_columns.push("Volume");
    }
    fill_gaps(&mut volume);

    let bars: Vec<Bar> = records
        .iter()
        .enumerate()
        .filter_map(|(i, (timestamp, _))| {
            let close = close[i]?;
            let open = open[i].unwrap_or(close);
            let body = Bar::from_body(*timestamp, open, close, volume[i].unwrap_or(0.0));
            Some(Bar {
                high: high[i].unwrap_or(body.high),
                low: low[i].unwrap_or(body.low),
                ..body
            })
        })
        .collect();

    let series = PriceSeries::from_unsorted(bars);
    if series.is_empty() {
        return Err(DataError::Unavailable("no usable price rows".into()));
    }

    debug!(
        rows = table.rows.len(),
        bars = series.len(),
        encoding = ?table.encoding,
        delimiter = %table.delimiter,
        "ingested price table"
    );

    Ok(Ingested {
        series,
        stats: IngestStats {
            encoding: table.encoding,
            delimiter: table.delimiter,
            rows_read: table.rows.len(),
            rows_without_date,
            close_inferred,
            synthesized_columns,
        },
    })
}

/// Parse a raw price table. When no Close column can be named, the first
/// non-date column is used as the price.
pub fn ingest_bytes(bytes: &[u8]) -> Result<Ingested, DataError> {
    normalize(bytes, true)
}

/// Parse a user-uploaded table. Unlike [`ingest_bytes`], a missing price column
/// is an error rather than a guess.
pub fn normalize_upload(bytes: &[u8]) -> Result<Ingested, DataError> {
    normalize(bytes, false)
}

/// Load the history file for an asset, never failing.
///
/// A missing file, unreadable bytes or an unparseable table all degrade to the
/// deterministic synthetic series ending at `fallback_end`.
pub fn load_asset_file(
    asset: &str,
    path: Option<&Path>,
    fallback_end: NaiveDateTime,
) -> LoadedSeries {
    let attempt = path
        .ok_or_else(|| DataError::Unavailable(format!("no history file for {asset}")))
        .and_then(|p| Ok((p, std::fs::read(p)?)))
        .and_then(|(p, bytes)| ingest_bytes(&bytes).map(|ingested| (p, ingested)));

    match attempt {
        Ok((p, ingested)) => {
            let online = p
                .file_stem()
                .and_then(|s| s.to_str())
                .is_some_and(|s| s.ends_with("_online"));
            LoadedSeries {
                asset: asset.to_string(),
                series: ingested.series,
                source: if online {
                    DataSource::OnlineCsv
                } else {
                    DataSource::Csv
                },
            }
        }
        Err(e) => {
            warn!(asset, error = %e, "falling back to synthetic series");
            LoadedSeries {
                asset: asset.to_string(),
                series: synthetic_series(asset, fallback_end),
                source: DataSource::Synthetic,
            }
        }
    }
}
