//! Date parsing for heterogeneous price tables.
//!
//! A column is first tried against a fixed list of strict formats; the first
//! format that parses every non-empty cell wins. Otherwise each cell is parsed
//! permissively on its own and cells that still fail become `None`.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Whole-column formats, tried in order.
pub const COLUMN_DATE_FORMATS: [&str; 5] = [
    "%d.%m.%Y",
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%Y-%m-%d %H:%M:%S",
];

/// Share of cells that must parse as dates for an unnamed column to be
/// promoted to the date column.
pub const DATE_DETECTION_RATIO: f64 = 0.8;

const PERMISSIVE_DATETIME_FORMATS: [&str; 7] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

const PERMISSIVE_OFFSET_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S%:z",
    "%Y-%m-%d %H:%M:%S%z",
    "%Y-%m-%d %H:%M:%S %z",
];

const PERMISSIVE_DATE_FORMATS: [&str; 9] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d.%m.%Y",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%d %b %Y",
];

fn parse_with_format(cell: &str, fmt: &str) -> Option<NaiveDateTime> {
    if fmt.contains("%H") {
        NaiveDateTime::parse_from_str(cell, fmt).ok()
    } else {
        NaiveDate::parse_from_str(cell, fmt)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
    }
}

/// Parse a single cell with every permissive rule. Offsets are converted to UTC.
pub fn parse_date_permissive(raw: &str) -> Option<NaiveDateTime> {
    let cell = raw.trim().trim_matches('"');
    if cell.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(cell) {
        return Some(dt.naive_utc());
    }
    for fmt in PERMISSIVE_OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(cell, fmt) {
            return Some(dt.naive_utc());
        }
    }
    for fmt in PERMISSIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(cell, fmt) {
            return Some(dt);
        }
    }
    for fmt in PERMISSIVE_DATE_FORMATS {
        if let Some(dt) = parse_with_format(cell, fmt) {
            return Some(dt);
        }
    }
    parse_epoch(cell)
}

/// Epoch seconds (9-11 digits) or milliseconds (12-13 digits).
fn parse_epoch(cell: &str) -> Option<NaiveDateTime> {
    if !cell.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let value: i64 = cell.parse().ok()?;
    let dt = match cell.len() {
        9..=11 => DateTime::from_timestamp(value, 0),
        12..=13 => DateTime::from_timestamp_millis(value),
        _ => None,
    }?;
    Some(dt.naive_utc())
}

/// Parse a whole column. Returns one entry per input cell.
pub fn parse_date_column(cells: &[&str]) -> Vec<Option<NaiveDateTime>> {
    let non_empty = cells.iter().filter(|c| !c.trim().is_empty()).count();
    if non_empty > 0 {
        for fmt in COLUMN_DATE_FORMATS {
            let parsed: Vec<Option<NaiveDateTime>> = cells
                .iter()
                .map(|c| parse_with_format(c.trim().trim_matches('"'), fmt))
                .collect();
            if parsed.iter().filter(|p| p.is_some()).count() == non_empty {
                return parsed;
            }
        }
    }
    cells.iter().map(|c| parse_date_permissive(c)).collect()
}

/// True when at least [`DATE_DETECTION_RATIO`] of the cells parse as dates.
pub fn looks_like_dates(cells: &[&str]) -> bool {
    if cells.is_empty() {
        return false;
    }
    let parsed = cells.iter().filter(|c| parse_date_permissive(c).is_some()).count();
    parsed as f64 >= cells.len() as f64 * DATE_DETECTION_RATIO
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn dotted_european_column() {
        let parsed = parse_date_column(&["01.02.2024", "02.02.2024"]);
        assert_eq!(parsed, vec![Some(ymd(2024, 2, 1)), Some(ymd(2024, 2, 2))]);
    }

    #[test]
    fn ambiguous_slashes_prefer_month_first() {
        let parsed = parse_date_column(&["01/02/2024", "03/04/2024"]);
        assert_eq!(parsed[0], Some(ymd(2024, 1, 2)));
    }

    #[test]
    fn day_first_when_month_first_fails() {
        let parsed = parse_date_column(&["01/02/2024", "25/02/2024"]);
        assert_eq!(parsed[1], Some(ymd(2024, 2, 25)));
        assert_eq!(parsed[0], Some(ymd(2024, 2, 1)));
    }

    #[test]
    fn mixed_column_falls_back_per_cell() {
        let parsed = parse_date_column(&["2024-01-01", "Jan 02, 2024", "garbage"]);
        assert_eq!(parsed[0], Some(ymd(2024, 1, 1)));
        assert_eq!(parsed[1], Some(ymd(2024, 1, 2)));
        assert_eq!(parsed[2], None);
    }

    #[test]
    fn offsets_are_normalized_to_utc() {
        let dt = parse_date_permissive("2024-01-01T02:00:00+02:00").unwrap();
        assert_eq!(dt, ymd(2024, 1, 1));
    }

    #[test]
    fn epoch_seconds_and_millis() {
        assert_eq!(parse_date_permissive("1704067200"), Some(ymd(2024, 1, 1)));
        assert_eq!(parse_date_permissive("1704067200000"), Some(ymd(2024, 1, 1)));
    }

    #[test]
    fn prices_do_not_look_like_dates() {
        assert!(!looks_like_dates(&["45000.5", "45100.2", "44900.0"]));
        assert!(looks_like_dates(&["2024-01-01", "2024-01-02", "2024-01-03", "2024-01-04", "x"]));
    }
}
