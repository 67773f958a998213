//! PriceSeries — time-ordered bars with the canonical invariants.
//!
//! Invariants: timestamps strictly increasing, no duplicates, every close
//! finite and > 0. Every downstream component consumes a series read-only.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use super::Bar;

#[derive(Debug, Error, PartialEq)]
pub enum SeriesError {
    #[error("timestamps not strictly increasing at index {index}")]
    NotIncreasing { index: usize },

    #[error("non-positive or non-finite close at index {index}")]
    InvalidClose { index: usize },
}

/// Deserializes as a plain bar list and goes through [`PriceSeries::new`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Bar>", into = "Vec<Bar>")]
pub struct PriceSeries {
    bars: Vec<Bar>,
}

impl PriceSeries {
    /// Build a series from bars that already satisfy the invariants.
    pub fn new(bars: Vec<Bar>) -> Result<Self, SeriesError> {
        for (i, bar) in bars.iter().enumerate() {
            if !(bar.close.is_finite() && bar.close > 0.0) {
                return Err(SeriesError::InvalidClose { index: i });
            }
            if i > 0 && bar.timestamp <= bars[i - 1].timestamp {
                return Err(SeriesError::NotIncreasing { index: i });
            }
        }
        Ok(Self { bars })
    }

    /// Canonicalize arbitrary bars: stable sort by timestamp, keep the first
    /// occurrence of each timestamp, drop bars without a usable close.
    pub fn from_unsorted(mut bars: Vec<Bar>) -> Self {
        bars.retain(|b| b.close.is_finite() && b.close > 0.0);
        bars.sort_by_key(|b| b.timestamp);
        let mut seen = HashSet::with_capacity(bars.len());
        bars.retain(|b| seen.insert(b.timestamp));
        Self { bars }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn into_bars(self) -> Vec<Bar> {
        self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Close prices in time order.
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.volume).collect()
    }

    pub fn timestamps(&self) -> Vec<NaiveDateTime> {
        self.bars.iter().map(|b| b.timestamp).collect()
    }

    pub fn last_close(&self) -> Option<f64> {
        self.bars.last().map(|b| b.close)
    }

    pub fn first_timestamp(&self) -> Option<NaiveDateTime> {
        self.bars.first().map(|b| b.timestamp)
    }

    pub fn last_timestamp(&self) -> Option<NaiveDateTime> {
        self.bars.last().map(|b| b.timestamp)
    }
}

impl TryFrom<Vec<Bar>> for PriceSeries {
    type Error = SeriesError;

    fn try_from(bars: Vec<Bar>) -> Result<Self, Self::Error> {
        Self::new(bars)
    }
}

impl From<PriceSeries> for Vec<Bar> {
    fn from(series: PriceSeries) -> Self {
        series.bars
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar(day: u32, close: f64) -> Bar {
        Bar {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, day)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 0.0,
        }
    }

    #[test]
    fn new_accepts_valid_bars() {
        let series = PriceSeries::new(vec![bar(1, 10.0), bar(2, 11.0)]).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.last_close(), Some(11.0));
    }

    #[test]
    fn new_rejects_duplicate_timestamp() {
        let err = PriceSeries::new(vec![bar(1, 10.0), bar(1, 11.0)]).unwrap_err();
        assert_eq!(err, SeriesError::NotIncreasing { index: 1 });
    }

    #[test]
    fn new_rejects_zero_close() {
        let err = PriceSeries::new(vec![bar(1, 0.0)]).unwrap_err();
        assert_eq!(err, SeriesError::InvalidClose { index: 0 });
    }

    #[test]
    fn from_unsorted_sorts_and_keeps_first_duplicate() {
        let series = PriceSeries::from_unsorted(vec![
            bar(3, 30.0),
            bar(1, 10.0),
            bar(3, 99.0),
            bar(2, f64::NAN),
            bar(2, 20.0),
        ]);
        assert_eq!(series.closes(), vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn deserialize_validates_bars() {
        let series = PriceSeries::new(vec![bar(1, 10.0), bar(2, 11.0)]).unwrap();
        let json = serde_json::to_string(&series).unwrap();
        assert!(json.starts_with('['));
        let back: PriceSeries = serde_json::from_str(&json).unwrap();
        assert_eq!(back, series);

        let unsorted = serde_json::to_string(&vec![bar(2, 11.0), bar(1, 10.0)]).unwrap();
        let err = serde_json::from_str::<PriceSeries>(&unsorted).unwrap_err();
        assert!(err.to_string().contains("not strictly increasing"), "{err}");

        let zero = serde_json::to_string(&vec![bar(1, 0.0)]).unwrap();
        assert!(serde_json::from_str::<PriceSeries>(&zero).is_err());
    }
}
