//! One OHLCV record for a single time interval.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Timestamps carry a time component because live histories are hourly;
/// daily bars sit at midnight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Bar whose High/Low are the body extremes, for sources that only carry
    /// open and close.
    pub fn from_body(timestamp: NaiveDateTime, open: f64, close: f64, volume: f64) -> Self {
        Self {
            timestamp,
            open,
            high: open.max(close),
            low: open.min(close),
            close,
            volume,
        }
    }

    /// High/Low enclose the body and the close is a usable price.
    pub fn envelope_holds(&self) -> bool {
        let prices = [self.open, self.high, self.low, self.close];
        prices.iter().all(|p| p.is_finite())
            && self.low <= self.open.min(self.close)
            && self.high >= self.open.max(self.close)
            && self.close > 0.0
    }

    /// Percent change of this close against `prev`'s close.
    pub fn change_pct_from(&self, prev: &Bar) -> f64 {
        (self.close - prev.close) / prev.close * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn body_bar_spans_open_and_close() {
        let bar = Bar::from_body(at(0), 101.5, 99.0, 0.0);
        assert_eq!(bar.high, 101.5);
        assert_eq!(bar.low, 99.0);
        assert!(bar.envelope_holds());
    }

    #[test]
    fn envelope_rejects_wick_inside_body() {
        let mut bar = Bar::from_body(at(1), 100.0, 104.0, 10.0);
        bar.high = 103.0;
        assert!(!bar.envelope_holds());
    }

    #[test]
    fn envelope_rejects_nan_and_non_positive_close() {
        let mut bar = Bar::from_body(at(2), 100.0, 104.0, 10.0);
        bar.low = f64::NAN;
        assert!(!bar.envelope_holds());
        let zero = Bar::from_body(at(3), 0.0, 0.0, 0.0);
        assert!(!zero.envelope_holds());
    }

    #[test]
    fn hourly_change() {
        let prev = Bar::from_body(at(4), 50.0, 50.0, 1.0);
        let next = Bar::from_body(at(5), 50.0, 51.0, 1.0);
        assert!((next.change_pct_from(&prev) - 2.0).abs() < 1e-12);
    }
}
