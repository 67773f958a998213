//! Indicator engine: RSI, MACD, Bollinger Bands, SMA and EMA.
//!
//! Every indicator is a pure function of a close-price slice and returns a
//! sequence aligned 1:1 with its input. Bars before a window fills hold
//! `f64::NAN`, except RSI which resolves undefined values to neutral 50.

pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;

pub use bollinger::{bollinger, BollingerSeries};
pub use ema::ewm_mean;
pub use macd::{macd, MacdSeries};
pub use rsi::rsi;
pub use sma::sma;

use serde::{Deserialize, Serialize};

pub const RSI_PERIOD: usize = 14;
pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;
pub const BOLLINGER_PERIOD: usize = 20;
pub const BOLLINGER_K: f64 = 2.0;

/// Indicator periods, overridable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorParams {
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub bollinger_period: usize,
    pub bollinger_k: f64,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            rsi_period: RSI_PERIOD,
            macd_fast: MACD_FAST,
            macd_slow: MACD_SLOW,
            macd_signal: MACD_SIGNAL,
            bollinger_period: BOLLINGER_PERIOD,
            bollinger_k: BOLLINGER_K,
        }
    }
}

/// All per-bar indicators for one close series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorSet {
    pub rsi: Vec<f64>,
    pub macd: MacdSeries,
    pub bollinger: BollingerSeries,
}

/// Most recent value of every indicator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub rsi: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub macd_histogram: f64,
    pub bollinger_upper: Option<f64>,
    pub bollinger_middle: Option<f64>,
    pub bollinger_lower: Option<f64>,
}

impl IndicatorSet {
    pub fn compute(closes: &[f64], params: &IndicatorParams) -> Self {
        Self {
            rsi: rsi(closes, params.rsi_period),
            macd: macd(closes, params.macd_fast, params.macd_slow, params.macd_signal),
            bollinger: bollinger(closes, params.bollinger_period, params.bollinger_k),
        }
    }

    pub fn len(&self) -> usize {
        self.rsi.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rsi.is_empty()
    }

    /// Last-bar values. An empty series reports RSI 50 and a flat MACD.
    pub fn last(&self) -> IndicatorSnapshot {
        let finite = |v: Option<&f64>| v.copied().filter(|x| x.is_finite());
        IndicatorSnapshot {
            rsi: finite(self.rsi.last()).unwrap_or(rsi::RSI_NEUTRAL),
            macd: finite(self.macd.macd.last()).unwrap_or(0.0),
            macd_signal: finite(self.macd.signal.last()).unwrap_or(0.0),
            macd_histogram: finite(self.macd.histogram.last()).unwrap_or(0.0),
            bollinger_upper: finite(self.bollinger.upper.last()),
            bollinger_middle: finite(self.bollinger.middle.last()),
            bollinger_lower: finite(self.bollinger.lower.last()),
        }
    }
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_is_aligned_with_input() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let set = IndicatorSet::compute(&closes, &IndicatorParams::default());
        assert_eq!(set.len(), 40);
        assert_eq!(set.macd.histogram.len(), 40);
        assert_eq!(set.bollinger.upper.len(), 40);
    }

    #[test]
    fn empty_snapshot_is_neutral() {
        let set = IndicatorSet::compute(&[], &IndicatorParams::default());
        assert!(set.is_empty());
        let last = set.last();
        assert_eq!(last.rsi, 50.0);
        assert_eq!(last.macd, 0.0);
        assert_eq!(last.bollinger_upper, None);
    }

    #[test]
    fn set_matches_standalone_functions() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + (i as f64 * 0.4).sin() * 8.0).collect();
        let params = IndicatorParams {
            rsi_period: 7,
            bollinger_period: 10,
            bollinger_k: 1.5,
            ..IndicatorParams::default()
        };
        let set = IndicatorSet::compute(&closes, &params);
        assert_eq!(set.rsi, rsi(&closes, 7));
        assert_eq!(set.macd, macd(&closes, MACD_FAST, MACD_SLOW, MACD_SIGNAL));

        let bands = bollinger(&closes, 10, 1.5);
        assert_eq!(set.bollinger.middle[20..], bands.middle[20..]);
        assert_eq!(set.bollinger.middle[10..], sma(&closes, 10)[10..]);
        assert_approx(set.last().bollinger_upper.unwrap_or(f64::NAN), bands.upper[59], 1e-12);
        assert_approx(set.last().macd, ewm_mean(&closes, 12)[59] - ewm_mean(&closes, 26)[59], 1e-9);
    }

    #[test]
    fn params_deserialize_partial() {
        let params: IndicatorParams = serde_json::from_str(r#"{"rsi_period": 7}"#).unwrap();
        assert_eq!(params.rsi_period, 7);
        assert_eq!(params.macd_slow, MACD_SLOW);
    }
}
