//! Moving Average Convergence Divergence (MACD).
//!
//! MACD = EMA(fast) - EMA(slow); signal = EMA(signal) of MACD;
//! histogram = MACD - signal. EMAs are bias-adjusted so every line is
//! defined from the first bar.

use serde::{Deserialize, Serialize};

use super::ema::ewm_mean;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MacdSeries {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

pub fn macd(closes: &[f64], fast: usize, slow: usize, signal: usize) -> MacdSeries {
    let ema_fast = ewm_mean(closes, fast);
    let ema_slow = ewm_mean(closes, slow);
    let line: Vec<f64> = ema_fast.iter().zip(&ema_slow).map(|(f, s)| f - s).collect();
    let signal_line = ewm_mean(&line, signal);
    let histogram = line.iter().zip(&signal_line).map(|(m, s)| m - s).collect();
    MacdSeries {
        macd: line,
        signal: signal_line,
        histogram,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn histogram_is_exact_difference() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + (i as f64 * 0.3).sin() * 5.0).collect();
        let m = macd(&closes, 12, 26, 9);
        for i in 0..closes.len() {
            assert_eq!(m.histogram[i], m.macd[i] - m.signal[i]);
        }
    }

    #[test]
    fn uptrend_has_positive_macd() {
        let closes = [
            100.0, 102.0, 104.0, 103.0, 105.0, 107.0, 106.0, 108.0, 110.0, 109.0, 111.0, 113.0,
            112.0, 114.0,
        ];
        let m = macd(&closes, 12, 26, 9);
        assert!(*m.macd.last().unwrap() > 0.0);
    }

    #[test]
    fn first_bar_is_zero() {
        let m = macd(&[50.0, 51.0], 12, 26, 9);
        assert_approx(m.macd[0], 0.0, DEFAULT_EPSILON);
        assert_approx(m.histogram[0], 0.0, DEFAULT_EPSILON);
    }
}
