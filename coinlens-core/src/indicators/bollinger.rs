//! Bollinger Bands: SMA(period) ± k · rolling sample stddev (n − 1).
//!
//! Lookback: period - 1.

use serde::{Deserialize, Serialize};

use super::sma::sma;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BollingerSeries {
    pub upper: Vec<f64>,
    pub middle: Vec<f64>,
    pub lower: Vec<f64>,
}

pub fn bollinger(closes: &[f64], period: usize, k: f64) -> BollingerSeries {
    let n = closes.len();
    let middle = sma(closes, period);
    let mut upper = vec![f64::NAN; n];
    let mut lower = vec![f64::NAN; n];

    if period >= 2 && n >= period {
        for i in (period - 1)..n {
            let window = &closes[i + 1 - period..=i];
            let m = middle[i];
            let var = window.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (period - 1) as f64;
            let sd = var.sqrt();
            upper[i] = m + k * sd;
            lower[i] = m - k * sd;
        }
    }

    BollingerSeries {
        upper,
        middle,
        lower,
    }
}
