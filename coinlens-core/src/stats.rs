//! Cleaning and descriptive statistics.
//!
//! `clean` drops duplicate timestamps (first wins) and missing closes, then
//! fences outliers with the 1.5·IQR rule once at least [`IQR_MIN_BARS`] bars
//! remain. Quantiles use linear interpolation between order statistics.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

use crate::domain::{Bar, PriceSeries};

/// Below this many bars outlier filtering is skipped.
pub const IQR_MIN_BARS: usize = 10;
pub const IQR_FENCE: f64 = 1.5;

/// Descriptive statistics of a cleaned close series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CleaningReport {
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation (n − 1); 0 with fewer than two bars.
    pub stddev: f64,
    pub min: f64,
    pub max: f64,
    pub q1: f64,
    pub q3: f64,
    pub original_count: usize,
    pub cleaned_count: usize,
}

/// Output of [`clean`]: the surviving bars and their report.
#[derive(Debug, Clone)]
pub struct Cleaned {
    pub bars: Vec<Bar>,
    pub report: CleaningReport,
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation; 0 for fewer than two values.
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}

/// Population standard deviation; 0 for an empty slice.
pub fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (ss / values.len() as f64).sqrt()
}

/// Quantile of an ascending-sorted slice with linear interpolation.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let pos = q.clamp(0.0, 1.0) * (n - 1) as f64;
            let lo = pos.floor() as usize;
            let hi = pos.ceil() as usize;
            sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
        }
    }
}

fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Least-squares slope of `values` against their index (0, 1, 2, ...).
pub fn linear_slope(values: &[f64]) -> f64 {
    linear_fit(values).map(|(slope, _)| slope).unwrap_or(0.0)
}

/// Least-squares `(slope, intercept)` against the index, `None` below two points.
pub fn linear_fit(values: &[f64]) -> Option<(f64, f64)> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = mean(values);
    let (mut sxy, mut sxx) = (0.0, 0.0);
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        sxy += dx * (y - y_mean);
        sxx += dx * dx;
    }
    let slope = sxy / sxx;
    Some((slope, y_mean - slope * x_mean))
}

/// Period-over-period percent changes as fractions.
pub fn pct_returns(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|w| w[1] / w[0] - 1.0).collect()
}

/// Deduplicate, drop missing closes, fence outliers, and describe the result.
pub fn clean(bars: &[Bar]) -> Cleaned {
    let original_count = bars.len();
    let mut seen = HashSet::with_capacity(bars.len());
    let mut kept: Vec<Bar> = bars
        .iter()
        .filter(|b| seen.insert(b.timestamp))
        .filter(|b| b.close.is_finite())
        .copied()
        .collect();

    if kept.is_empty() {
        return Cleaned {
            bars: kept,
            report: CleaningReport {
                original_count,
                ..CleaningReport::default()
            },
        };
    }

    if kept.len() >= IQR_MIN_BARS {
        let sorted = sorted_copy(&kept.iter().map(|b| b.close).collect::<Vec<_>>());
        let q1 = quantile_sorted(&sorted, 0.25);
        let q3 = quantile_sorted(&sorted, 0.75);
        let iqr = q3 - q1;
        let (lo, hi) = (q1 - IQR_FENCE * iqr, q3 + IQR_FENCE * iqr);
        kept.retain(|b| b.close >= lo && b.close <= hi);
    }

    let closes: Vec<f64> = kept.iter().map(|b| b.close).collect();
    let sorted = sorted_copy(&closes);
    let report = CleaningReport {
        mean: mean(&closes),
        median: quantile_sorted(&sorted, 0.5),
        stddev: sample_std(&closes),
        min: sorted[0],
        max: sorted[sorted.len() - 1],
        q1: quantile_sorted(&sorted, 0.25),
        q3: quantile_sorted(&sorted, 0.75),
        original_count,
        cleaned_count: closes.len(),
    };
    debug!(original_count, cleaned_count = report.cleaned_count, "cleaned close series");

    Cleaned { bars: kept, report }
}

/// Report for an already-canonical series.
pub fn cleaning_report(series: &PriceSeries) -> CleaningReport {
    clean(series.bars()).report
}
