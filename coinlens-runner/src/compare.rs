//! Side-by-side comparison of one metric across analysed assets.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use coinlens_core::analysis::AssetAnalysis;
use coinlens_core::stats::mean;

use crate::runner::AssetReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareMetric {
    Price,
    /// Forecast change in percent.
    Change,
    Rsi,
    Macd,
}

impl CompareMetric {
    pub fn as_str(self) -> &'static str {
        match self {
            CompareMetric::Price => "price",
            CompareMetric::Change => "change",
            CompareMetric::Rsi => "rsi",
            CompareMetric::Macd => "macd",
        }
    }

    fn extract(self, a: &AssetAnalysis) -> f64 {
        match self {
            CompareMetric::Price => a.current_price(),
            CompareMetric::Change => a.prediction.pct_change,
            CompareMetric::Rsi => a.indicators.rsi,
            CompareMetric::Macd => a.indicators.macd,
        }
    }
}

impl fmt::Display for CompareMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompareMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "price" => Ok(CompareMetric::Price),
            "change" => Ok(CompareMetric::Change),
            "rsi" => Ok(CompareMetric::Rsi),
            "macd" => Ok(CompareMetric::Macd),
            other => Err(format!("unknown metric '{other}' (expected price, change, rsi or macd)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricValue {
    pub asset: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub metric: CompareMetric,
    pub values: Vec<MetricValue>,
    pub max: Option<f64>,
    pub min: Option<f64>,
    pub mean: Option<f64>,
}

/// Compare `metric` across successful reports; failed assets are skipped.
pub fn compare_assets(reports: &[AssetReport], metric: CompareMetric) -> Comparison {
    let values: Vec<MetricValue> = reports
        .iter()
        .filter_map(|r| {
            r.analysis.as_ref().map(|a| MetricValue {
                asset: r.asset.clone(),
                value: metric.extract(a),
            })
        })
        .collect();
    let raw: Vec<f64> = values.iter().map(|v| v.value).collect();
    Comparison {
        metric,
        max: raw.iter().copied().reduce(f64::max),
        min: raw.iter().copied().reduce(f64::min),
        mean: (!raw.is_empty()).then(|| mean(&raw)),
        values,
    }
}
