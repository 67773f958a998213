//! Full per-asset analysis bundle and its flat export record.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::decision::{decide, Decision, DecisionConfig, DecisionLabel};
use super::prediction::{predict, Prediction};
use super::trend::{classify_trend, Trend, TrendReading};
use super::AnalysisError;
use crate::data::DataSource;
use crate::domain::PriceSeries;
use crate::indicators::{IndicatorParams, IndicatorSet, IndicatorSnapshot};
use crate::stats::{cleaning_report, CleaningReport};

/// Minimum bars for a full analysis.
pub const ANALYSIS_MIN_BARS: usize = 10;

/// Tunables for [`analyze_series`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub indicators: IndicatorParams,
    pub decision: DecisionConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetAnalysis {
    pub asset: String,
    pub source: DataSource,
    pub bars: usize,
    pub as_of: NaiveDateTime,
    pub trend: TrendReading,
    pub stats: CleaningReport,
    pub prediction: Prediction,
    pub decision: Decision,
    pub indicators: IndicatorSnapshot,
    /// Cleaned stddev as a percent of the cleaned mean.
    pub volatility_pct: f64,
}

impl AssetAnalysis {
    pub fn current_price(&self) -> f64 {
        self.trend.current_price
    }

    pub fn is_synthetic(&self) -> bool {
        self.source == DataSource::Synthetic
    }
}

/// Run trend, cleaning, prediction, decision and indicators over one series.
pub fn analyze_series(
    asset: &str,
    series: &PriceSeries,
    source: DataSource,
    config: &AnalysisConfig,
) -> Result<AssetAnalysis, AnalysisError> {
    let (Some(as_of), true) = (series.last_timestamp(), series.len() >= ANALYSIS_MIN_BARS) else {
        return Err(AnalysisError::InsufficientData {
            needed: ANALYSIS_MIN_BARS,
            got: series.len(),
        });
    };

    let closes = series.closes();
    let trend = classify_trend(&closes);
    let stats = cleaning_report(series);
    let prediction = predict(&closes);
    let decision = decide(trend.current_price, &stats, &prediction, trend.trend, &config.decision);
    let indicators = IndicatorSet::compute(&closes, &config.indicators).last();
    let volatility_pct = if stats.mean > 0.0 {
        stats.stddev / stats.mean * 100.0
    } else {
        0.0
    };

    debug!(
        asset,
        bars = closes.len(),
        trend = %trend.trend,
        decision = %decision.label,
        "analysis complete"
    );

    Ok(AssetAnalysis {
        asset: asset.to_string(),
        source,
        bars: closes.len(),
        as_of,
        trend,
        stats,
        prediction,
        decision,
        indicators,
        volatility_pct,
    })
}

/// Flat row for CSV/JSON export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub asset: String,
    pub price: f64,
    pub trend: Trend,
    pub decision: DecisionLabel,
    pub confidence: f64,
    pub forecast: f64,
    pub pct_change: f64,
    pub mean: f64,
    pub rsi: f64,
    pub macd: f64,
    pub volatility_pct: f64,
    pub synthetic: bool,
    pub timestamp: NaiveDateTime,
}

impl From<&AssetAnalysis> for AnalysisRecord {
    fn from(a: &AssetAnalysis) -> Self {
        Self {
            asset: a.asset.clone(),
            price: a.current_price(),
            trend: a.trend.trend,
            decision: a.decision.label,
            confidence: a.decision.confidence,
            forecast: a.prediction.forecast,
            pct_change: a.prediction.pct_change,
            mean: a.stats.mean,
            rsi: a.indicators.rsi,
            macd: a.indicators.macd,
            volatility_pct: a.volatility_pct,
            synthetic: a.is_synthetic(),
            timestamp: a.as_of,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::{assert_approx, series_from_closes, DEFAULT_EPSILON};

    fn uptrend(n: usize) -> PriceSeries {
        let closes: Vec<f64> = (0..n).map(|i| 100.0 + i as f64).collect();
        series_from_closes(&closes)
    }

    #[test]
    fn rejects_short_series() {
        let config = AnalysisConfig::default();
        let err = analyze_series("BTC", &uptrend(9), DataSource::Csv, &config).unwrap_err();
        assert_eq!(err, AnalysisError::InsufficientData { needed: 10, got: 9 });
    }

    #[test]
    fn empty_series_is_insufficient() {
        let config = AnalysisConfig::default();
        let err =
            analyze_series("BTC", &PriceSeries::empty(), DataSource::Csv, &config).unwrap_err();
        assert_eq!(err, AnalysisError::InsufficientData { needed: 10, got: 0 });
    }

    #[test]
    fn uptrend_bundle() {
        let series = uptrend(30);
        let config = AnalysisConfig::default();
        let a = analyze_series("ETH", &series, DataSource::Csv, &config).unwrap();
        assert_eq!(a.bars, 30);
        assert_eq!(a.trend.trend, Trend::Rising);
        assert_approx(a.current_price(), 129.0, DEFAULT_EPSILON);
        assert!((a.prediction.forecast - 129.0).abs() <= 129.0 * 0.15 + 1e-9);
        assert!(a.indicators.macd > 0.0);
        assert!(a.volatility_pct > 0.0);
        assert_eq!(a.as_of, series.last_timestamp().unwrap());
    }

    #[test]
    fn record_carries_synthetic_flag() {
        let config = AnalysisConfig::default();
        let a = analyze_series("SOL", &uptrend(12), DataSource::Synthetic, &config).unwrap();
        let record = AnalysisRecord::from(&a);
        assert!(record.synthetic);
        assert_eq!(record.asset, "SOL");
        assert_eq!(record.decision, a.decision.label);
    }
}
