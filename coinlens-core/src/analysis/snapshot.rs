//! Point-in-time reading of a live asset, built from its recent hourly history.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::decision::{decide, DecisionConfig, DecisionLabel};
use super::prediction::predict;
use super::trend::Trend;
use super::AnalysisError;
use crate::domain::PriceSeries;
use crate::indicators::{IndicatorParams, IndicatorSet};
use crate::stats::cleaning_report;

pub const SNAPSHOT_MIN_BARS: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetSnapshot {
    pub asset: String,
    pub price: f64,
    /// Direction of the last bar-to-bar move.
    pub trend: Trend,
    /// Percent change of the last bar against the one before.
    pub change_pct: f64,
    pub volume: f64,
    pub high: f64,
    pub low: f64,
    pub decision: DecisionLabel,
    pub confidence: f64,
    pub forecast: f64,
    /// Forecast change in percent.
    pub expected_change_pct: f64,
    pub rsi: f64,
    pub macd: f64,
    pub mean: f64,
    /// Cleaned stddev as a percent of the cleaned mean.
    pub volatility_pct: f64,
    pub as_of: NaiveDateTime,
}

impl AssetSnapshot {
    pub fn from_series(
        asset: &str,
        series: &PriceSeries,
        params: &IndicatorParams,
        config: &DecisionConfig,
    ) -> Result<Self, AnalysisError> {
        let bars = series.bars();
        if bars.len() < SNAPSHOT_MIN_BARS {
            return Err(AnalysisError::InsufficientData {
                needed: SNAPSHOT_MIN_BARS,
                got: bars.len(),
            });
        }

        let last = bars[bars.len() - 1];
        let prev = bars[bars.len() - 2];
        let change_pct = last.change_pct_from(&prev);
        let trend = Trend::from_change(change_pct);

        let closes = series.closes();
        let stats = cleaning_report(series);
        let prediction = predict(&closes);
        let decision = decide(last.close, &stats, &prediction, trend, config);
        let indicators = IndicatorSet::compute(&closes, params).last();

        Ok(Self {
            asset: asset.to_string(),
            price: last.close,
            trend,
            change_pct,
            volume: bars.iter().map(|b| b.volume).sum(),
            high: bars.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max),
            low: bars.iter().map(|b| b.low).fold(f64::INFINITY, f64::min),
            decision: decision.label,
            confidence: decision.confidence,
            forecast: prediction.forecast,
            expected_change_pct: prediction.pct_change,
            rsi: indicators.rsi,
            macd: indicators.macd,
            mean: stats.mean,
            volatility_pct: if stats.mean > 0.0 {
                stats.stddev / stats.mean * 100.0
            } else {
                0.0
            },
            as_of: last.timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::{assert_approx, series_from_closes, DEFAULT_EPSILON};

    fn snapshot_with_defaults(series: &PriceSeries) -> Result<AssetSnapshot, AnalysisError> {
        let params = IndicatorParams::default();
        AssetSnapshot::from_series("BTC", series, &params, &DecisionConfig::default())
    }

    #[test]
    fn snapshot_from_short_history() {
        let series = series_from_closes(&[100.0, 102.0, 101.0, 103.0]);
        let snap = snapshot_with_defaults(&series).unwrap();
        assert_approx(snap.price, 103.0, DEFAULT_EPSILON);
        assert_eq!(snap.trend, Trend::Rising);
        assert_approx(snap.change_pct, 2.0 / 101.0 * 100.0, 1e-9);
        assert_approx(snap.volume, 4000.0, DEFAULT_EPSILON);
        assert_approx(snap.high, 103.0, DEFAULT_EPSILON);
        assert_approx(snap.low, 100.0, DEFAULT_EPSILON);
        assert_eq!(snap.as_of, series.last_timestamp().unwrap());
    }

    #[test]
    fn single_bar_is_insufficient() {
        let series = series_from_closes(&[100.0]);
        let err = snapshot_with_defaults(&series).unwrap_err();
        assert_eq!(err, AnalysisError::InsufficientData { needed: 2, got: 1 });
    }
}
