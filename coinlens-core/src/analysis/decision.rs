//! Weighted-factor trading decision.
//!
//! Four factors in {−1, 0, +1}:
//! - trend: +1 rising, −1 falling
//! - price vs mean: ±1 beyond ±5% of the cleaned mean
//! - prediction: ±1 beyond ±2% forecast change
//! - range position: +1 in the bottom 30% of the cleaned range, −1 in the top 30%
//!
//! The range factor buys low and sells high while the others follow the trend;
//! that mix is kept as-is.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::prediction::Prediction;
use super::scoring::{Factor, ThresholdTable, WeightedScorer};
use super::trend::Trend;
use crate::stats::CleaningReport;

pub const TREND_WEIGHT: f64 = 0.3;
pub const PRICE_VS_MEAN_WEIGHT: f64 = 0.25;
pub const PREDICTION_WEIGHT: f64 = 0.25;
pub const RANGE_POSITION_WEIGHT: f64 = 0.2;

pub const STRONG_BUY_ABOVE: f64 = 0.3;
pub const BUY_ABOVE: f64 = 0.1;
pub const STRONG_SELL_BELOW: f64 = -0.3;
pub const SELL_BELOW: f64 = -0.1;

/// Relative deviation from the mean that counts as over/under valued.
pub const MEAN_DEVIATION: f64 = 0.05;
/// Forecast change (percent) that counts as a directional prediction.
pub const PREDICTION_PCT: f64 = 2.0;
pub const RANGE_LOW: f64 = 0.3;
pub const RANGE_HIGH: f64 = 0.7;

pub const BASE_CONFIDENCE: f64 = 0.5;
pub const MAX_CONFIDENCE: f64 = 0.95;

pub const MIXED_SIGNALS_REASON: &str = "Mixed signals, waiting is recommended";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionLabel {
    StrongBuy,
    Buy,
    Hold,
    Sell,
    StrongSell,
}

impl fmt::Display for DecisionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DecisionLabel::StrongBuy => "STRONG_BUY",
            DecisionLabel::Buy => "BUY",
            DecisionLabel::Hold => "HOLD",
            DecisionLabel::Sell => "SELL",
            DecisionLabel::StrongSell => "STRONG_SELL",
        })
    }
}

/// Factor weights and cut points for the decision engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionConfig {
    pub trend_weight: f64,
    pub price_vs_mean_weight: f64,
    pub prediction_weight: f64,
    pub range_position_weight: f64,
    pub strong_buy_above: f64,
    pub buy_above: f64,
    pub sell_below: f64,
    pub strong_sell_below: f64,
    pub mean_deviation: f64,
    pub prediction_pct: f64,
    pub range_low: f64,
    pub range_high: f64,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            trend_weight: TREND_WEIGHT,
            price_vs_mean_weight: PRICE_VS_MEAN_WEIGHT,
            prediction_weight: PREDICTION_WEIGHT,
            range_position_weight: RANGE_POSITION_WEIGHT,
            strong_buy_above: STRONG_BUY_ABOVE,
            buy_above: BUY_ABOVE,
            sell_below: SELL_BELOW,
            strong_sell_below: STRONG_SELL_BELOW,
            mean_deviation: MEAN_DEVIATION,
            prediction_pct: PREDICTION_PCT,
            range_low: RANGE_LOW,
            range_high: RANGE_HIGH,
        }
    }
}

impl DecisionConfig {
    fn scorer(&self) -> WeightedScorer<DecisionLabel> {
        WeightedScorer::new(ThresholdTable {
            above: vec![
                (self.strong_buy_above, DecisionLabel::StrongBuy),
                (self.buy_above, DecisionLabel::Buy),
            ],
            below: vec![
                (self.strong_sell_below, DecisionLabel::StrongSell),
                (self.sell_below, DecisionLabel::Sell),
            ],
            otherwise: DecisionLabel::Hold,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactorBreakdown {
    pub trend: i8,
    pub price_vs_mean: i8,
    pub prediction: i8,
    pub range_position: i8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub label: DecisionLabel,
    pub confidence: f64,
    pub score: f64,
    pub factors: FactorBreakdown,
    pub reasons: Vec<String>,
}

fn band(value: f64, lower: f64, upper: f64) -> i8 {
    if value > upper {
        1
    } else if value < lower {
        -1
    } else {
        0
    }
}

fn factor_breakdown(
    current_price: f64,
    stats: &CleaningReport,
    prediction: &Prediction,
    trend: Trend,
    config: &DecisionConfig,
) -> FactorBreakdown {
    let deviation = if stats.mean > 0.0 {
        (current_price - stats.mean) / stats.mean
    } else {
        0.0
    };

    let range = stats.max - stats.min;
    let range_position = if range > 0.0 {
        let position = (current_price - stats.min) / range;
        // Contrarian: near the low is bullish, near the high bearish
        -band(position, config.range_low, config.range_high)
    } else {
        0
    };

    FactorBreakdown {
        trend: trend.direction(),
        price_vs_mean: band(deviation, -config.mean_deviation, config.mean_deviation),
        prediction: band(prediction.pct_change, -config.prediction_pct, config.prediction_pct),
        range_position,
    }
}

fn reasons(factors: &FactorBreakdown, prediction: &Prediction) -> Vec<String> {
    let mut reasons = Vec::new();
    match factors.trend {
        1 => reasons.push("Confirmed upward trend".to_string()),
        -1 => reasons.push("Downward trend detected".to_string()),
        _ => {}
    }
    match factors.price_vs_mean {
        1 => reasons.push("Price is above its historical mean".to_string()),
        -1 => reasons.push("Price is below its historical mean, possible entry".to_string()),
        _ => {}
    }
    match factors.prediction {
        1 => reasons.push(format!("Positive projection of {:+.1}%", prediction.pct_change)),
        -1 => reasons.push(format!("Negative projection of {:+.1}%", prediction.pct_change)),
        _ => {}
    }
    if reasons.is_empty() {
        reasons.push(MIXED_SIGNALS_REASON.to_string());
    }
    reasons
}

/// Map trend, cleaned statistics and forecast to a recommendation.
///
/// Deterministic: identical inputs always produce an identical decision.
pub fn decide(
    current_price: f64,
    stats: &CleaningReport,
    prediction: &Prediction,
    trend: Trend,
    config: &DecisionConfig,
) -> Decision {
    let factors = factor_breakdown(current_price, stats, prediction, trend, config);
    let (score, label) = config.scorer().evaluate(&[
        Factor::new(factors.trend as f64, config.trend_weight),
        Factor::new(factors.price_vs_mean as f64, config.price_vs_mean_weight),
        Factor::new(factors.prediction as f64, config.prediction_weight),
        Factor::new(factors.range_position as f64, config.range_position_weight),
    ]);

    Decision {
        label,
        confidence: MAX_CONFIDENCE.min(BASE_CONFIDENCE + score.abs()),
        score,
        factors,
        reasons: reasons(&factors, prediction),
    }
}
