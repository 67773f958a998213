//! Rolling market sentiment from price change, volatility, volume and RSI.
//!
//! Each point scores a 7-bar window with the shared weighted scorer:
//! `0.5 + Σ factor·weight`, clamped to [0, 1].

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::scoring::{Factor, ThresholdTable, WeightedScorer};
use super::AnalysisError;
use crate::domain::PriceSeries;
use crate::indicators::rsi::{rsi, RSI_NEUTRAL};
use crate::indicators::RSI_PERIOD;
use crate::stats::{mean, pct_returns, population_std};

pub const WINDOW: usize = 7;
pub const NEUTRAL_SCORE: f64 = 0.5;

pub const CHANGE_WEIGHT: f64 = 0.2;
pub const VOLATILITY_WEIGHT: f64 = 0.1;
pub const VOLUME_WEIGHT: f64 = 0.1;
pub const RSI_WEIGHT: f64 = 0.15;

pub const STRONG_CHANGE_PCT: f64 = 5.0;
pub const MILD_CHANGE_PCT: f64 = 2.0;
pub const HIGH_VOLATILITY: f64 = 100.0;
pub const LOW_VOLATILITY: f64 = 30.0;
pub const VOLUME_SURGE: f64 = 2.0;
pub const VOLUME_DRY: f64 = 0.5;
pub const RSI_OVERSOLD: f64 = 30.0;
pub const RSI_OVERBOUGHT: f64 = 70.0;

pub const VOLATILITY_HIGH_BAND: f64 = 80.0;
pub const VOLATILITY_MODERATE_BAND: f64 = 40.0;

/// Days per year used to annualise daily volatility (crypto trades every day).
pub const ANNUALISATION_DAYS: f64 = 365.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SentimentLabel {
    VeryPositive,
    Positive,
    Neutral,
    Negative,
    VeryNegative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SentimentDirection {
    Bullish,
    Bearish,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Momentum {
    StrongBullish,
    Bullish,
    Bearish,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolatilityBand {
    High,
    Moderate,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketCondition {
    Overbought,
    Oversold,
    Normal,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentPoint {
    pub timestamp: NaiveDateTime,
    pub score: f64,
    pub price: f64,
    pub change_pct: f64,
    pub volatility_pct: f64,
    pub rsi: f64,
    pub volume_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentReport {
    pub label: SentimentLabel,
    pub score: f64,
    pub direction: SentimentDirection,
    pub momentum: Momentum,
    pub volatility: VolatilityBand,
    pub condition: MarketCondition,
    pub history: Vec<SentimentPoint>,
}

fn scorer() -> WeightedScorer<SentimentLabel> {
    WeightedScorer::new(ThresholdTable {
        above: vec![(0.7, SentimentLabel::VeryPositive), (0.6, SentimentLabel::Positive)],
        below: vec![(0.3, SentimentLabel::VeryNegative), (0.4, SentimentLabel::Negative)],
        otherwise: SentimentLabel::Neutral,
    })
    .with_base(NEUTRAL_SCORE)
    .with_bounds(0.0, 1.0)
}

fn change_factor(change_pct: f64) -> f64 {
    if change_pct > STRONG_CHANGE_PCT {
        1.0
    } else if change_pct > MILD_CHANGE_PCT {
        0.5
    } else if change_pct < -STRONG_CHANGE_PCT {
        -1.0
    } else if change_pct < -MILD_CHANGE_PCT {
        -0.5
    } else {
        0.0
    }
}

fn volatility_factor(volatility_pct: f64) -> f64 {
    if volatility_pct > HIGH_VOLATILITY {
        -1.0
    } else if volatility_pct < LOW_VOLATILITY {
        0.5
    } else {
        0.0
    }
}

fn volume_factor(ratio: f64) -> f64 {
    if ratio > VOLUME_SURGE {
        1.0
    } else if ratio < VOLUME_DRY {
        -1.0
    } else {
        0.0
    }
}

fn rsi_factor(rsi: f64) -> f64 {
    if rsi < RSI_OVERSOLD {
        1.0
    } else if rsi > RSI_OVERBOUGHT {
        -1.0
    } else {
        0.0
    }
}

fn point(
    series: &PriceSeries,
    i: usize,
    scorer: &WeightedScorer<SentimentLabel>,
) -> SentimentPoint {
    let bars = &series.bars()[i + 1 - WINDOW..=i];
    let prices: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let first = prices[0];
    let last = prices[WINDOW - 1];

    let change_pct = if first > 0.0 { (last / first - 1.0) * 100.0 } else { 0.0 };
    let volatility_pct = population_std(&pct_returns(&prices)) * ANNUALISATION_DAYS.sqrt() * 100.0;
    let rsi = rsi(&prices, RSI_PERIOD)
        .last()
        .copied()
        .filter(|v| v.is_finite())
        .unwrap_or(RSI_NEUTRAL);

    let prior_volume = mean(&bars[..WINDOW - 1].iter().map(|b| b.volume).collect::<Vec<_>>());
    let volume_ratio = if prior_volume > 0.0 {
        bars[WINDOW - 1].volume / prior_volume
    } else {
        1.0
    };

    let score = scorer.score(&[
        Factor::new(change_factor(change_pct), CHANGE_WEIGHT),
        Factor::new(volatility_factor(volatility_pct), VOLATILITY_WEIGHT),
        Factor::new(volume_factor(volume_ratio), VOLUME_WEIGHT),
        Factor::new(rsi_factor(rsi), RSI_WEIGHT),
    ]);

    SentimentPoint {
        timestamp: bars[WINDOW - 1].timestamp,
        score,
        price: last,
        change_pct,
        volatility_pct,
        rsi,
        volume_ratio,
    }
}

/// Score every bar from index [`WINDOW`] onward and summarise the latest one.
pub fn sentiment_history(series: &PriceSeries) -> Result<SentimentReport, AnalysisError> {
    if series.len() <= WINDOW {
        return Err(AnalysisError::InsufficientData {
            needed: WINDOW + 1,
            got: series.len(),
        });
    }

    let scorer = scorer();
    let history: Vec<SentimentPoint> = (WINDOW..series.len())
        .map(|i| point(series, i, &scorer))
        .collect();

    let latest = history[history.len() - 1];
    let direction = if history.len() >= 3 {
        if latest.score > history[history.len() - 3].score {
            SentimentDirection::Bullish
        } else {
            SentimentDirection::Bearish
        }
    } else {
        SentimentDirection::Neutral
    };

    let momentum = if latest.change_pct > STRONG_CHANGE_PCT {
        Momentum::StrongBullish
    } else if latest.change_pct > 0.0 {
        Momentum::Bullish
    } else if latest.change_pct < -STRONG_CHANGE_PCT {
        Momentum::Bearish
    } else {
        Momentum::Neutral
    };
    let volatility = if latest.volatility_pct > VOLATILITY_HIGH_BAND {
        VolatilityBand::High
    } else if latest.volatility_pct > VOLATILITY_MODERATE_BAND {
        VolatilityBand::Moderate
    } else {
        VolatilityBand::Low
    };
    let condition = if latest.rsi > RSI_OVERBOUGHT {
        MarketCondition::Overbought
    } else if latest.rsi < RSI_OVERSOLD {
        MarketCondition::Oversold
    } else {
        MarketCondition::Normal
    };

    Ok(SentimentReport {
        label: scorer.table.classify(latest.score),
        score: latest.score,
        direction,
        momentum,
        volatility,
        condition,
        history,
    })
}
