//! Short/medium-window trend classifier.
//!
//! score = 0.4 · (slope_short / price · 100)
//!       + 0.3 · sign(ma_short − ma_medium)
//!       + 0.3 · rsi band (+1 above 55, −1 below 45)
//!
//! Rising above +0.15, falling below −0.15, stable otherwise.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::indicators::rsi::{rsi_from_averages, RSI_NEUTRAL};
use crate::stats::{linear_slope, mean};

pub const SHORT_WINDOW: usize = 5;
pub const MEDIUM_WINDOW: usize = 10;
/// Number of deltas (not closes) in the trend RSI window.
pub const TREND_RSI_DELTAS: usize = 14;
pub const SLOPE_WEIGHT: f64 = 0.4;
pub const MA_WEIGHT: f64 = 0.3;
pub const RSI_WEIGHT: f64 = 0.3;
pub const RSI_BULL_BAND: f64 = 55.0;
pub const RSI_BEAR_BAND: f64 = 45.0;
pub const RISING_CUTOFF: f64 = 0.15;
pub const FALLING_CUTOFF: f64 = -0.15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trend {
    #[serde(rename = "ALTA")]
    Rising,
    #[serde(rename = "BAJA")]
    Falling,
    #[serde(rename = "ESTABLE")]
    Stable,
}

impl Trend {
    /// +1 rising, −1 falling, 0 stable.
    pub fn direction(self) -> i8 {
        match self {
            Trend::Rising => 1,
            Trend::Falling => -1,
            Trend::Stable => 0,
        }
    }

    /// Trend implied by a single price change.
    pub fn from_change(change: f64) -> Self {
        if change > 0.0 {
            Trend::Rising
        } else if change < 0.0 {
            Trend::Falling
        } else {
            Trend::Stable
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Trend::Rising => "ALTA",
            Trend::Falling => "BAJA",
            Trend::Stable => "ESTABLE",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendReading {
    pub current_price: f64,
    pub trend: Trend,
    pub slope_short: f64,
    pub slope_medium: f64,
    pub ma_short: f64,
    pub ma_medium: f64,
    pub rsi: f64,
    pub score: f64,
}

impl TrendReading {
    fn degenerate(current_price: f64) -> Self {
        Self {
            current_price,
            trend: Trend::Stable,
            slope_short: 0.0,
            slope_medium: 0.0,
            ma_short: current_price,
            ma_medium: current_price,
            rsi: RSI_NEUTRAL,
            score: 0.0,
        }
    }
}

fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// RSI over the last [`TREND_RSI_DELTAS`] deltas using summed gains and
/// losses. A window with no movement at all is neutral.
fn window_rsi(closes: &[f64]) -> f64 {
    if closes.len() <= TREND_RSI_DELTAS {
        return RSI_NEUTRAL;
    }
    let window = &closes[closes.len() - TREND_RSI_DELTAS - 1..];
    let (gains, losses) = window.windows(2).fold((0.0, 0.0), |(g, l), w| {
        let d = w[1] - w[0];
        if d > 0.0 {
            (g + d, l)
        } else if d < 0.0 {
            (g, l - d)
        } else {
            (g, l)
        }
    });
    rsi_from_averages(gains, losses)
}

pub fn classify_trend(closes: &[f64]) -> TrendReading {
    let n = closes.len();
    if n < SHORT_WINDOW {
        return TrendReading::degenerate(closes.last().copied().unwrap_or(0.0));
    }

    let current_price = closes[n - 1];
    let last_short = &closes[n - SHORT_WINDOW..];
    // Below the medium window both windows are the short one
    let last_medium = if n >= MEDIUM_WINDOW {
        &closes[n - MEDIUM_WINDOW..]
    } else {
        last_short
    };

    let slope_short = linear_slope(last_short);
    let slope_medium = linear_slope(last_medium);
    let ma_short = mean(last_short);
    let ma_medium = mean(last_medium);
    let rsi = window_rsi(closes);

    let slope_term = if current_price > 0.0 {
        slope_short / current_price * 100.0 * SLOPE_WEIGHT
    } else {
        0.0
    };
    let rsi_band = if rsi > RSI_BULL_BAND {
        1.0
    } else if rsi < RSI_BEAR_BAND {
        -1.0
    } else {
        0.0
    };
    let score = slope_term + sign(ma_short - ma_medium) * MA_WEIGHT + rsi_band * RSI_WEIGHT;

    let trend = if score > RISING_CUTOFF {
        Trend::Rising
    } else if score < FALLING_CUTOFF {
        Trend::Falling
    } else {
        Trend::Stable
    };

    TrendReading {
        current_price,
        trend,
        slope_short,
        slope_medium,
        ma_short,
        ma_medium,
        rsi,
        score,
    }
}
