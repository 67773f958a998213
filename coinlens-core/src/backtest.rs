//! Rule-based strategy replay over a single price series.
//!
//! Long-only, all-in: a buy takes the whole capital into the position, a sell
//! compounds the realized return back into capital. A position still open on
//! the last bar is closed at the last close.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::analysis::AnalysisError;
use crate::domain::PriceSeries;
use crate::indicators::bollinger::bollinger;
use crate::indicators::macd::macd;
use crate::indicators::rsi::rsi;
use crate::indicators::sma::sma;
use crate::indicators::{
    BOLLINGER_K, BOLLINGER_PERIOD, MACD_FAST, MACD_SIGNAL, MACD_SLOW, RSI_PERIOD,
};

pub const BACKTEST_MIN_BARS: usize = 30;
pub const DEFAULT_INITIAL_CAPITAL: f64 = 10_000.0;
pub const RSI_OVERSOLD: f64 = 30.0;
pub const RSI_OVERBOUGHT: f64 = 70.0;
pub const GOLDEN_CROSS_FAST: usize = 50;
pub const GOLDEN_CROSS_SLOW: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Buy on RSI < 30 with MACD above signal; sell on RSI > 70 with MACD below.
    RsiMacd,
    /// Buy below the lower band; sell above the upper band.
    Bollinger,
    /// SMA50 crossing SMA200.
    GoldenCross,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [Strategy::RsiMacd, Strategy::Bollinger, Strategy::GoldenCross];

    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::RsiMacd => "rsi_macd",
            Strategy::Bollinger => "bollinger",
            Strategy::GoldenCross => "golden_cross",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Strategy::ALL
            .into_iter()
            .find(|st| st.as_str() == wanted)
            .ok_or_else(|| AnalysisError::UnknownStrategy(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeSide {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Position {
    Flat,
    Long { entry: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeEntry {
    pub side: TradeSide,
    pub timestamp: NaiveDateTime,
    pub price: f64,
    /// Fractional return, sells only.
    pub realized_gain: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    pub strategy: Strategy,
    pub initial_capital: f64,
    pub final_capital: f64,
    pub total_return_pct: f64,
    pub buy_and_hold_pct: f64,
    /// Largest peak-to-trough decline of the close series, as a positive percent.
    pub max_drawdown_pct: f64,
    pub trades: Vec<TradeEntry>,
    pub wins: usize,
    pub losses: usize,
}

impl BacktestResult {
    pub fn trade_count(&self) -> usize {
        self.trades.len()
    }
}

/// Per-bar entry/exit signals, precomputed for the whole series.
struct Signals {
    buy: Vec<bool>,
    sell: Vec<bool>,
}

impl Signals {
    fn compute(strategy: Strategy, closes: &[f64]) -> Self {
        let n = closes.len();
        let (buy, sell) = match strategy {
            Strategy::RsiMacd => {
                let rsi = rsi(closes, RSI_PERIOD);
                let m = macd(closes, MACD_FAST, MACD_SLOW, MACD_SIGNAL);
                (0..n)
                    .map(|i| {
                        (
                            rsi[i] < RSI_OVERSOLD && m.macd[i] > m.signal[i],
                            rsi[i] > RSI_OVERBOUGHT && m.macd[i] < m.signal[i],
                        )
                    })
                    .unzip()
            }
            Strategy::Bollinger => {
                let bands = bollinger(closes, BOLLINGER_PERIOD, BOLLINGER_K);
                (0..n)
                    .map(|i| (closes[i] < bands.lower[i], closes[i] > bands.upper[i]))
                    .unzip()
            }
            Strategy::GoldenCross => {
                let fast = sma(closes, GOLDEN_CROSS_FAST);
                let slow = sma(closes, GOLDEN_CROSS_SLOW);
                (0..n)
                    .map(|i| {
                        if i == 0 {
                            return (false, false);
                        }
                        (
                            fast[i] > slow[i] && fast[i - 1] <= slow[i - 1],
                            fast[i] < slow[i] && fast[i - 1] >= slow[i - 1],
                        )
                    })
                    .unzip()
            }
        };
        Self { buy, sell }
    }
}

/// Largest peak-to-trough decline, as a positive percent of the running peak.
pub fn max_drawdown_pct(values: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;
    for &v in values {
        peak = peak.max(v);
        if peak > 0.0 {
            max_dd = max_dd.max((peak - v) / peak);
        }
    }
    max_dd * 100.0
}

/// Replay `strategy` over `series` starting from `initial_capital`.
pub fn backtest(
    series: &PriceSeries,
    initial_capital: f64,
    strategy: Strategy,
) -> Result<BacktestResult, AnalysisError> {
    if !(initial_capital.is_finite() && initial_capital > 0.0) {
        return Err(AnalysisError::InvalidCapital(initial_capital));
    }
    let bars = series.bars();
    if bars.len() < BACKTEST_MIN_BARS {
        return Err(AnalysisError::InsufficientData {
            needed: BACKTEST_MIN_BARS,
            got: bars.len(),
        });
    }

    let closes = series.closes();
    let signals = Signals::compute(strategy, &closes);
    let mut capital = initial_capital;
    let mut position = Position::Flat;
    let mut trades = Vec::new();

    for (i, bar) in bars.iter().enumerate().skip(1) {
        let price = bar.close;
        match position {
            Position::Flat if signals.buy[i] => {
                position = Position::Long { entry: price };
                trades.push(TradeEntry {
                    side: TradeSide::Buy,
                    timestamp: bar.timestamp,
                    price,
                    realized_gain: None,
                });
            }
            Position::Long { entry } if signals.sell[i] => {
                let gain = (price - entry) / entry;
                capital *= 1.0 + gain;
                position = Position::Flat;
                trades.push(TradeEntry {
                    side: TradeSide::Sell,
                    timestamp: bar.timestamp,
                    price,
                    realized_gain: Some(gain),
                });
            }
            _ => {}
        }
    }

    if let (Position::Long { entry }, Some(last)) = (position, bars.last()) {
        let gain = (last.close - entry) / entry;
        capital *= 1.0 + gain;
        trades.push(TradeEntry {
            side: TradeSide::Sell,
            timestamp: last.timestamp,
            price: last.close,
            realized_gain: Some(gain),
        });
    }

    let gains = trades.iter().filter_map(|t| t.realized_gain);
    let wins = gains.clone().filter(|g| *g > 0.0).count();
    let losses = gains.filter(|g| *g < 0.0).count();
    let first = closes[0];
    let last = closes[closes.len() - 1];

    debug!(%strategy, trades = trades.len(), capital, "backtest finished");

    Ok(BacktestResult {
        strategy,
        initial_capital,
        final_capital: capital,
        total_return_pct: (capital - initial_capital) / initial_capital * 100.0,
        buy_and_hold_pct: (last - first) / first * 100.0,
        max_drawdown_pct: max_drawdown_pct(&closes),
        trades,
        wins,
        losses,
    })
}
