//! One-step price forecast blended from three methods.
//!
//! 1. Linear regression of close on bar index, extrapolated one step
//!    (needs [`LINEAR_MIN_BARS`] bars, else the current price).
//! 2. EMA with α = 2/(14+1) seeded at the first close (needs
//!    [`EMA_PERIOD`] bars, else the mean of the last five closes).
//! 3. Trend continuation: current · (1 + mean return over the last five closes).
//!
//! The blend is clamped to ±[`MAX_CHANGE`] of the current price. Any method
//! producing a non-finite value silently falls back to the current price.

use serde::{Deserialize, Serialize};

use crate::stats::{linear_fit, mean, pct_returns, population_std};

pub const MIN_BARS: usize = 5;
pub const LINEAR_MIN_BARS: usize = 10;
pub const EMA_PERIOD: usize = 14;
pub const TREND_WINDOW: usize = 5;
/// Nudge applied by trend continuation when the return window is unavailable.
pub const TREND_FALLBACK_NUDGE: f64 = 0.001;
pub const LINEAR_WEIGHT: f64 = 0.4;
pub const EMA_WEIGHT: f64 = 0.35;
pub const TREND_WEIGHT: f64 = 0.25;
pub const MAX_CHANGE: f64 = 0.15;
pub const CI_WINDOW: usize = 10;
pub const CI_Z: f64 = 1.96;
pub const CI_FALLBACK_BAND: f64 = 0.10;
/// Band used by the passthrough forecast for very short series.
pub const PASSTHROUGH_BAND: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MethodEstimates {
    pub linear: f64,
    pub ema: f64,
    pub trend: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub current_price: f64,
    pub forecast: f64,
    pub confidence_interval: (f64, f64),
    /// Forecast change in percent of the current price.
    pub pct_change: f64,
    /// `None` for the passthrough forecast on very short series.
    pub methods: Option<MethodEstimates>,
}

fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

fn linear_estimate(prices: &[f64], current: f64) -> f64 {
    if prices.len() < LINEAR_MIN_BARS {
        return current;
    }
    linear_fit(prices)
        .map(|(slope, intercept)| intercept + slope * prices.len() as f64)
        .map_or(current, |v| finite_or(v, current))
}

fn ema_estimate(prices: &[f64], current: f64) -> f64 {
    let value = if prices.len() >= EMA_PERIOD {
        let alpha = 2.0 / (EMA_PERIOD as f64 + 1.0);
        prices[1..]
            .iter()
            .fold(prices[0], |ema, p| alpha * p + (1.0 - alpha) * ema)
    } else {
        mean(&prices[prices.len().saturating_sub(TREND_WINDOW)..])
    };
    finite_or(value, current)
}

fn trend_estimate(prices: &[f64], current: f64) -> f64 {
    let value = if prices.len() >= TREND_WINDOW {
        let returns = pct_returns(&prices[prices.len() - TREND_WINDOW..]);
        current * (1.0 + mean(&returns))
    } else {
        current * (1.0 + TREND_FALLBACK_NUDGE)
    };
    finite_or(value, current)
}

/// Forecast the next close.
pub fn predict(prices: &[f64]) -> Prediction {
    if prices.len() < MIN_BARS {
        let current = prices.last().copied().unwrap_or(0.0);
        return Prediction {
            current_price: current,
            forecast: current,
            confidence_interval: (
                current * (1.0 - PASSTHROUGH_BAND),
                current * (1.0 + PASSTHROUGH_BAND),
            ),
            pct_change: 0.0,
            methods: None,
        };
    }

    let current = prices[prices.len() - 1];
    let methods = MethodEstimates {
        linear: linear_estimate(prices, current),
        ema: ema_estimate(prices, current),
        trend: trend_estimate(prices, current),
    };

    let blended = methods.linear * LINEAR_WEIGHT
        + methods.ema * EMA_WEIGHT
        + methods.trend * TREND_WEIGHT;
    let lo = current * (1.0 - MAX_CHANGE);
    let hi = current * (1.0 + MAX_CHANGE);
    let forecast = finite_or(blended, current).max(lo.min(hi)).min(hi.max(lo));

    let confidence_interval = if prices.len() >= CI_WINDOW {
        let spread = CI_Z * population_std(&prices[prices.len() - CI_WINDOW..]);
        (forecast - spread, forecast + spread)
    } else {
        (
            forecast * (1.0 - CI_FALLBACK_BAND),
            forecast * (1.0 + CI_FALLBACK_BAND),
        )
    };

    let pct_change = if current > 0.0 {
        (forecast - current) / current * 100.0
    } else {
        0.0
    };

    Prediction {
        current_price: current,
        forecast,
        confidence_interval,
        pct_change,
        methods: Some(methods),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn empty_is_zero_passthrough() {
        let p = predict(&[]);
        assert_eq!(p.current_price, 0.0);
        assert_eq!(p.forecast, 0.0);
        assert_eq!(p.confidence_interval, (0.0, 0.0));
        assert_eq!(p.pct_change, 0.0);
        assert!(p.methods.is_none());
    }

    #[test]
    fn short_series_passthrough_band() {
        let p = predict(&[100.0, 101.0]);
        assert_approx(p.forecast, 101.0, DEFAULT_EPSILON);
        assert_approx(p.confidence_interval.0, 95.95, 1e-9);
        assert_approx(p.confidence_interval.1, 106.05, 1e-9);
    }

    #[test]
    fn linear_series_extrapolates() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let p = predict(&closes);
        let m = p.methods.unwrap();
        assert_approx(m.linear, 120.0, 1e-9);
        assert!(p.forecast > 110.0 && p.forecast < 121.0);
        assert!(p.pct_change > 0.0);
    }

    #[test]
    fn five_to_nine_bars_use_fallbacks() {
        let closes = [10.0, 11.0, 12.0, 13.0, 14.0];
        let p = predict(&closes);
        let m = p.methods.unwrap();
        assert_approx(m.linear, 14.0, DEFAULT_EPSILON);
        assert_approx(m.ema, 12.0, DEFAULT_EPSILON);
        // ±10% band around the forecast
        assert_approx(p.confidence_interval.1 / p.forecast, 1.1, 1e-12);
    }

    #[test]
    fn forecast_is_clamped() {
        let mut closes = vec![1000.0; 20];
        closes.push(10.0);
        let p = predict(&closes);
        assert!(p.forecast <= 10.0 * (1.0 + MAX_CHANGE) + 1e-9);
        assert_approx(p.pct_change, 15.0, 1e-9);
    }

    #[test]
    fn ci_uses_population_std_of_last_ten() {
        let closes = [
            1.0, 1.0, 2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0, 2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0,
            9.0,
        ];
        let p = predict(&closes);
        let last_ten = &closes[closes.len() - 10..];
        let spread = CI_Z * population_std(last_ten);
        assert_approx(p.confidence_interval.1 - p.forecast, spread, 1e-9);
    }
}
