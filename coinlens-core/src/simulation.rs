//! Monte Carlo market simulation and summaries of simulated series.
//!
//! Prices follow geometric Brownian motion; the bar series is the mean of
//! [`SimulationParams::paths`] independent paths, so it is much smoother than
//! any single path. Intraday range and volume are drawn separately.

use chrono::{Duration, NaiveDateTime};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analysis::AnalysisError;
use crate::data::synthetic::standard_normal;
use crate::domain::{Bar, PriceSeries};
use crate::stats::{pct_returns, sample_std};

// ─── Configuration ───────────────────────────────────────────────────

pub const DEFAULT_INITIAL_PRICE: f64 = 50_000.0;
pub const DEFAULT_DAYS: usize = 90;
pub const DEFAULT_VOLATILITY: f64 = 0.03;
pub const DEFAULT_DRIFT: f64 = 0.001;
pub const DEFAULT_PATHS: usize = 1000;
/// Intraday noise as a fraction of daily volatility.
pub const INTRADAY_VOL_RATIO: f64 = 0.5;
pub const VOLUME_LOG_MEAN: f64 = 20.0;
pub const VOLUME_LOG_STD: f64 = 1.0;
/// Volume multiplier per unit of absolute return.
pub const VOLUME_RETURN_SENSITIVITY: f64 = 10.0;
pub const SUMMARY_MIN_BARS: usize = 5;
pub const DAYS_PER_YEAR: f64 = 365.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    pub initial_price: f64,
    pub days: usize,
    /// Daily volatility σ.
    pub volatility: f64,
    /// Daily drift μ.
    pub drift: f64,
    pub paths: usize,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            initial_price: DEFAULT_INITIAL_PRICE,
            days: DEFAULT_DAYS,
            volatility: DEFAULT_VOLATILITY,
            drift: DEFAULT_DRIFT,
            paths: DEFAULT_PATHS,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimulationError {
    #[error("initial price must be positive and finite, got {0}")]
    InvalidPrice(f64),

    #[error("volatility must be non-negative and finite, got {0}")]
    InvalidVolatility(f64),

    #[error("simulation needs at least one day and one path")]
    Empty,
}

impl SimulationParams {
    pub fn validate(&self) -> Result<(), SimulationError> {
        if !(self.initial_price.is_finite() && self.initial_price > 0.0) {
            return Err(SimulationError::InvalidPrice(self.initial_price));
        }
        if !(self.volatility.is_finite() && self.volatility >= 0.0) {
            return Err(SimulationError::InvalidVolatility(self.volatility));
        }
        if self.days == 0 || self.paths == 0 {
            return Err(SimulationError::Empty);
        }
        Ok(())
    }
}

// ─── Simulation ──────────────────────────────────────────────────────

/// Mean GBM path: `S_t = S_{t−1} · exp((μ − σ²/2) + σ·z)`, `S_0` = initial price.
fn mean_path(params: &SimulationParams, rng: &mut StdRng) -> Vec<f64> {
    let drift = params.drift - 0.5 * params.volatility.powi(2);
    let mut sums = vec![0.0; params.days];
    for _ in 0..params.paths {
        let mut price = params.initial_price;
        sums[0] += price;
        for sum in sums.iter_mut().skip(1) {
            price *= (drift + params.volatility * standard_normal(rng)).exp();
            *sum += price;
        }
    }
    let n = params.paths as f64;
    sums.into_iter().map(|s| s / n).collect()
}

/// Simulate `params.days` daily bars ending at `end`, reproducible for a seed.
pub fn simulate_market(
    params: &SimulationParams,
    seed: u64,
    end: NaiveDateTime,
) -> Result<PriceSeries, SimulationError> {
    params.validate()?;
    let mut rng = StdRng::seed_from_u64(seed);
    let closes = mean_path(params, &mut rng);
    let intraday = params.volatility * INTRADAY_VOL_RATIO;
    let first = end - Duration::days(params.days as i64 - 1);

    let bars = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            let ret = close / open - 1.0;
            let high = open.max(close) * (1.0 + (intraday * standard_normal(&mut rng)).abs());
            let low = open.min(close) * (1.0 - (intraday * standard_normal(&mut rng)).abs());
            let base_volume = (VOLUME_LOG_MEAN + VOLUME_LOG_STD * standard_normal(&mut rng)).exp();
            Bar {
                timestamp: first + Duration::days(i as i64),
                open,
                high,
                low,
                close,
                volume: base_volume * (1.0 + ret.abs() * VOLUME_RETURN_SENSITIVITY),
            }
        })
        .collect();

    Ok(PriceSeries::from_unsorted(bars))
}

// ─── Summary ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub initial_price: f64,
    pub current_price: f64,
    pub total_change_pct: f64,
    /// Sample std of daily returns, annualised over 365 days, in percent.
    pub annualized_volatility_pct: f64,
    pub max: f64,
    pub min: f64,
}

pub fn summarize_series(series: &PriceSeries) -> Result<SimulationSummary, AnalysisError> {
    let closes = series.closes();
    if closes.len() < SUMMARY_MIN_BARS {
        return Err(AnalysisError::InsufficientData {
            needed: SUMMARY_MIN_BARS,
            got: closes.len(),
        });
    }
    let initial = closes[0];
    let current = closes[closes.len() - 1];
    Ok(SimulationSummary {
        initial_price: initial,
        current_price: current,
        total_change_pct: (current - initial) / initial * 100.0,
        annualized_volatility_pct: sample_std(&pct_returns(&closes)) * DAYS_PER_YEAR.sqrt() * 100.0,
        max: closes.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        min: closes.iter().copied().fold(f64::INFINITY, f64::min),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::{assert_approx, series_from_closes, DEFAULT_EPSILON};
    use chrono::NaiveDate;

    fn end() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 31)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn default_params() {
        let p = SimulationParams::default();
        assert_eq!(p.days, 90);
        assert_eq!(p.paths, 1000);
        assert_approx(p.initial_price, 50_000.0, DEFAULT_EPSILON);
    }

    #[test]
    fn simulation_is_reproducible_and_sane() {
        let params = SimulationParams::default();
        let a = simulate_market(&params, 7, end()).unwrap();
        let b = simulate_market(&params, 7, end()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 90);
        assert_eq!(a.last_timestamp(), Some(end()));
        assert_approx(a.bars()[0].close, 50_000.0, DEFAULT_EPSILON);
        for bar in a.bars() {
            assert!(bar.envelope_holds(), "insane bar {bar:?}");
        }
        let c = simulate_market(&params, 8, end()).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn zero_volatility_is_pure_drift() {
        let params = SimulationParams {
            initial_price: 100.0,
            days: 3,
            volatility: 0.0,
            drift: 0.01,
            paths: 4,
        };
        let s = simulate_market(&params, 1, end()).unwrap();
        let closes = s.closes();
        assert_approx(closes[1], 100.0 * 0.01_f64.exp(), 1e-9);
        assert_approx(closes[2], 100.0 * 0.02_f64.exp(), 1e-9);
    }

    #[test]
    fn rejects_bad_params() {
        let p = SimulationParams {
            initial_price: 0.0,
            ..SimulationParams::default()
        };
        assert_eq!(simulate_market(&p, 1, end()), Err(SimulationError::InvalidPrice(0.0)));
        let p = SimulationParams {
            days: 0,
            ..SimulationParams::default()
        };
        assert_eq!(simulate_market(&p, 1, end()), Err(SimulationError::Empty));
    }

    #[test]
    fn summary_of_known_series() {
        let s = series_from_closes(&[100.0, 110.0, 99.0, 108.9, 120.0]);
        let summary = summarize_series(&s).unwrap();
        assert_approx(summary.total_change_pct, 20.0, 1e-9);
        assert_approx(summary.max, 120.0, DEFAULT_EPSILON);
        assert_approx(summary.min, 99.0, DEFAULT_EPSILON);
        assert!(summary.annualized_volatility_pct > 0.0);
    }

    #[test]
    fn summary_needs_five_bars() {
        let s = series_from_closes(&[100.0; 4]);
        assert_eq!(
            summarize_series(&s),
            Err(AnalysisError::InsufficientData { needed: 5, got: 4 })
        );
    }
}
