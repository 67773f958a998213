//! Relative Strength Index (RSI).
//!
//! Simple (not Wilder) rolling means of gains and losses over `period` deltas.
//! The first delta is taken as 0, so `period` closes already yield a value.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss).
//!
//! Edge cases: avg_loss == 0 with gains → the loss is replaced by
//! [`RSI_LOSS_EPSILON`], so the output saturates toward (not to) 100;
//! no gains and no losses, or a window that has not filled → [`RSI_NEUTRAL`].

pub const RSI_NEUTRAL: f64 = 50.0;
pub const RSI_LOSS_EPSILON: f64 = 0.001;

/// RSI from average gain and average loss of one window.
pub fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    let rs = if avg_loss > 0.0 {
        avg_gain / avg_loss
    } else if avg_gain > 0.0 {
        avg_gain / RSI_LOSS_EPSILON
    } else {
        return RSI_NEUTRAL;
    };
    let value = 100.0 - 100.0 / (1.0 + rs);
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        RSI_NEUTRAL
    }
}

/// Per-bar RSI, always within [0, 100].
pub fn rsi(closes: &[f64], period: usize) -> Vec<f64> {
    let n = closes.len();
    let mut result = vec![RSI_NEUTRAL; n];
    if period == 0 || n < period {
        return result;
    }

    // NaN deltas compare false on both sides and count as no move
    let mut gains = vec![0.0; n];
    let mut losses = vec![0.0; n];
    for i in 1..n {
        let delta = closes[i] - closes[i - 1];
        if delta > 0.0 {
            gains[i] = delta;
        } else if delta < 0.0 {
            losses[i] = -delta;
        }
    }

    for i in (period - 1)..n {
        let start = i + 1 - period;
        let avg_gain = gains[start..=i].iter().sum::<f64>() / period as f64;
        let avg_loss = losses[start..=i].iter().sum::<f64>() / period as f64;
        result[i] = rsi_from_averages(avg_gain, avg_loss);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    const RISING_14: [f64; 14] = [
        100.0, 102.0, 104.0, 103.0, 105.0, 107.0, 106.0, 108.0, 110.0, 109.0, 111.0, 113.0, 112.0,
        114.0,
    ];

    #[test]
    fn fourteen_closes_yield_a_value() {
        let result = rsi(&RISING_14, 14);
        // gains 9×2, losses 4×1 → RS 4.5
        assert_approx(result[13], 100.0 - 100.0 / 5.5, DEFAULT_EPSILON);
        assert!(result[13] > 50.0);
        assert_approx(result[12], RSI_NEUTRAL, DEFAULT_EPSILON);
    }

    #[test]
    fn all_gains_saturate_below_100() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let last = *rsi(&closes, 14).last().unwrap();
        assert!(last > 99.0 && last < 100.0, "got {last}");
    }

    #[test]
    fn all_losses_is_zero() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 - i as f64).collect();
        assert_approx(*rsi(&closes, 14).last().unwrap(), 0.0, DEFAULT_EPSILON);
    }

    #[test]
    fn flat_series_is_neutral() {
        assert!(rsi(&[5.0; 30], 14).iter().all(|&v| v == RSI_NEUTRAL));
    }

    #[test]
    fn short_series_is_neutral() {
        assert_eq!(rsi(&[1.0, 2.0, 3.0], 14), vec![RSI_NEUTRAL; 3]);
    }

    #[test]
    fn no_lookahead() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + ((i * 7) % 11) as f64).collect();
        let full = rsi(&closes, 14);
        let truncated = rsi(&closes[..30], 14);
        for i in 0..30 {
            assert_approx(full[i], truncated[i], DEFAULT_EPSILON);
        }
    }
}
