//! Exponential moving average with span-based smoothing.
//!
//! alpha = 2 / (span + 1). Weights are bias-adjusted the way pandas'
//! `ewm(span, adjust=True)` does, so the average is defined from the first
//! bar: EMA[t] = Σ (1-α)^i · x[t-i] / Σ (1-α)^i. Lookback: 0.

/// Bias-adjusted exponential mean. NaN inputs are skipped (their weight slot
/// still decays); output is NaN only before the first finite value.
pub fn ewm_mean(values: &[f64], span: usize) -> Vec<f64> {
    let alpha = 2.0 / (span.max(1) as f64 + 1.0);
    let decay = 1.0 - alpha;
    let mut num = 0.0;
    let mut den = 0.0;

    values
        .iter()
        .map(|&x| {
            num *= decay;
            den *= decay;
            if x.is_finite() {
                num += x;
                den += 1.0;
            }
            if den > 0.0 {
                num / den
            } else {
                f64::NAN
            }
        })
        .collect()
}
