//! Weighted-factor scoring shared by the decision engine and sentiment.
//!
//! A score is `base + Σ value·weight`, optionally clamped, then mapped to a
//! label through a [`ThresholdTable`].

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Factor {
    pub value: f64,
    pub weight: f64,
}

impl Factor {
    pub fn new(value: f64, weight: f64) -> Self {
        Self { value, weight }
    }
}

/// Score → label mapping.
///
/// `above` is checked first, in order, with strict `score > threshold`; then
/// `below` with strict `score < threshold`; otherwise `otherwise`. List the
/// most extreme thresholds first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdTable<L> {
    pub above: Vec<(f64, L)>,
    pub below: Vec<(f64, L)>,
    pub otherwise: L,
}

impl<L: Copy> ThresholdTable<L> {
    pub fn classify(&self, score: f64) -> L {
        if let Some((_, label)) = self.above.iter().find(|(t, _)| score > *t) {
            return *label;
        }
        if let Some((_, label)) = self.below.iter().find(|(t, _)| score < *t) {
            return *label;
        }
        self.otherwise
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedScorer<L> {
    pub base: f64,
    pub bounds: Option<(f64, f64)>,
    pub table: ThresholdTable<L>,
}

impl<L: Copy> WeightedScorer<L> {
    pub fn new(table: ThresholdTable<L>) -> Self {
        Self {
            base: 0.0,
            bounds: None,
            table,
        }
    }

    pub fn with_base(mut self, base: f64) -> Self {
        self.base = base;
        self
    }

    pub fn with_bounds(mut self, lo: f64, hi: f64) -> Self {
        self.bounds = Some((lo, hi));
        self
    }

    /// Weighted sum, accumulated in factor order.
    pub fn score(&self, factors: &[Factor]) -> f64 {
        let raw = factors
            .iter()
            .fold(self.base, |acc, f| acc + f.value * f.weight);
        match self.bounds {
            Some((lo, hi)) => raw.clamp(lo, hi),
            None => raw,
        }
    }

    pub fn evaluate(&self, factors: &[Factor]) -> (f64, L) {
        let score = self.score(factors);
        (score, self.table.classify(score))
    }
}
