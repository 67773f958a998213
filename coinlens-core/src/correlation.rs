//! Cross-asset return correlation and hierarchical grouping.
//!
//! Closes are inner-joined on timestamp, turned into percent returns, and
//! correlated pairwise (Pearson). Assets are then grouped by average-linkage
//! clustering on the distance `1 − |r|`, cut into at most [`CLUSTER_COUNT`]
//! groups.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::analysis::AnalysisError;
use crate::domain::PriceSeries;
use crate::stats::{mean, pct_returns};

/// Assets need strictly more than this many bars to take part.
pub const CORRELATION_MIN_BARS: usize = 10;
pub const MIN_ASSETS: usize = 2;
/// Minimum rows surviving the timestamp inner join.
pub const MIN_ALIGNED_ROWS: usize = 5;
pub const LOW_CORRELATION: f64 = 0.3;
pub const MODERATE_HIGH_CORRELATION: f64 = 0.7;
pub const HIGH_CORRELATION: f64 = 0.9;
pub const CLUSTER_COUNT: usize = 3;

/// Symmetric correlation matrix; `None` where a return series has zero variance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub labels: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        self.values.get(i).and_then(|row| row.get(j)).copied().flatten()
    }

    /// Off-diagonal values above the diagonal, row-major.
    fn upper_triangle(&self) -> impl Iterator<Item = (usize, usize, Option<f64>)> + '_ {
        let n = self.len();
        (0..n).flat_map(move |i| ((i + 1)..n).map(move |j| (i, j, self.get(i, j))))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairRelation {
    /// Below [`LOW_CORRELATION`].
    Diversifying,
    /// Above [`HIGH_CORRELATION`].
    Synchronized,
    /// Between [`MODERATE_HIGH_CORRELATION`] and [`HIGH_CORRELATION`].
    ModerateHigh,
}

impl PairRelation {
    pub fn classify(r: f64) -> Option<Self> {
        if r < LOW_CORRELATION {
            Some(PairRelation::Diversifying)
        } else if r > HIGH_CORRELATION {
            Some(PairRelation::Synchronized)
        } else if r > MODERATE_HIGH_CORRELATION {
            Some(PairRelation::ModerateHigh)
        } else {
            None
        }
    }

    pub fn advice(self) -> &'static str {
        match self {
            PairRelation::Diversifying => {
                "Good diversification: hold both to reduce systematic risk"
            }
            PairRelation::Synchronized => {
                "Synchronized: avoid over-exposure, no diversification benefit"
            }
            PairRelation::ModerateHigh => "Moderate-high correlation: limit combined exposure",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairRecommendation {
    pub first: String,
    pub second: String,
    pub correlation: f64,
    pub relation: PairRelation,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    /// 1-based, numbered by first appearance in label order.
    pub id: usize,
    pub assets: Vec<String>,
}

/// Mean/max/min over distinct pairs; `None` when no pair is defined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrelationSummary {
    pub mean: Option<f64>,
    pub max: Option<f64>,
    pub min: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationReport {
    pub matrix: CorrelationMatrix,
    /// Sorted by ascending |r|.
    pub recommendations: Vec<PairRecommendation>,
    pub clusters: Vec<Cluster>,
    /// Number of return periods used.
    pub periods: usize,
    pub summary: CorrelationSummary,
}

/// Pearson correlation of two equal-length samples. `None` on zero variance
/// or mismatched/short input.
pub fn pearson(a: &[f64], b: &[f64]) -> Option<f64> {
    if a.len() != b.len() || a.len() < 2 {
        return None;
    }
    let (ma, mb) = (mean(a), mean(b));
    let (mut sab, mut saa, mut sbb) = (0.0, 0.0, 0.0);
    for (x, y) in a.iter().zip(b) {
        let (dx, dy) = (x - ma, y - mb);
        sab += dx * dy;
        saa += dx * dx;
        sbb += dy * dy;
    }
    if saa <= 0.0 || sbb <= 0.0 {
        return None;
    }
    let r = sab / (saa * sbb).sqrt();
    if !r.is_finite() {
        return None;
    }
    // rounding can leave |r| a hair past 1
    if (r.abs() - 1.0).abs() < 1e-12 {
        return Some(r.signum());
    }
    Some(r.clamp(-1.0, 1.0))
}

/// Inner join closes on timestamp, in first-asset order.
fn align(series: &[(&str, &PriceSeries)]) -> Vec<Vec<f64>> {
    let lookups: Vec<HashMap<NaiveDateTime, f64>> = series
        .iter()
        .map(|(_, s)| s.bars().iter().map(|b| (b.timestamp, b.close)).collect())
        .collect();

    let mut columns = vec![Vec::new(); series.len()];
    let Some((_, first)) = series.first() else {
        return columns;
    };
    for bar in first.bars() {
        let row: Option<Vec<f64>> =
            lookups.iter().map(|m| m.get(&bar.timestamp).copied()).collect();
        if let Some(row) = row {
            for (col, v) in columns.iter_mut().zip(row) {
                col.push(v);
            }
        }
    }
    columns
}

/// Correlate the returns of every asset with enough history.
pub fn correlate(assets: &[(&str, &PriceSeries)]) -> Result<CorrelationReport, AnalysisError> {
    let eligible: Vec<(&str, &PriceSeries)> = assets
        .iter()
        .copied()
        .filter(|(_, s)| s.len() > CORRELATION_MIN_BARS)
        .collect();
    if eligible.len() < MIN_ASSETS {
        return Err(AnalysisError::TooFewAssets {
            needed: MIN_ASSETS,
            got: eligible.len(),
        });
    }

    let columns = align(&eligible);
    let rows = columns.first().map_or(0, Vec::len);
    if rows < MIN_ALIGNED_ROWS {
        return Err(AnalysisError::InsufficientData {
            needed: MIN_ALIGNED_ROWS,
            got: rows,
        });
    }

    let returns: Vec<Vec<f64>> = columns.iter().map(|c| pct_returns(c)).collect();
    let n = eligible.len();
    let mut values = vec![vec![None; n]; n];
    for i in 0..n {
        for j in i..n {
            let r = pearson(&returns[i], &returns[j]);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    let matrix = CorrelationMatrix {
        labels: eligible.iter().map(|(name, _)| name.to_string()).collect(),
        values,
    };
    let periods = returns.first().map_or(0, Vec::len);
    debug!(assets = n, rows, periods, "correlation matrix built");

    Ok(CorrelationReport {
        recommendations: recommendations(&matrix),
        clusters: cluster_assets(&matrix),
        summary: summarize(&matrix),
        periods,
        matrix,
    })
}

fn recommendations(matrix: &CorrelationMatrix) -> Vec<PairRecommendation> {
    let mut recs: Vec<PairRecommendation> = matrix
        .upper_triangle()
        .filter_map(|(i, j, r)| {
            let r = r?;
            let relation = PairRelation::classify(r)?;
            Some(PairRecommendation {
                first: matrix.labels[i].clone(),
                second: matrix.labels[j].clone(),
                correlation: r,
                relation,
                message: format!(
                    "{}-{} ({r:.2}): {}",
                    matrix.labels[i],
                    matrix.labels[j],
                    relation.advice()
                ),
            })
        })
        .collect();
    recs.sort_by(|a, b| a.correlation.abs().total_cmp(&b.correlation.abs()));
    recs
}

fn summarize(matrix: &CorrelationMatrix) -> CorrelationSummary {
    let pairs: Vec<f64> = matrix.upper_triangle().filter_map(|(_, _, r)| r).collect();
    if pairs.is_empty() {
        return CorrelationSummary::default();
    }
    CorrelationSummary {
        mean: Some(mean(&pairs)),
        max: pairs.iter().copied().reduce(f64::max),
        min: pairs.iter().copied().reduce(f64::min),
    }
}

struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut cur = x;
        while self.parent[cur] != root {
            let next = self.parent[cur];
            self.parent[cur] = root;
            cur = next;
        }
        root
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            self.parent[rb] = ra;
        }
    }
}

/// Average-linkage merges: (member of one side, member of the other, height).
fn upgma(dist: &[Vec<f64>]) -> Vec<(usize, usize, f64)> {
    let mut groups: Vec<Vec<usize>> = (0..dist.len()).map(|i| vec![i]).collect();
    let mut merges = Vec::with_capacity(dist.len().saturating_sub(1));

    while groups.len() > 1 {
        let mut best = (0, 1, f64::INFINITY);
        for a in 0..groups.len() {
            for b in (a + 1)..groups.len() {
                let total: f64 = groups[a]
                    .iter()
                    .flat_map(|&i| groups[b].iter().map(move |&j| (i, j)))
                    .map(|(i, j)| dist[i][j])
                    .sum();
                let avg = total / (groups[a].len() * groups[b].len()) as f64;
                if avg < best.2 {
                    best = (a, b, avg);
                }
            }
        }
        let (a, b, height) = best;
        merges.push((groups[a][0], groups[b][0], height));
        let absorbed = groups.remove(b);
        groups[a].extend(absorbed);
    }
    merges
}

/// Group assets by correlation distance into at most [`CLUSTER_COUNT`]
/// clusters, using the lowest merge height that achieves it. Any undefined
/// correlation yields no clusters.
pub fn cluster_assets(matrix: &CorrelationMatrix) -> Vec<Cluster> {
    let n = matrix.len();
    if n == 0 {
        return Vec::new();
    }
    let mut dist = vec![vec![0.0; n]; n];
    for (i, row) in dist.iter_mut().enumerate() {
        for (j, d) in row.iter_mut().enumerate() {
            match matrix.get(i, j) {
                Some(r) => *d = 1.0 - r.abs(),
                None => return Vec::new(),
            }
        }
    }

    let merges = upgma(&dist);
    let mut heights: Vec<f64> = merges.iter().map(|m| m.2).collect();
    heights.sort_by(f64::total_cmp);
    let threshold = heights
        .iter()
        .copied()
        .find(|&h| n - merges.iter().filter(|m| m.2 <= h).count() <= CLUSTER_COUNT)
        .unwrap_or(f64::INFINITY);

    let mut uf = UnionFind::new(n);
    for &(a, b, h) in &merges {
        if h <= threshold {
            uf.union(a, b);
        }
    }

    let mut clusters: Vec<Cluster> = Vec::new();
    let mut root_to_id: HashMap<usize, usize> = HashMap::new();
    for (i, label) in matrix.labels.iter().enumerate() {
        let root = uf.find(i);
        let next_id = root_to_id.len() + 1;
        let id = *root_to_id.entry(root).or_insert(next_id);
        match clusters.iter_mut().find(|c| c.id == id) {
            Some(c) => c.assets.push(label.clone()),
            None => clusters.push(Cluster {
                id,
                assets: vec![label.clone()],
            }),
        }
    }
    clusters
}
