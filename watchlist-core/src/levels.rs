//! Support/resistance level detection.
//!
//! Local minima of `low` become support candidates and local maxima of `high`
//! become resistance candidates. Candidates are deduplicated and merged into
//! clusters whose members lie within a relative distance of the cluster's
//! first (lowest) value; each cluster is reported as its mean.

use serde::{Deserialize, Serialize};

use crate::domain::PriceSeries;

/// Detection parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    /// Width of the centered extremum window, in bars.
    pub window: usize,
    /// Maximum relative distance from a cluster's first value (0.01 = 1%).
    pub threshold: f64,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            window: 20,
            threshold: 0.01,
        }
    }
}

/// Clustered support and resistance prices, each list ascending.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceLevels {
    pub support: Vec<f64>,
    pub resistance: Vec<f64>,
}

impl PriceLevels {
    pub fn is_empty(&self) -> bool {
        self.support.is_empty() && self.resistance.is_empty()
    }

    /// Highest support strictly below `price`.
    pub fn nearest_support_below(&self, price: f64) -> Option<f64> {
        self.support.iter().rev().copied().find(|&s| s < price)
    }

    /// Lowest resistance strictly above `price`.
    pub fn nearest_resistance_above(&self, price: f64) -> Option<f64> {
        self.resistance.iter().copied().find(|&r| r > price)
    }
}

/// Find and cluster support/resistance levels. Empty input gives empty output.
pub fn detect_levels(series: &PriceSeries, config: &LevelConfig) -> PriceLevels {
    if series.is_empty() || config.window == 0 {
        return PriceLevels::default();
    }

    let support = local_extrema(&series.lows(), config.window, Extremum::Min);
    let resistance = local_extrema(&series.highs(), config.window, Extremum::Max);

    PriceLevels {
        support: cluster_levels(&support, config.threshold),
        resistance: cluster_levels(&resistance, config.threshold),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Extremum {
    Min,
    Max,
}

/// Values equal to the extremum of the centered window around them.
///
/// The window for bar `i` spans `[i + w/2 - (w - 1), i + w/2]`, which for odd
/// `w` is symmetric and for even `w` leans one bar back. Bars whose window
/// would leave the series have no defined extremum and are skipped.
fn local_extrema(values: &[f64], window: usize, kind: Extremum) -> Vec<f64> {
    let n = values.len();
    let half = window / 2;
    let mut found = Vec::new();

    for (i, &value) in values.iter().enumerate() {
        if value.is_nan() {
            continue;
        }
        let end = i + half;
        if end >= n || end + 1 < window {
            continue;
        }
        let start = end + 1 - window;
        let slice = &values[start..=end];
        if slice.iter().any(|v| v.is_nan()) {
            continue;
        }

        let extreme = match kind {
            Extremum::Min => slice.iter().copied().fold(f64::INFINITY, f64::min),
            Extremum::Max => slice.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        };
        if value == extreme {
            found.push(value);
        }
    }

    found
}

/// Merge nearby levels.
///
/// Values are deduplicated and sorted ascending. A cluster starts at its first
/// value and absorbs each following value within `threshold` (relative to that
/// first value); the next value beyond it closes the cluster and starts a new
/// one. Each cluster is replaced by its mean.
///
/// Cluster means can land within `threshold` of each other, so the pass repeats
/// until nothing merges. The output is a fixed point: re-clustering it is a no-op.
pub fn cluster_levels(levels: &[f64], threshold: f64) -> Vec<f64> {
    let mut clustered = cluster_pass(levels, threshold);
    loop {
        let next = cluster_pass(&clustered, threshold);
        if next.len() == clustered.len() {
            return clustered;
        }
        clustered = next;
    }
}

fn cluster_pass(levels: &[f64], threshold: f64) -> Vec<f64> {
    let mut sorted: Vec<f64> = levels.iter().copied().filter(|v| !v.is_nan()).collect();
    sorted.sort_by(f64::total_cmp);
    sorted.dedup();

    let mut clusters = Vec::new();
    let mut current: Vec<f64> = Vec::new();

    for value in sorted {
        match current.first() {
            Some(&first) if ((value - first) / first).abs() <= threshold => current.push(value),
            Some(_) => {
                clusters.push(mean(&current));
                current = vec![value];
            }
            None => current.push(value),
        }
    }
    if !current.is_empty() {
        clusters.push(mean(&current));
    }

    clusters
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}
