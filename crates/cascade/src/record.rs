//! Per-macro-step statistics consumed by the external serializer.

use crate::lattice::{Lattice, EMPTY};

/// Which optional observables a run records. Gravity mass-vs-time runs
/// keep heights only; percolation runs keep avalanche counters only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordFields {
    /// Interface heights, slope sequence, roughness.
    pub heights: bool,
    /// Avalanche size, cluster count, cumulative eliminated.
    pub avalanches: bool,
}

impl Default for RecordFields {
    fn default() -> Self {
        Self {
            heights: true,
            avalanches: true,
        }
    }
}

/// One macro-step's output. Immutable once recorded; the engine never
/// emits a partial record.
#[derive(Debug, Clone, PartialEq)]
pub struct CascadeRecord {
    /// Macro-step index, from 0.
    pub step: usize,
    /// Nonzero cell count after settling.
    pub mass: usize,
    /// Tallest column's interface height.
    pub max_height: usize,
    /// Cells removed during this macro-step's cascade.
    pub avalanche_size: Option<usize>,
    /// Clusters removed during this macro-step's cascade.
    pub clusters_removed: Option<usize>,
    /// Cells removed since the start of the run.
    pub cumulative_eliminated: Option<usize>,
    /// Interface height per column of the (D−1)-dimensional slice.
    pub heights: Option<Vec<usize>>,
    /// First differences of the heights (wrapping when the first lateral
    /// axis is periodic). A physical interface profile only for 2-D runs;
    /// see [`slope_profile`].
    pub slopes: Option<Vec<i64>>,
    /// Standard deviation of the heights.
    pub roughness: Option<f64>,
}

/// Interface height of every column: the number of layers up to and
/// including the topmost occupied cell, 0 for an empty column.
#[must_use]
pub fn column_heights(lattice: &Lattice) -> Vec<usize> {
    let ncols = lattice.num_columns();
    let cells = lattice.cells();
    (0..ncols)
        .map(|col| {
            (0..lattice.height())
                .rev()
                .find(|&layer| cells[col + layer * ncols] != EMPTY)
                .map_or(0, |layer| layer + 1)
        })
        .collect()
}

/// First differences of the height profile. With `periodic` the sequence
/// wraps and has as many entries as columns (and sums to zero);
/// otherwise it has one fewer.
///
/// Columns are visited in flattened order (axis 1 slowest), so the
/// profile is a physical interface slope only when there is a single
/// lateral axis; above two dimensions consecutive entries straddle axis
/// seams and only the wrap choice of axis 1 is honored.
#[must_use]
pub fn slope_profile(heights: &[usize], periodic: bool) -> Vec<i64> {
    let n = heights.len();
    if n < 2 {
        return Vec::new();
    }
    let pairs = if periodic { n } else { n - 1 };
    (0..pairs)
        .map(|c| heights[(c + 1) % n] as i64 - heights[c] as i64)
        .collect()
}

/// Standard deviation of the height profile.
#[must_use]
pub fn roughness(heights: &[usize]) -> f64 {
    if heights.is_empty() {
        return 0.0;
    }
    let n = heights.len() as f64;
    let mean = heights.iter().sum::<usize>() as f64 / n;
    let var = heights
        .iter()
        .map(|&h| {
            let d = h as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    var.sqrt()
}
