//! Transport rules: rearrange surviving matter after elimination.

use crate::cluster::{label_components, Grouping};
use crate::lattice::{Lattice, EMPTY};
use crate::topology::Topology;

/// Transport variant, fixed per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    /// Per-column stable compaction toward the anchor face.
    ColumnCompaction,
    /// Clusters with no cell on the anchor face translate down one
    /// layer per cascade iteration.
    FloatingCluster,
    /// Static lattice (percolation).
    None,
}

/// Compact every column toward layer 0, preserving the order of the
/// nonzero values — a stable sort pushing empties to the far end.
///
/// Returns whether any cell moved.
pub fn compact_columns(lattice: &mut Lattice) -> bool {
    let ncols = lattice.num_columns();
    let height = lattice.height();
    let cells = lattice.cells_mut();
    let mut moved = false;
    for col in 0..ncols {
        let mut write = 0;
        for layer in 0..height {
            let idx = col + layer * ncols;
            if cells[idx] != EMPTY {
                if write != layer {
                    cells[col + write * ncols] = cells[idx];
                    cells[idx] = EMPTY;
                    moved = true;
                }
                write += 1;
            }
        }
    }
    moved
}

/// Translate every floating cluster one layer toward the anchor face.
///
/// A cluster floats when its connectivity-only component (species
/// ignored) has no cell in layer 0. All floating cells move in one
/// synchronized clear-then-scatter step so the outcome cannot depend on
/// cell visit order. Returns whether anything moved; the driver repeats
/// detect→translate→eliminate until nothing floats.
pub fn lower_floating(lattice: &mut Lattice, topology: &Topology) -> bool {
    let labeling = label_components(lattice, topology, Grouping::Occupancy);
    if labeling.count == 0 {
        return false;
    }
    let ncols = lattice.num_columns();
    let mut anchored = vec![false; labeling.count as usize];
    for col in 0..ncols {
        let id = labeling.labels[col];
        if id != 0 {
            anchored[(id - 1) as usize] = true;
        }
    }
    if anchored.iter().all(|&a| a) {
        return false;
    }
    // a floating cluster has no layer-0 cell, so idx >= ncols below, and
    // the landing cell is either empty or part of the same falling mass
    let moves: Vec<(usize, _)> = labeling
        .labels
        .iter()
        .enumerate()
        .filter(|&(_, &id)| id != 0 && !anchored[(id - 1) as usize])
        .map(|(idx, _)| (idx, lattice.cells()[idx]))
        .collect();
    let cells = lattice.cells_mut();
    for &(idx, _) in &moves {
        cells[idx] = EMPTY;
    }
    for &(idx, value) in &moves {
        cells[idx - ncols] = value;
    }
    true
}
