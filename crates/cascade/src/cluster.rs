//! Connected-component labeling over the lattice.
//!
//! Breadth-first flood fill with an explicit work queue. Periodic axes
//! wrap inside neighbor generation, so a single pass already produces
//! the fixpoint partition across boundary seams; no merge post-pass is
//! needed and the partition is independent of scan order.

use std::collections::VecDeque;

use crate::lattice::{Lattice, Species, EMPTY};
use crate::topology::Topology;

/// What makes two adjacent nonzero cells belong together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grouping {
    /// Cells must carry the identical species label.
    BySpecies,
    /// Any two adjacent nonzero cells connect, species ignored. Used by
    /// floating-cluster gravity.
    Occupancy,
}

/// Derived view mapping each cell to a component id (0 for empty).
///
/// Recomputed from scratch after every structural change; never kept
/// across steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentLabeling {
    /// Component id per cell, same flat layout as the lattice.
    pub labels: Vec<u32>,
    /// Number of components; ids run `1..=count`.
    pub count: u32,
}

impl ComponentLabeling {
    /// Cell count per component, indexed by `id - 1`.
    #[must_use]
    pub fn sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0usize; self.count as usize];
        for &id in &self.labels {
            if id != 0 {
                sizes[(id - 1) as usize] += 1;
            }
        }
        sizes
    }

    /// Normalize ids to first-appearance order, for comparing partitions
    /// that may number components differently.
    #[must_use]
    pub fn canonical(&self) -> Vec<u32> {
        let mut remap = vec![0u32; self.count as usize + 1];
        let mut next = 0u32;
        let mut out = Vec::with_capacity(self.labels.len());
        for &id in &self.labels {
            if id == 0 {
                out.push(0);
                continue;
            }
            if remap[id as usize] == 0 {
                next += 1;
                remap[id as usize] = next;
            }
            out.push(remap[id as usize]);
        }
        out
    }
}

/// Label the connected components of the lattice under `topology`.
///
/// Two nonzero cells share an id iff a path of adjacent cells with the
/// same grouping key joins them.
#[must_use]
pub fn label_components(
    lattice: &Lattice,
    topology: &Topology,
    grouping: Grouping,
) -> ComponentLabeling {
    let cells = lattice.cells();
    let key = |sp: Species| match grouping {
        Grouping::BySpecies => sp,
        Grouping::Occupancy => 1,
    };
    let mut labels = vec![0u32; cells.len()];
    let mut count = 0u32;
    let mut queue = VecDeque::new();
    let mut nbuf = Vec::with_capacity(8);

    for start in 0..cells.len() {
        if cells[start] == EMPTY || labels[start] != 0 {
            continue;
        }
        count += 1;
        labels[start] = count;
        let group = key(cells[start]);
        queue.push_back(start);
        while let Some(idx) = queue.pop_front() {
            topology.neighbors_into(lattice, idx, &mut nbuf);
            for &n in &nbuf {
                if cells[n] != EMPTY && labels[n] == 0 && key(cells[n]) == group {
                    labels[n] = count;
                    queue.push_back(n);
                }
            }
        }
    }
    ComponentLabeling { labels, count }
}
