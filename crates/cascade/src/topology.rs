//! Neighbor generation under the active connectivity.
//!
//! Square lattices use von Neumann adjacency (2·D offsets). Hex lattices
//! are 2-D offset grids where odd rows sit half a cell to the right, so
//! the six neighbor offsets depend on the parity of the row index —
//! lookups must be parity-aware, not purely relative.

use crate::error::ConfigError;
use crate::lattice::{BoundaryMode, Lattice};

/// Offsets for even hex rows (row shifted left relative to odd rows).
const HEX_EVEN: [(isize, isize); 6] = [(-1, 0), (-1, -1), (0, -1), (0, 1), (1, 0), (1, -1)];

/// Offsets for odd hex rows.
const HEX_ODD: [(isize, isize); 6] = [(-1, 0), (-1, 1), (0, -1), (0, 1), (1, 0), (1, 1)];

/// Cell adjacency rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    /// Von Neumann: one step along each axis.
    Square,
    /// Six axial neighbors on a row-parity offset hex grid. 2-D only.
    Hex,
}

/// Neighbor generator for one lattice geometry. Immutable for a run.
#[derive(Debug, Clone, Copy)]
pub struct Topology {
    connectivity: Connectivity,
}

impl Topology {
    /// Validate the connectivity against the lattice geometry.
    ///
    /// # Errors
    /// Hex requires exactly two dimensions, and an even row count when
    /// axis 0 is periodic (otherwise the parity rule breaks at the seam).
    pub fn new(connectivity: Connectivity, lattice: &Lattice) -> Result<Self, ConfigError> {
        if connectivity == Connectivity::Hex {
            if lattice.dim() != 2 {
                return Err(ConfigError::HexDimension(lattice.dim()));
            }
            if lattice.boundary()[0] == BoundaryMode::Periodic && lattice.height() % 2 != 0 {
                return Err(ConfigError::HexOddPeriodicRows(lattice.height()));
            }
        }
        Ok(Self { connectivity })
    }

    #[must_use]
    pub fn connectivity(&self) -> Connectivity {
        self.connectivity
    }

    /// Collect the in-lattice neighbor indices of `idx` into `out`.
    ///
    /// Periodic axes wrap; offsets leaving the lattice on an open axis
    /// are dropped. The buffer is cleared first so callers can reuse it
    /// across the flood fill.
    pub fn neighbors_into(&self, lattice: &Lattice, idx: usize, out: &mut Vec<usize>) {
        out.clear();
        let coord = lattice.coord_of(idx);
        match self.connectivity {
            Connectivity::Square => {
                for axis in 0..lattice.dim() {
                    for delta in [-1, 1] {
                        let mut n = coord;
                        n[axis] += delta;
                        if let Some(j) = lattice.wrap(n) {
                            out.push(j);
                        }
                    }
                }
            }
            Connectivity::Hex => {
                let offsets = if coord[0] % 2 == 0 { &HEX_EVEN } else { &HEX_ODD };
                for &(dr, dc) in offsets {
                    let n = [coord[0] + dr, coord[1] + dc, 0, 0];
                    if let Some(j) = lattice.wrap(n) {
                        out.push(j);
                    }
                }
            }
        }
    }
}
