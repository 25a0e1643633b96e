//! N-dimensional lattice of species labels over flattened storage.
//!
//! Axis 0 is the gravity axis; layer 0 of axis 0 is the anchor face that
//! transport compacts toward. Storage is row-major with axis 0 slowest,
//! so the cells of one column (all coordinates fixed except axis 0) are
//! `col + layer * num_columns()` — transport and statistics lean on that.

use rand::distributions::Distribution;
use rand::Rng;

use crate::error::{ConfigError, LatticeError};

/// Cell label: `EMPTY` or a species in `1..=K`.
pub type Species = u16;

/// The empty label.
pub const EMPTY: Species = 0;

/// Highest supported lattice dimension.
pub const MAX_DIM: usize = 4;

/// Coordinate tuple. Only the first `dim` entries are meaningful.
pub type Coord = [isize; MAX_DIM];

/// Per-axis boundary policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryMode {
    /// Coordinates beyond the axis are off-lattice.
    Open,
    /// Coordinates wrap modulo the axis length.
    Periodic,
}

/// Dense D-dimensional grid of species labels, D in 1..=4.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lattice {
    shape: [usize; MAX_DIM],
    strides: [usize; MAX_DIM],
    boundary: [BoundaryMode; MAX_DIM],
    dim: usize,
    cells: Vec<Species>,
}

impl Lattice {
    /// Allocate an all-empty lattice.
    ///
    /// # Errors
    /// Rejects dimensions outside `1..=4`, zero-length axes, and a
    /// boundary list whose arity disagrees with the shape.
    pub fn new(shape: &[usize], boundary: &[BoundaryMode]) -> Result<Self, ConfigError> {
        let dim = shape.len();
        if !(1..=MAX_DIM).contains(&dim) {
            return Err(ConfigError::DimensionOutOfRange(dim));
        }
        if boundary.len() != dim {
            return Err(ConfigError::BoundaryArityMismatch {
                shape: dim,
                boundary: boundary.len(),
            });
        }
        let mut padded_shape = [1usize; MAX_DIM];
        let mut padded_boundary = [BoundaryMode::Open; MAX_DIM];
        for (axis, (&len, &mode)) in shape.iter().zip(boundary).enumerate() {
            if len == 0 {
                return Err(ConfigError::EmptyAxis(axis));
            }
            padded_shape[axis] = len;
            padded_boundary[axis] = mode;
        }
        let mut strides = [0usize; MAX_DIM];
        let mut acc = 1;
        for axis in (0..dim).rev() {
            strides[axis] = acc;
            acc *= padded_shape[axis];
        }
        Ok(Self {
            shape: padded_shape,
            strides,
            boundary: padded_boundary,
            dim,
            cells: vec![EMPTY; acc],
        })
    }

    #[must_use]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Axis lengths, one per dimension.
    #[must_use]
    pub fn shape(&self) -> &[usize] {
        &self.shape[..self.dim]
    }

    #[must_use]
    pub fn boundary(&self) -> &[BoundaryMode] {
        &self.boundary[..self.dim]
    }

    /// Total cell count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Length of the gravity axis.
    #[must_use]
    pub fn height(&self) -> usize {
        self.shape[0]
    }

    /// Number of columns, i.e. cells per layer of the gravity axis.
    #[must_use]
    pub fn num_columns(&self) -> usize {
        self.strides[0]
    }

    /// Flat view of the cells, layer 0 first.
    #[must_use]
    pub fn cells(&self) -> &[Species] {
        &self.cells
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [Species] {
        &mut self.cells
    }

    /// Flat index of a canonical (in-bounds, non-negative) coordinate.
    #[must_use]
    pub fn index_of(&self, coord: Coord) -> usize {
        let mut idx = 0;
        for axis in 0..self.dim {
            idx += coord[axis] as usize * self.strides[axis];
        }
        idx
    }

    /// Canonical coordinate of a flat index.
    #[must_use]
    pub fn coord_of(&self, idx: usize) -> Coord {
        let mut coord = [0isize; MAX_DIM];
        for axis in 0..self.dim {
            coord[axis] = (idx / self.strides[axis] % self.shape[axis]) as isize;
        }
        coord
    }

    /// Resolve a raw coordinate to a flat index, wrapping periodic axes.
    ///
    /// # Errors
    /// `OutOfRange` when an open-axis coordinate lies outside the lattice.
    pub fn resolve(&self, coord: Coord) -> Result<usize, LatticeError> {
        let mut idx = 0;
        for axis in 0..self.dim {
            let len = self.shape[axis] as isize;
            let x = match self.boundary[axis] {
                BoundaryMode::Periodic => coord[axis].rem_euclid(len),
                BoundaryMode::Open => {
                    let x = coord[axis];
                    if x < 0 || x >= len {
                        return Err(LatticeError::OutOfRange {
                            axis,
                            index: x,
                            len: len as usize,
                        });
                    }
                    x
                }
            };
            idx += x as usize * self.strides[axis];
        }
        Ok(idx)
    }

    /// Like [`resolve`](Self::resolve) but clipping instead of failing:
    /// off-lattice coordinates on open axes are simply not neighbors.
    #[must_use]
    pub(crate) fn wrap(&self, coord: Coord) -> Option<usize> {
        self.resolve(coord).ok()
    }

    /// Read the label at a coordinate.
    ///
    /// # Errors
    /// `OutOfRange` for open-axis coordinates beyond bounds.
    pub fn get(&self, coord: Coord) -> Result<Species, LatticeError> {
        Ok(self.cells[self.resolve(coord)?])
    }

    /// Write the label at a coordinate.
    ///
    /// # Errors
    /// `OutOfRange` for open-axis coordinates beyond bounds.
    pub fn set(&mut self, coord: Coord, species: Species) -> Result<(), LatticeError> {
        let idx = self.resolve(coord)?;
        self.cells[idx] = species;
        Ok(())
    }

    /// Nonzero cell count.
    #[must_use]
    pub fn mass(&self) -> usize {
        self.cells.iter().filter(|&&c| c != EMPTY).count()
    }

    /// True if the flat index lies on layer 0 or the last layer of any
    /// open axis.
    #[must_use]
    pub(crate) fn on_open_face(&self, idx: usize) -> bool {
        let coord = self.coord_of(idx);
        (0..self.dim).any(|axis| {
            self.boundary[axis] == BoundaryMode::Open
                && (coord[axis] == 0 || coord[axis] == self.shape[axis] as isize - 1)
        })
    }

    /// Fill every interior cell with a species drawn from `dist`, leaving
    /// a one-cell empty margin on open axes. This is the seeding used by
    /// percolation runs: the margin is the boundary the invasion grows in
    /// from, and `dist` sets the species abundances.
    pub fn fill_interior_random<R: Rng, D: Distribution<Species>>(
        &mut self,
        dist: &D,
        rng: &mut R,
    ) {
        for idx in 0..self.cells.len() {
            let coord = self.coord_of(idx);
            let interior = (0..self.dim).all(|axis| {
                self.boundary[axis] == BoundaryMode::Periodic
                    || (coord[axis] >= 1 && coord[axis] <= self.shape[axis] as isize - 2)
            });
            if interior {
                self.cells[idx] = dist.sample(rng);
            }
        }
    }
}
