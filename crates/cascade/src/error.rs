//! Error types for the engine.
//!
//! `ConfigError` is fatal at construction: `Simulation::new` returns it
//! before any state is created. `LatticeError` signals a caller bug
//! (out-of-range access on an open axis) and never occurs during a
//! normal cascade.

use thiserror::Error;

/// Inconsistent run configuration, rejected before any state is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Lattice dimension outside the supported range.
    #[error("lattice dimension must be 1..=4, got {0}")]
    DimensionOutOfRange(usize),

    /// An axis with zero length.
    #[error("axis {0} has zero length")]
    EmptyAxis(usize),

    /// Shape and boundary-mode lists disagree on the number of axes.
    #[error("shape has {shape} axes but {boundary} boundary modes")]
    BoundaryArityMismatch {
        /// Number of axes in the shape.
        shape: usize,
        /// Number of boundary modes supplied.
        boundary: usize,
    },

    /// Species count of zero.
    #[error("species count must be at least 1")]
    NoSpecies,

    /// Species weight table whose length disagrees with the species count.
    #[error("{species} species but {weights} weights supplied")]
    WeightArityMismatch {
        /// Configured species count.
        species: usize,
        /// Number of weights supplied.
        weights: usize,
    },

    /// Species weights must be finite, non-negative, and not all zero.
    #[error("species weights must be finite, non-negative, with a positive total")]
    InvalidSpeciesWeights,

    /// Elimination threshold of zero would erase every deposit.
    #[error("elimination threshold must be at least 1")]
    ZeroThreshold,

    /// Hex connectivity only exists on 2-dimensional lattices.
    #[error("hex connectivity requires a 2-dimensional lattice, got {0}")]
    HexDimension(usize),

    /// Wrapping an odd number of hex rows breaks the parity-dependent
    /// neighbor offsets at the seam.
    #[error("hex connectivity with a periodic axis 0 requires an even row count, got {0}")]
    HexOddPeriodicRows(usize),

    /// Slip deposition is defined by the hex drop-height tie-break.
    #[error("slip deposition requires hex connectivity")]
    SlipNeedsHex,

    /// Gravity compacts toward layer 0 of axis 0, which must be a wall.
    #[error("gravity transport requires an open boundary on axis 0")]
    GravityNeedsOpenFloor,

    /// Boundary invasion targets the current victim species, which only
    /// the victim sweep advances.
    #[error("boundary invasion requires victim-sweep deposition")]
    InvasionNeedsVictims,

    /// Invasion grows inward from open faces; a fully periodic lattice
    /// has none.
    #[error("boundary invasion requires at least one open axis")]
    InvasionNeedsOpenBoundary,
}

/// Coordinate access failure on a non-periodic axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LatticeError {
    /// Raw coordinate beyond the bounds of an open axis. Periodic axes
    /// wrap instead and never produce this.
    #[error("coordinate {index} out of range on open axis {axis} of length {len}")]
    OutOfRange {
        /// Offending axis.
        axis: usize,
        /// Raw coordinate supplied by the caller.
        index: isize,
        /// Length of the axis.
        len: usize,
    },
}
