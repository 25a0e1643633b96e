//! Lattice elimination-collapse simulation engine.
//!
//! Colored particles are deposited on an N-dimensional lattice,
//! same-species connected clusters above a size threshold are
//! eliminated, and the survivors settle under gravity (or, in the
//! percolation variants, a boundary invasion eats the current victim
//! species) — repeated until each macro-step reaches a fixpoint. The
//! driver emits one [`CascadeRecord`] per macro-step; serialization and
//! plotting belong to external consumers.
//!
//! A run is fully described by a [`Config`]: lattice shape and boundary
//! modes, square or hex connectivity, species count, and the
//! deposition / elimination / transport variants. Identical config and
//! seed reproduce an identical record stream.

pub mod cluster;
pub mod driver;
pub mod error;
pub mod lattice;
pub mod record;
pub mod rules;
pub mod topology;

pub use cluster::{label_components, ComponentLabeling, Grouping};
pub use driver::{Config, Elimination, Simulation, Status, Stopping};
pub use error::{ConfigError, LatticeError};
pub use lattice::{BoundaryMode, Coord, Lattice, Species, EMPTY, MAX_DIM};
pub use record::{CascadeRecord, RecordFields};
pub use rules::deposit::{Deposition, DropPolicy, SpeciesMix, VictimOrder};
pub use rules::transport::Transport;
pub use topology::{Connectivity, Topology};
