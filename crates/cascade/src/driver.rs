//! Simulation driver: the Perturb → Cascade → Settled state machine.
//!
//! One macro-step applies the deposition rule once, then repeats
//! {detect, eliminate, transport} until a full cycle changes nothing,
//! and emits a [`CascadeRecord`]. The driver owns the lattice and the
//! seeded RNG for the whole run; identical config and seed reproduce an
//! identical record stream. A run may be abandoned between macro-steps
//! simply by not calling [`Simulation::step`] again — no partial record
//! is ever emitted.

use log::{debug, trace};
use rand::distributions::Distribution;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::cluster::{label_components, Grouping};
use crate::error::ConfigError;
use crate::lattice::{BoundaryMode, Lattice, Species};
use crate::record::{column_heights, roughness, slope_profile, CascadeRecord, RecordFields};
use crate::rules::deposit::{self, Deposition, DropPolicy, SpeciesMix, SpeciesSampler, VictimOrder};
use crate::rules::eliminate::{invasion_eliminate, threshold_eliminate};
use crate::rules::transport::{compact_columns, lower_floating, Transport};
use crate::topology::{Connectivity, Topology};

/// Elimination variant, fixed per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Elimination {
    /// Remove every same-species cluster larger than `threshold` cells.
    Threshold {
        /// Largest cluster size that survives.
        threshold: usize,
    },
    /// Remove the region the current victim species opens up from the
    /// lattice boundary (percolation).
    BoundaryInvasion,
}

/// When a run ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stopping {
    /// Fixed macro-step budget.
    Steps(usize),
    /// Run until the lattice empties, bounded by a step budget.
    Extinction {
        /// Hard cap on macro-steps.
        max_steps: usize,
    },
}

/// Terminal state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Running,
    /// The lattice emptied completely.
    Extinguished,
    /// The step budget ran out.
    StepBudgetExhausted,
}

/// Full run configuration, supplied externally; the engine does no file
/// or argument parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Axis lengths; axis 0 is the gravity axis.
    pub shape: Vec<usize>,
    /// Boundary mode per axis.
    pub boundary: Vec<BoundaryMode>,
    pub connectivity: Connectivity,
    /// Species count K; labels run `1..=K`.
    pub species: Species,
    /// Distribution the species labels are drawn from.
    pub species_mix: SpeciesMix,
    pub elimination: Elimination,
    pub transport: Transport,
    pub deposition: Deposition,
    pub stopping: Stopping,
    pub fields: RecordFields,
    pub seed: u64,
}

impl Config {
    /// Cross-field consistency checks. Shape and connectivity geometry
    /// are validated by [`Lattice::new`] and [`Topology::new`].
    ///
    /// # Errors
    /// See [`ConfigError`]; nothing is constructed on failure.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.species == 0 {
            return Err(ConfigError::NoSpecies);
        }
        self.species_mix.sampler(self.species)?;
        if matches!(self.elimination, Elimination::Threshold { threshold: 0 }) {
            return Err(ConfigError::ZeroThreshold);
        }
        if matches!(
            self.deposition,
            Deposition::SingleDrop {
                policy: DropPolicy::Slip
            }
        ) && self.connectivity != Connectivity::Hex
        {
            return Err(ConfigError::SlipNeedsHex);
        }
        if self.transport != Transport::None
            && self.boundary.first() == Some(&BoundaryMode::Periodic)
        {
            return Err(ConfigError::GravityNeedsOpenFloor);
        }
        if self.elimination == Elimination::BoundaryInvasion {
            if self.deposition != Deposition::VictimSweep {
                return Err(ConfigError::InvasionNeedsVictims);
            }
            if !self.boundary.contains(&BoundaryMode::Open) {
                return Err(ConfigError::InvasionNeedsOpenBoundary);
            }
        }
        Ok(())
    }
}

/// One simulation run. Owns the lattice; mutated in place by the rules.
#[derive(Debug)]
pub struct Simulation {
    config: Config,
    lattice: Lattice,
    topology: Topology,
    rng: ChaCha8Rng,
    sampler: SpeciesSampler,
    victims: Option<VictimOrder>,
    current_victim: Species,
    script_pos: usize,
    step_index: usize,
    cumulative_eliminated: usize,
    status: Status,
}

impl Simulation {
    /// Build a run from its configuration. Victim-sweep runs start from
    /// a randomly filled interior (the percolation seeding); everything
    /// else starts empty.
    ///
    /// # Errors
    /// Any [`ConfigError`]; no partial state is created.
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut lattice = Lattice::new(&config.shape, &config.boundary)?;
        let topology = Topology::new(config.connectivity, &lattice)?;
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let sampler = config.species_mix.sampler(config.species)?;
        let victims = if config.deposition == Deposition::VictimSweep {
            lattice.fill_interior_random(&sampler, &mut rng);
            Some(VictimOrder::new(config.species))
        } else {
            None
        };
        // a zero budget is terminal before the first perturbation
        let status = match config.stopping {
            Stopping::Steps(0) | Stopping::Extinction { max_steps: 0 } => {
                Status::StepBudgetExhausted
            }
            _ => Status::Running,
        };
        Ok(Self {
            config,
            lattice,
            topology,
            rng,
            sampler,
            victims,
            current_victim: 0,
            script_pos: 0,
            step_index: 0,
            cumulative_eliminated: 0,
            status,
        })
    }

    #[must_use]
    pub fn status(&self) -> Status {
        self.status
    }

    #[must_use]
    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    /// Mutable lattice access, for seeding scripted initial states
    /// before the first macro-step.
    pub fn lattice_mut(&mut self) -> &mut Lattice {
        &mut self.lattice
    }

    /// Run one macro-step to completion and record it. Returns `None`
    /// once the run has reached a terminal status.
    pub fn step(&mut self) -> Option<CascadeRecord> {
        if self.status != Status::Running {
            return None;
        }
        self.perturb();
        let (avalanche, clusters) = self.cascade();
        self.cumulative_eliminated += avalanche;
        let record = self.make_record(avalanche, clusters);
        debug!(
            "macro-step {}: mass {}, avalanche {avalanche} cells / {clusters} clusters",
            record.step, record.mass
        );
        self.step_index += 1;
        self.status = self.next_status(record.mass);
        Some(record)
    }

    /// Drive to termination, collecting every record.
    pub fn run(&mut self) -> Vec<CascadeRecord> {
        let mut records = Vec::new();
        while let Some(record) = self.step() {
            records.push(record);
        }
        records
    }

    fn perturb(&mut self) {
        match &self.config.deposition {
            Deposition::FillAllEmpty => {
                deposit::fill_all_empty(&mut self.lattice, &self.sampler, &mut self.rng);
            }
            Deposition::SingleDrop { policy } => {
                let policy = *policy;
                let col = self.rng.gen_range(0..self.lattice.num_columns());
                let species = self.sampler.sample(&mut self.rng);
                match policy {
                    DropPolicy::Straight => {
                        deposit::drop_straight(&mut self.lattice, col, species);
                    }
                    DropPolicy::Sticky => {
                        deposit::drop_sticky(&mut self.lattice, col, species);
                    }
                    DropPolicy::Slip => {
                        deposit::drop_slip(&mut self.lattice, col, species, &mut self.rng);
                    }
                }
            }
            Deposition::EdenGrowth => {
                deposit::eden_deposit(
                    &mut self.lattice,
                    &self.topology,
                    &self.sampler,
                    &mut self.rng,
                );
            }
            Deposition::Script(script) => {
                if let Some(&(col, species)) = script.get(self.script_pos) {
                    self.script_pos += 1;
                    deposit::drop_straight(&mut self.lattice, col, species);
                }
            }
            Deposition::VictimSweep => {
                if let Some(order) = &mut self.victims {
                    self.current_victim = order.advance();
                }
            }
        }
    }

    /// The inner cascade: repeat {detect, eliminate, transport} until a
    /// full cycle leaves the lattice unchanged. Finite because every
    /// iteration either removes a cell or strictly lowers the total
    /// potential energy, both bounded below.
    fn cascade(&mut self) -> (usize, usize) {
        let mut removed_total = 0;
        let mut clusters_total = 0;
        let mut iteration = 0usize;
        loop {
            iteration += 1;
            let removed = match self.config.elimination {
                Elimination::Threshold { threshold } => {
                    let labeling =
                        label_components(&self.lattice, &self.topology, Grouping::BySpecies);
                    let out = threshold_eliminate(&mut self.lattice, &labeling, threshold);
                    clusters_total += out.clusters;
                    out.cells
                }
                Elimination::BoundaryInvasion => {
                    let cells = invasion_eliminate(
                        &mut self.lattice,
                        &self.topology,
                        self.current_victim,
                    );
                    if cells > 0 {
                        clusters_total += 1;
                    }
                    cells
                }
            };
            removed_total += removed;
            let moved = match self.config.transport {
                Transport::ColumnCompaction => compact_columns(&mut self.lattice),
                Transport::FloatingCluster => lower_floating(&mut self.lattice, &self.topology),
                Transport::None => false,
            };
            trace!("cascade iteration {iteration}: removed {removed}, moved {moved}");
            if removed == 0 && !moved {
                break;
            }
        }
        (removed_total, clusters_total)
    }

    fn make_record(&self, avalanche: usize, clusters: usize) -> CascadeRecord {
        let fields = self.config.fields;
        let heights = column_heights(&self.lattice);
        // slope wrapping follows axis 1 alone; see `slope_profile` for
        // what the sequence means above two dimensions
        let lateral_periodic = self.lattice.dim() > 1
            && self.lattice.boundary()[1] == BoundaryMode::Periodic;
        CascadeRecord {
            step: self.step_index,
            mass: self.lattice.mass(),
            max_height: heights.iter().copied().max().unwrap_or(0),
            avalanche_size: fields.avalanches.then_some(avalanche),
            clusters_removed: fields.avalanches.then_some(clusters),
            cumulative_eliminated: fields.avalanches.then_some(self.cumulative_eliminated),
            slopes: fields
                .heights
                .then(|| slope_profile(&heights, lateral_periodic)),
            roughness: fields.heights.then(|| roughness(&heights)),
            heights: fields.heights.then_some(heights),
        }
    }

    fn next_status(&self, mass: usize) -> Status {
        match self.config.stopping {
            Stopping::Steps(budget) if self.step_index >= budget => Status::StepBudgetExhausted,
            Stopping::Extinction { .. } if mass == 0 => Status::Extinguished,
            Stopping::Extinction { max_steps } if self.step_index >= max_steps => {
                Status::StepBudgetExhausted
            }
            _ => Status::Running,
        }
    }
}
