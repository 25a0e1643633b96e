//! Deposition and perturbation rules: how matter enters a macro-step.

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

use crate::error::ConfigError;
use crate::lattice::{Lattice, Species, EMPTY, MAX_DIM};
use crate::topology::Topology;

/// Where a dropped particle comes to rest.
///
/// The duplicated originals disagree on whether lateral contact stops a
/// fall before the column bottoms out, so the tie-break is a
/// configuration choice rather than a fixed rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropPolicy {
    /// Fall to the lowest empty cell of the chosen column.
    Straight,
    /// Ballistic: descend and stick at the first cell supported from
    /// below or by an occupied lateral neighbor.
    Sticky,
    /// Hex: among the chosen column and its two lateral neighbors, drop
    /// straight into the one with the lowest landing site, breaking ties
    /// uniformly at random.
    Slip,
}

/// Deposition variant, fixed per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deposition {
    /// Every empty cell draws a random species.
    FillAllEmpty,
    /// One particle per macro-step into a uniformly random column.
    SingleDrop {
        /// Landing rule.
        policy: DropPolicy,
    },
    /// One particle per macro-step onto the growth frontier: a uniformly
    /// random empty site with at least one occupied neighbor. An empty
    /// lattice is seeded at its center instead.
    EdenGrowth,
    /// Scripted `(column, species)` drops, one per macro-step,
    /// straight-down placement. Used for reproducible scenarios.
    Script(Vec<(usize, Species)>),
    /// No new matter; the victim order advances instead.
    VictimSweep,
}

/// Species-label distribution shared by every stochastic draw: fills,
/// drops, and the victim-sweep interior seeding.
#[derive(Debug, Clone, PartialEq)]
pub enum SpeciesMix {
    /// Every species in `1..=K` equally likely.
    Uniform,
    /// One weight per species label, in label order. Weights need not
    /// sum to one; a zero-weight species is never drawn.
    Weighted(Vec<f64>),
}

impl SpeciesMix {
    /// Power-law abundance profile: the species of rank `r` gets weight
    /// `r^(-1/tau - 1)`, so a handful of species dominate the draws.
    #[must_use]
    pub fn zipf(k: Species, tau: f64) -> Self {
        Self::Weighted(
            (1..=k)
                .map(|r| f64::from(r).powf(-1.0 / tau - 1.0))
                .collect(),
        )
    }

    /// Resolve against the species count `k`.
    pub(crate) fn sampler(&self, k: Species) -> Result<SpeciesSampler, ConfigError> {
        match self {
            Self::Uniform => Ok(SpeciesSampler::Uniform { k }),
            Self::Weighted(weights) => {
                if weights.len() != usize::from(k) {
                    return Err(ConfigError::WeightArityMismatch {
                        species: usize::from(k),
                        weights: weights.len(),
                    });
                }
                if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
                    return Err(ConfigError::InvalidSpeciesWeights);
                }
                let index =
                    WeightedIndex::new(weights).map_err(|_| ConfigError::InvalidSpeciesWeights)?;
                Ok(SpeciesSampler::Weighted(index))
            }
        }
    }
}

/// Resolved form of [`SpeciesMix`], ready to draw labels from.
#[derive(Debug, Clone)]
pub(crate) enum SpeciesSampler {
    Uniform { k: Species },
    Weighted(WeightedIndex<f64>),
}

impl Distribution<Species> for SpeciesSampler {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Species {
        match self {
            Self::Uniform { k } => rng.gen_range(1..=*k),
            Self::Weighted(index) => index.sample(rng) as Species + 1,
        }
    }
}

/// Cyclic sequence over species `1..=k` selecting the invasion target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VictimOrder {
    k: Species,
    next: Species,
}

impl VictimOrder {
    #[must_use]
    pub fn new(k: Species) -> Self {
        Self { k, next: 1 }
    }

    /// The species targeted this macro-step; the cursor advances.
    pub fn advance(&mut self) -> Species {
        let victim = self.next;
        self.next = if self.next == self.k { 1 } else { self.next + 1 };
        victim
    }
}

/// Fill every empty cell with a species drawn from `dist`.
pub fn fill_all_empty<R: Rng, D: Distribution<Species>>(
    lattice: &mut Lattice,
    dist: &D,
    rng: &mut R,
) {
    for cell in lattice.cells_mut() {
        if *cell == EMPTY {
            *cell = dist.sample(rng);
        }
    }
}

/// Eden growth: occupy one uniformly random site on the growth frontier
/// (empty cells with at least one occupied neighbor). An empty lattice is
/// seeded at its center. Returns false only when the lattice is full.
pub fn eden_deposit<R: Rng, D: Distribution<Species>>(
    lattice: &mut Lattice,
    topology: &Topology,
    dist: &D,
    rng: &mut R,
) -> bool {
    let site = if lattice.mass() == 0 {
        let mut center: [isize; MAX_DIM] = [0; MAX_DIM];
        for (axis, c) in center.iter_mut().enumerate().take(lattice.dim()) {
            *c = (lattice.shape()[axis] / 2) as isize;
        }
        lattice.wrap(center)
    } else {
        let mut neighbors = Vec::new();
        let frontier: Vec<usize> = (0..lattice.len())
            .filter(|&idx| {
                if lattice.cells()[idx] != EMPTY {
                    return false;
                }
                topology.neighbors_into(lattice, idx, &mut neighbors);
                neighbors.iter().any(|&n| lattice.cells()[n] != EMPTY)
            })
            .collect();
        if frontier.is_empty() {
            None
        } else {
            Some(frontier[rng.gen_range(0..frontier.len())])
        }
    };
    match site {
        Some(idx) => {
            let species = dist.sample(rng);
            lattice.cells_mut()[idx] = species;
            true
        }
        None => false,
    }
}

/// Lowest empty layer of a column, scanning up from the anchor face.
fn lowest_empty(lattice: &Lattice, col: usize) -> Option<usize> {
    let ncols = lattice.num_columns();
    (0..lattice.height()).find(|&layer| lattice.cells()[col + layer * ncols] == EMPTY)
}

/// Straight drop into `col`. Returns false when the column is full.
pub fn drop_straight(lattice: &mut Lattice, col: usize, species: Species) -> bool {
    match lowest_empty(lattice, col) {
        Some(layer) => {
            let ncols = lattice.num_columns();
            lattice.cells_mut()[col + layer * ncols] = species;
            true
        }
        None => false,
    }
}

/// Ballistic drop into `col`: the particle descends from above the
/// lattice and rests at the first cell whose cell below, or an occupied
/// lateral neighbor (one step along any non-gravity axis, respecting the
/// boundary mode), stops it; otherwise it lands on the anchor face.
pub fn drop_sticky(lattice: &mut Lattice, col: usize, species: Species) -> bool {
    let ncols = lattice.num_columns();
    let lateral_occupied = |lattice: &Lattice, layer: usize| {
        let coord = lattice.coord_of(col + layer * ncols);
        (1..lattice.dim()).any(|axis| {
            [-1, 1].into_iter().any(|delta| {
                let mut n = coord;
                n[axis] += delta;
                lattice
                    .wrap(n)
                    .is_some_and(|j| lattice.cells()[j] != EMPTY)
            })
        })
    };
    for layer in (1..lattice.height()).rev() {
        let below = lattice.cells()[col + (layer - 1) * ncols];
        if below != EMPTY || lateral_occupied(lattice, layer) {
            let idx = col + layer * ncols;
            if lattice.cells()[idx] != EMPTY {
                return false;
            }
            lattice.cells_mut()[idx] = species;
            return true;
        }
    }
    if lattice.cells()[col] == EMPTY {
        lattice.cells_mut()[col] = species;
        return true;
    }
    false
}

/// Hex slip drop: consider `col` and its two lateral neighbors on axis 1
/// (wrapping or clipping per the boundary mode), find the columns whose
/// landing site is lowest, pick one uniformly among ties, and drop
/// straight into it.
pub fn drop_slip<R: Rng>(
    lattice: &mut Lattice,
    col: usize,
    species: Species,
    rng: &mut R,
) -> bool {
    let mut best_layer = usize::MAX;
    let mut candidates: Vec<usize> = Vec::with_capacity(3);
    for delta in [-1, 0, 1] {
        let coord = [0, col as isize + delta, 0, 0];
        let Some(idx) = lattice.wrap(coord) else {
            continue;
        };
        debug_assert!(idx < lattice.num_columns());
        let Some(layer) = lowest_empty(lattice, idx) else {
            continue;
        };
        if layer < best_layer {
            best_layer = layer;
            candidates.clear();
        }
        if layer == best_layer {
            candidates.push(idx);
        }
    }
    if candidates.is_empty() {
        return false;
    }
    let chosen = candidates[rng.gen_range(0..candidates.len())];
    drop_straight(lattice, chosen, species)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{label_components, Grouping};
    use crate::lattice::BoundaryMode;
    use crate::topology::Connectivity;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn open2(h: usize, w: usize) -> Lattice {
        Lattice::new(&[h, w], &[BoundaryMode::Open, BoundaryMode::Open]).unwrap()
    }

    #[test]
    fn straight_drop_stacks_from_anchor() {
        let mut lat = open2(4, 2);
        assert!(drop_straight(&mut lat, 0, 1));
        assert!(drop_straight(&mut lat, 0, 2));
        assert_eq!(lat.get([0, 0, 0, 0]).unwrap(), 1);
        assert_eq!(lat.get([1, 0, 0, 0]).unwrap(), 2);
        assert_eq!(lat.get([0, 1, 0, 0]).unwrap(), EMPTY);
    }

    #[test]
    fn straight_drop_full_column_fails() {
        let mut lat = open2(2, 1);
        assert!(drop_straight(&mut lat, 0, 1));
        assert!(drop_straight(&mut lat, 0, 1));
        assert!(!drop_straight(&mut lat, 0, 1));
    }

    #[test]
    fn sticky_drop_clings_to_tower() {
        // tower of height 3 in column 1; a sticky particle in column 2
        // rests beside its top instead of falling to the floor
        let mut lat = open2(5, 4);
        for _ in 0..3 {
            drop_straight(&mut lat, 1, 1);
        }
        assert!(drop_sticky(&mut lat, 2, 2));
        assert_eq!(lat.get([2, 2, 0, 0]).unwrap(), 2);
        // the straight policy would have reached the floor
        let mut flat = open2(5, 4);
        for _ in 0..3 {
            drop_straight(&mut flat, 1, 1);
        }
        assert!(drop_straight(&mut flat, 2, 2));
        assert_eq!(flat.get([0, 2, 0, 0]).unwrap(), 2);
    }

    #[test]
    fn sticky_drop_on_empty_floor() {
        let mut lat = open2(4, 3);
        assert!(drop_sticky(&mut lat, 1, 3));
        assert_eq!(lat.get([0, 1, 0, 0]).unwrap(), 3);
    }

    #[test]
    fn slip_drop_prefers_lower_column() {
        let mut lat = open2(5, 4);
        drop_straight(&mut lat, 0, 1);
        drop_straight(&mut lat, 0, 1);
        drop_straight(&mut lat, 1, 1);
        // candidates {0,1,2}: heights 2,1,0 — column 2 wins outright
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(drop_slip(&mut lat, 1, 2, &mut rng));
        assert_eq!(lat.get([0, 2, 0, 0]).unwrap(), 2);
    }

    #[test]
    fn slip_drop_tie_lands_on_some_floor_candidate() {
        for seed in 0..16 {
            let mut lat = open2(5, 4);
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            assert!(drop_slip(&mut lat, 1, 2, &mut rng));
            let landed: Vec<usize> = (0..4)
                .filter(|&c| lat.get([0, c as isize, 0, 0]).unwrap() == 2)
                .collect();
            assert_eq!(landed.len(), 1);
            assert!((0..=2).contains(&landed[0]), "landed outside candidates");
        }
    }

    #[test]
    fn zipf_weights_decay_with_rank() {
        let SpeciesMix::Weighted(w) = SpeciesMix::zipf(4, 2.0) else {
            panic!("zipf is a weight table");
        };
        assert_eq!(w.len(), 4);
        assert!(w.windows(2).all(|p| p[0] > p[1]));
    }

    #[test]
    fn weighted_sampler_never_draws_zero_weight_species() {
        let dist = SpeciesMix::Weighted(vec![0.0, 3.0, 0.0]).sampler(3).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..64 {
            assert_eq!(dist.sample(&mut rng), 2);
        }
    }

    #[test]
    fn weight_table_must_match_species_count() {
        assert_eq!(
            SpeciesMix::Weighted(vec![1.0]).sampler(3).err(),
            Some(ConfigError::WeightArityMismatch {
                species: 3,
                weights: 1
            })
        );
        assert_eq!(
            SpeciesMix::Weighted(vec![0.0, 0.0]).sampler(2).err(),
            Some(ConfigError::InvalidSpeciesWeights)
        );
        assert_eq!(
            SpeciesMix::Weighted(vec![1.0, -0.5]).sampler(2).err(),
            Some(ConfigError::InvalidSpeciesWeights)
        );
    }

    #[test]
    fn eden_seeds_the_center_of_an_empty_lattice() {
        let mut lat = open2(5, 5);
        let topo = Topology::new(Connectivity::Square, &lat).unwrap();
        let dist = SpeciesMix::Uniform.sampler(3).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        assert!(eden_deposit(&mut lat, &topo, &dist, &mut rng));
        assert_eq!(lat.mass(), 1);
        assert_ne!(lat.get([2, 2, 0, 0]).unwrap(), EMPTY);
    }

    #[test]
    fn eden_growth_stays_one_connected_aggregate() {
        let mut lat = open2(7, 7);
        let topo = Topology::new(Connectivity::Square, &lat).unwrap();
        let dist = SpeciesMix::Uniform.sampler(2).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for added in 1..=12 {
            assert!(eden_deposit(&mut lat, &topo, &dist, &mut rng));
            assert_eq!(lat.mass(), added);
        }
        let labeling = label_components(&lat, &topo, Grouping::Occupancy);
        assert_eq!(labeling.count, 1);
    }

    #[test]
    fn eden_on_a_full_lattice_is_a_noop() {
        let mut lat = open2(1, 1);
        let topo = Topology::new(Connectivity::Square, &lat).unwrap();
        let dist = SpeciesMix::Uniform.sampler(1).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(eden_deposit(&mut lat, &topo, &dist, &mut rng));
        assert!(!eden_deposit(&mut lat, &topo, &dist, &mut rng));
        assert_eq!(lat.mass(), 1);
    }

    #[test]
    fn victim_order_cycles() {
        let mut order = VictimOrder::new(3);
        let drawn: Vec<Species> = (0..7).map(|_| order.advance()).collect();
        assert_eq!(drawn, vec![1, 2, 3, 1, 2, 3, 1]);
    }

    proptest! {
        #[test]
        fn prop_fill_all_empty_fills_exactly_the_holes(
            occupied in proptest::collection::vec(any::<bool>(), 24),
            k in 1u16..6,
            seed in any::<u64>(),
        ) {
            let mut lat = open2(4, 6);
            for (idx, &occ) in occupied.iter().enumerate() {
                if occ {
                    let c = lat.coord_of(idx);
                    lat.set(c, k + 1).unwrap();
                }
            }
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let dist = SpeciesMix::Uniform.sampler(k).unwrap();
            fill_all_empty(&mut lat, &dist, &mut rng);
            for (idx, &occ) in occupied.iter().enumerate() {
                let v = lat.cells()[idx];
                if occ {
                    prop_assert_eq!(v, k + 1);
                } else {
                    prop_assert!((1..=k).contains(&v));
                }
            }
        }

        #[test]
        fn prop_drop_adds_exactly_one_cell(
            col in 0usize..4,
            sticky in any::<bool>(),
            prefill in proptest::collection::vec(0u16..3, 12),
        ) {
            let mut lat = open2(3, 4);
            for (idx, &sp) in prefill.iter().enumerate() {
                let c = lat.coord_of(idx);
                lat.set(c, sp).unwrap();
            }
            let before = lat.mass();
            let placed = if sticky {
                drop_sticky(&mut lat, col, 1)
            } else {
                drop_straight(&mut lat, col, 1)
            };
            prop_assert_eq!(lat.mass(), before + usize::from(placed));
        }
    }
}
