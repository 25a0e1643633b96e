//! Elimination rules: zero out clusters that qualify for removal.

use crate::cluster::{label_components, ComponentLabeling, Grouping};
use crate::lattice::{Lattice, Species, EMPTY};
use crate::topology::Topology;

/// Outcome of one elimination pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Eliminated {
    /// Cells set to empty.
    pub cells: usize,
    /// Components removed.
    pub clusters: usize,
}

/// Zero every component whose cell count exceeds `threshold`.
///
/// Components are disjoint, so processing order cannot affect the
/// result. Returns the removal counts.
pub fn threshold_eliminate(
    lattice: &mut Lattice,
    labeling: &ComponentLabeling,
    threshold: usize,
) -> Eliminated {
    let doomed: Vec<bool> = labeling.sizes().iter().map(|&s| s > threshold).collect();
    let mut removed = Eliminated {
        cells: 0,
        clusters: doomed.iter().filter(|&&d| d).count(),
    };
    let cells = lattice.cells_mut();
    for (idx, &id) in labeling.labels.iter().enumerate() {
        if id != 0 && doomed[(id - 1) as usize] {
            cells[idx] = EMPTY;
            removed.cells += 1;
        }
    }
    removed
}

/// Boundary-invasion removal (percolation family).
///
/// Builds a shadow copy with every empty cell set to `victim`, labels
/// it, and clears the real cells of every victim-colored shadow
/// component that touches an open face. The invasion therefore eats the
/// maximal region reachable from the boundary through victim-colored or
/// already-empty cells; isolated empty pockets belong to other shadow
/// components and their surroundings are left untouched.
///
/// Returns the number of cells that were nonzero before the pass.
pub fn invasion_eliminate(lattice: &mut Lattice, topology: &Topology, victim: Species) -> usize {
    let mut shadow = lattice.clone();
    for cell in shadow.cells_mut() {
        if *cell == EMPTY {
            *cell = victim;
        }
    }
    let labeling = label_components(&shadow, topology, Grouping::BySpecies);

    let mut invaded = vec![false; labeling.count as usize];
    for (idx, &id) in labeling.labels.iter().enumerate() {
        if shadow.cells()[idx] == victim && lattice.on_open_face(idx) {
            invaded[(id - 1) as usize] = true;
        }
    }

    let mut removed = 0;
    let cells = lattice.cells_mut();
    for (idx, &id) in labeling.labels.iter().enumerate() {
        if invaded[(id - 1) as usize] {
            if cells[idx] != EMPTY {
                removed += 1;
            }
            cells[idx] = EMPTY;
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::BoundaryMode;
    use crate::topology::Connectivity;
    use proptest::prelude::*;

    fn lattice_from(rows: &[&[Species]]) -> Lattice {
        let mut lat = Lattice::new(&[rows.len(), rows[0].len()], &[BoundaryMode::Open; 2]).unwrap();
        for (r, row) in rows.iter().enumerate() {
            for (c, &sp) in row.iter().enumerate() {
                lat.set([r as isize, c as isize, 0, 0], sp).unwrap();
            }
        }
        lat
    }

    fn rows_of(lat: &Lattice) -> Vec<Vec<Species>> {
        lat.cells()
            .chunks(lat.num_columns())
            .map(<[Species]>::to_vec)
            .collect()
    }

    #[test]
    fn threshold_removes_pairs_keeps_singletons() {
        let mut lat = lattice_from(&[&[1, 1, 2], &[0, 0, 0]]);
        let topo = Topology::new(Connectivity::Square, &lat).unwrap();
        let labeling = label_components(&lat, &topo, Grouping::BySpecies);
        let removed = threshold_eliminate(&mut lat, &labeling, 1);
        assert_eq!(removed, Eliminated { cells: 2, clusters: 1 });
        assert_eq!(rows_of(&lat), vec![vec![0, 0, 2], vec![0, 0, 0]]);
    }

    #[test]
    fn higher_threshold_spares_small_clusters() {
        let mut lat = lattice_from(&[&[1, 1, 0], &[2, 2, 2]]);
        let topo = Topology::new(Connectivity::Square, &lat).unwrap();
        let labeling = label_components(&lat, &topo, Grouping::BySpecies);
        let removed = threshold_eliminate(&mut lat, &labeling, 2);
        assert_eq!(removed, Eliminated { cells: 3, clusters: 1 });
        assert_eq!(rows_of(&lat), vec![vec![1, 1, 0], vec![0, 0, 0]]);
    }

    #[test]
    fn invasion_eats_boundary_run_only() {
        // margin of zeros, a victim run touching it, and a victim cell
        // shielded behind species 2
        let mut lat = lattice_from(&[
            &[0, 0, 0, 0, 0],
            &[0, 1, 2, 2, 0],
            &[0, 1, 2, 1, 0],
            &[0, 2, 2, 2, 0],
            &[0, 0, 0, 0, 0],
        ]);
        let topo = Topology::new(Connectivity::Square, &lat).unwrap();
        let removed = invasion_eliminate(&mut lat, &topo, 1);
        // the 1s at (1,1) and (2,1) touch the left margin; the 1 at
        // (2,3) reaches the right margin through the empty (2,4)
        assert_eq!(removed, 3);
        assert_eq!(
            rows_of(&lat),
            vec![
                vec![0, 0, 0, 0, 0],
                vec![0, 0, 2, 2, 0],
                vec![0, 0, 2, 0, 0],
                vec![0, 2, 2, 2, 0],
                vec![0, 0, 0, 0, 0],
            ]
        );
    }

    #[test]
    fn invasion_leaves_isolated_pocket_untouched() {
        // empty pocket at the center, fenced by species 2; victim 1 is
        // absent, so the invasion must remove nothing and the fence must
        // survive
        let mut lat = lattice_from(&[
            &[0, 0, 0, 0, 0],
            &[0, 2, 2, 2, 0],
            &[0, 2, 0, 2, 0],
            &[0, 2, 2, 2, 0],
            &[0, 0, 0, 0, 0],
        ]);
        let before = lat.clone();
        let topo = Topology::new(Connectivity::Square, &lat).unwrap();
        let removed = invasion_eliminate(&mut lat, &topo, 1);
        assert_eq!(removed, 0);
        assert_eq!(lat, before);
    }

    #[test]
    fn invasion_1d_removes_both_boundary_runs() {
        let mut lat = Lattice::new(&[7], &[BoundaryMode::Open]).unwrap();
        for (i, &sp) in [0, 1, 2, 1, 2, 1, 0].iter().enumerate() {
            lat.set([i as isize, 0, 0, 0], sp).unwrap();
        }
        let topo = Topology::new(Connectivity::Square, &lat).unwrap();
        let removed = invasion_eliminate(&mut lat, &topo, 1);
        assert_eq!(removed, 2);
        assert_eq!(lat.cells(), &[0, 0, 2, 1, 2, 0, 0]);
    }

    fn arb_lattice() -> impl Strategy<Value = Lattice> {
        proptest::collection::vec(0u16..4, 25).prop_map(|cells| {
            let mut lat = Lattice::new(&[5, 5], &[BoundaryMode::Open; 2]).unwrap();
            for (idx, &sp) in cells.iter().enumerate() {
                let c = lat.coord_of(idx);
                lat.set(c, sp).unwrap();
            }
            lat
        })
    }

    proptest! {
        #[test]
        fn prop_no_large_cluster_survives_threshold(lat in arb_lattice(), threshold in 1usize..4) {
            let mut lat = lat;
            let topo = Topology::new(Connectivity::Square, &lat).unwrap();
            let labeling = label_components(&lat, &topo, Grouping::BySpecies);
            threshold_eliminate(&mut lat, &labeling, threshold);
            let after = label_components(&lat, &topo, Grouping::BySpecies);
            for size in after.sizes() {
                prop_assert!(size <= threshold);
            }
        }

        #[test]
        fn prop_elimination_never_grows_mass(lat in arb_lattice()) {
            let mut lat = lat;
            let before = lat.mass();
            let topo = Topology::new(Connectivity::Square, &lat).unwrap();
            let labeling = label_components(&lat, &topo, Grouping::BySpecies);
            let removed = threshold_eliminate(&mut lat, &labeling, 1);
            prop_assert_eq!(lat.mass(), before - removed.cells);
        }

        #[test]
        fn prop_invasion_only_removes_victim_cells(lat in arb_lattice(), victim in 1u16..4) {
            let mut lat = lat;
            let before = lat.clone();
            let topo = Topology::new(Connectivity::Square, &lat).unwrap();
            invasion_eliminate(&mut lat, &topo, victim);
            for idx in 0..lat.len() {
                let (was, now) = (before.cells()[idx], lat.cells()[idx]);
                if was != now {
                    prop_assert_eq!(was, victim);
                    prop_assert_eq!(now, EMPTY);
                }
            }
        }
    }
}
