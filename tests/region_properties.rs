//! Randomised edit sequences checked against a plain flood fill of the grid.
//!
//! Region connectivity (same region, or a chain of links) must match 4-way
//! connectivity of the free cells after every edit.

use region_grid::graph::DirectedGraph;
use region_grid::grid::DenseGrid;
use region_grid::{GridPos, NoPayload, RegionKey, RegionSystem};
use std::collections::VecDeque;

/// Component label of every free cell, `usize::MAX` for blocked cells.
fn flood_components(system: &RegionSystem<(), NoPayload>) -> DenseGrid<usize> {
    let extent = system.grid_extent();
    let mut labels = DenseGrid::new(extent, usize::MAX);
    let mut next = 0;
    for y in 0..extent.y {
        for x in 0..extent.x {
            let seed = GridPos::new(x, y);
            if system.occlusion_at(seed) || labels[seed] != usize::MAX {
                continue;
            }
            let mut queue = VecDeque::from([seed]);
            labels[seed] = next;
            while let Some(cell) = queue.pop_front() {
                for offset in GridPos::CARDINALS {
                    let n = cell.offset(offset);
                    if !system.occlusion_at(n) && labels[n] == usize::MAX {
                        labels[n] = next;
                        queue.push_back(n);
                    }
                }
            }
            next += 1;
        }
    }
    labels
}

fn random_cell(rng: &mut fastrand::Rng, extent: GridPos) -> GridPos {
    GridPos::new(rng.i32(0..extent.x), rng.i32(0..extent.y))
}

fn assert_matches_flood_fill(system: &RegionSystem<(), NoPayload>, rng: &mut fastrand::Rng, samples: usize) {
    if let Err(fault) = system.verify_partition() {
        panic!("partition is inconsistent: {fault}");
    }

    let labels = flood_components(system);
    let extent = system.grid_extent();
    for _ in 0..samples {
        let a = random_cell(rng, extent);
        let b = random_cell(rng, extent);
        let expected = labels[a] != usize::MAX && labels[a] == labels[b];
        assert_eq!(system.connected(a, b), expected, "connected({a:?}, {b:?})");
        assert_eq!(system.connected(b, a), expected, "connected is symmetric");
        if system.same_region(a, b) {
            assert!(expected, "same region implies connected for {a:?}, {b:?}");
        }
    }
}

fn assert_links_are_mutual(system: &RegionSystem<(), NoPayload>) {
    let index = system.link_index();
    for region in system.regions().values() {
        for link in region.links() {
            let other = index
                .other_side(link, region.key())
                .unwrap_or_else(|| panic!("link {link} of {:?} has no other side", region.key()));
            let other_region = system.region(other).expect("other side must be a live region");
            assert!(other_region.links().contains(link), "link {link} is one-sided");
        }
    }
}

#[test]
fn test_random_edits_match_flood_fill() {
    let mut system = RegionSystem::new(GridPos::new(32, 32), GridPos::new(8, 8), NoPayload).unwrap();
    let mut rng = fastrand::Rng::with_seed(42); // Deterministic
    let extent = system.grid_extent();

    for edit in 1..=1500 {
        let pos = random_cell(&mut rng, extent);
        let occluded = rng.f32() < 0.6;
        system.set_occlusion(pos, occluded).unwrap();

        if edit % 100 == 0 {
            assert_matches_flood_fill(&system, &mut rng, 60);
            assert_links_are_mutual(&system);
        }
    }
}

#[test]
fn test_non_square_chunks() {
    let mut system = RegionSystem::new(GridPos::new(24, 12), GridPos::new(6, 4), NoPayload).unwrap();
    let mut rng = fastrand::Rng::with_seed(7);
    let extent = system.grid_extent();

    for edit in 1..=600 {
        let pos = random_cell(&mut rng, extent);
        system.set_occlusion(pos, rng.bool()).unwrap();
        if edit % 50 == 0 {
            assert_matches_flood_fill(&system, &mut rng, 40);
        }
    }
}

#[test]
fn test_clearing_everything_restores_one_region_per_chunk() {
    let mut system = RegionSystem::new(GridPos::new(16, 16), GridPos::new(4, 4), NoPayload).unwrap();
    let mut rng = fastrand::Rng::with_seed(1234);
    let extent = system.grid_extent();
    for _ in 0..400 {
        system.set_occlusion(random_cell(&mut rng, extent), true).unwrap();
    }

    for y in 0..extent.y {
        for x in 0..extent.x {
            system.set_occlusion(GridPos::new(x, y), false).unwrap();
        }
    }

    assert_eq!(system.regions().len(), 16);
    assert_eq!(system.stats().largest_region, 16);
    // 3 vertical and 3 horizontal chunk seams, 4 chunk pairs each.
    assert_eq!(system.link_index().len(), 24);
    assert!(system.connected(GridPos::new(0, 0), GridPos::new(15, 15)));
    assert!(system.verify_partition().is_ok());
}

#[test]
fn test_region_graph_is_undirected_in_practice() {
    let mut system = RegionSystem::new(GridPos::new(16, 16), GridPos::new(4, 4), NoPayload).unwrap();
    let mut rng = fastrand::Rng::with_seed(99);
    let extent = system.grid_extent();
    for _ in 0..200 {
        system.set_occlusion(random_cell(&mut rng, extent), true).unwrap();
    }

    let graph = system.region_graph();
    let keys: Vec<RegionKey> = graph.nodes().collect();
    assert_eq!(keys.len(), system.regions().len());
    for key in &keys {
        for edge in graph.outgoing_edges(key) {
            assert_eq!(edge.data, 1.0);
            assert!(
                graph.contains_edge(&edge.destination, key),
                "{:?} -> {:?} has no reverse edge",
                key,
                edge.destination
            );
        }
    }
}
