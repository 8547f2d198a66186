use super::*;
use crate::error::{ConfigError, RegionError};
use crate::graph::DirectedGraph;
use crate::grid::{GridPos, OcclusionGrid, RegionKey};
use std::cell::Cell;

fn p(x: i32, y: i32) -> GridPos {
    GridPos::new(x, y)
}

fn key(x: i32, y: i32) -> RegionKey {
    RegionKey(GridPos::new(x, y))
}

/// Build a system from text rows (first row is y = 0, `#` is blocked).
fn create_test_system(rows: &[&str], chunk: GridPos) -> RegionSystem<(), NoPayload> {
    RegionSystem::from_occlusion(OcclusionGrid::from_rows(rows), chunk, NoPayload)
        .expect("test grid geometry must be valid")
}

fn open_8x8() -> RegionSystem<(), NoPayload> {
    RegionSystem::new(p(8, 8), p(4, 4), NoPayload).unwrap()
}

fn assert_consistent<P, G: PayloadGenerator<P>>(system: &RegionSystem<P, G>) {
    if let Err(fault) = system.verify_partition() {
        panic!("partition is inconsistent: {fault}");
    }
}

fn chunk_keys<P, G: PayloadGenerator<P>>(system: &RegionSystem<P, G>, chunk: ChunkId) -> Vec<RegionKey> {
    system.regions_in_chunk(chunk).map(|r| r.key()).collect()
}

/// Payload that tracks the region size, counting hook calls.
#[derive(Default)]
struct SizePayload {
    created: Cell<usize>,
    merged: Cell<usize>,
}

impl PayloadGenerator<usize> for SizePayload {
    fn generate_new(&self, _key: RegionKey, cell_count: usize) -> usize {
        self.created.set(self.created.get() + 1);
        cell_count
    }

    fn generate_on_merge(&self, a: &Region<usize>, b: &Region<usize>) -> usize {
        self.merged.set(self.merged.get() + 1);
        a.payload() + b.payload()
    }
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn test_open_grid_has_one_region_per_chunk() {
    let system = open_8x8();
    assert_eq!(system.chunk_count(), 4);
    assert_eq!(system.regions().len(), 4);
    for k in [key(0, 0), key(0, 4), key(4, 0), key(4, 4)] {
        let region = system.region(k).expect("chunk origin seeds each region");
        assert_eq!(region.cell_count(), 16);
    }
    assert_eq!(system.link_index().len(), 4);

    let links = system.region(key(0, 0)).unwrap().links();
    assert_eq!(
        links,
        &[
            RegionLink::new(p(0, 4), LinkDirection::AlongRow, 4),
            RegionLink::new(p(4, 0), LinkDirection::AlongColumn, 4),
        ]
    );
    assert_consistent(&system);
}

#[test]
fn test_invalid_geometry_is_rejected() {
    assert!(matches!(
        RegionSystem::new(p(10, 8), p(4, 4), NoPayload),
        Err(ConfigError::ChunkMismatch { .. })
    ));
    assert!(matches!(
        RegionSystem::new(p(8, 8), p(0, 4), NoPayload),
        Err(ConfigError::InvalidChunkExtent { .. })
    ));
    assert!(matches!(
        RegionSystem::new(p(0, 8), p(4, 4), NoPayload),
        Err(ConfigError::InvalidGridExtent { .. })
    ));
}

#[test]
fn test_blocked_cells_have_no_region() {
    let system = create_test_system(&[".#..", "....", "....", "...."], p(4, 4));
    assert_eq!(system.region_key(p(1, 0)), RegionKey::NONE);
    assert!(!system.same_region(p(1, 0), p(1, 0)));
    assert!(!system.connected(p(1, 0), p(0, 0)));
    assert!(system.occlusion_at(p(1, 0)));
    assert!(system.occlusion_at(p(-1, 0)), "outside the grid counts as blocked");
    assert_eq!(system.region(key(0, 0)).unwrap().cell_count(), 15);
}

// ============================================================================
// Edits
// ============================================================================

#[test]
fn test_block_splits_only_owning_chunk() {
    let mut system = create_test_system(
        &[
            ".#......",
            ".#......",
            "........",
            ".#......",
            "........",
            "........",
            "........",
            "........",
        ],
        p(4, 4),
    );
    assert_eq!(system.regions().len(), 4);

    assert_eq!(system.set_occlusion(p(1, 2), true).unwrap(), true);
    assert_eq!(system.regions().len(), 5);
    assert_eq!(chunk_keys(&system, ChunkId::new(0, 0)), vec![key(0, 0), key(2, 0)]);
    assert_eq!(system.region(key(0, 0)).unwrap().cell_count(), 4);
    assert_eq!(system.region(key(2, 0)).unwrap().cell_count(), 8);
    for other in [ChunkId::new(1, 0), ChunkId::new(0, 1), ChunkId::new(1, 1)] {
        assert_eq!(chunk_keys(&system, other).len(), 1, "chunk {:?} untouched", other);
    }

    assert!(!system.same_region(p(0, 0), p(3, 0)));
    assert!(system.connected(p(0, 0), p(3, 0)), "joined through the chunk above");

    let left = system.region(key(0, 0)).unwrap().links();
    assert_eq!(left, &[RegionLink::new(p(0, 4), LinkDirection::AlongRow, 1)]);
    let right = system.region(key(2, 0)).unwrap().links();
    assert_eq!(
        right,
        &[
            RegionLink::new(p(2, 4), LinkDirection::AlongRow, 2),
            RegionLink::new(p(4, 0), LinkDirection::AlongColumn, 4),
        ]
    );
    assert_consistent(&system);
}

#[test]
fn test_set_occlusion_is_idempotent() {
    let mut system = open_8x8();
    assert_eq!(system.set_occlusion(p(2, 2), false).unwrap(), false);

    assert!(system.set_occlusion(p(2, 2), true).unwrap());
    let before = system.stats();
    assert!(!system.set_occlusion(p(2, 2), true).unwrap());
    assert_eq!(system.stats(), before);
}

#[test]
fn test_out_of_bounds_edit_is_an_error() {
    let mut system = open_8x8();
    assert!(matches!(
        system.set_occlusion(p(8, 0), true),
        Err(RegionError::OutOfBounds(pos)) if pos == p(8, 0)
    ));
    assert!(matches!(
        system.set_occlusion(p(0, -1), false),
        Err(RegionError::OutOfBounds(_))
    ));
    assert_eq!(system.stats().edits_applied, 0);
}

#[test]
fn test_unblock_joins_smaller_under_larger() {
    let mut system = create_test_system(&[".#."], p(3, 1));
    assert_eq!(system.regions().len(), 2);

    system.set_occlusion(p(1, 0), false).unwrap();
    // Singleton ties with (0,0) and keeps the neighbour's key, then absorbs (2,0).
    assert_eq!(system.regions().len(), 1);
    let region = system.region(key(0, 0)).expect("merged region keeps key (0,0)");
    assert_eq!(region.cell_count(), 3);
    assert!(system.same_region(p(0, 0), p(2, 0)));
    assert_consistent(&system);
}

#[test]
fn test_unblock_does_not_merge_across_chunks() {
    let mut system = create_test_system(&["...#....", "........", "........", "........"], p(4, 4));
    system.set_occlusion(p(3, 0), false).unwrap();

    assert_eq!(system.regions().len(), 2);
    assert!(!system.same_region(p(3, 0), p(4, 0)));
    assert!(system.connected(p(3, 0), p(4, 0)));
    assert_eq!(
        system.region(key(0, 0)).unwrap().links(),
        &[RegionLink::new(p(4, 0), LinkDirection::AlongColumn, 4)]
    );
    assert_consistent(&system);
}

#[test]
fn test_wall_disconnects_and_hole_reconnects() {
    let mut system = open_8x8();
    let wall: Vec<_> = (0..8).map(|y| (p(3, y), true)).collect();
    assert_eq!(system.set_occlusion_batch(wall).unwrap(), 8);

    assert!(!system.connected(p(0, 0), p(7, 7)));
    assert!(!system.connected(p(7, 7), p(0, 0)));
    assert!(system.connected(p(0, 0), p(2, 7)));
    assert_consistent(&system);

    system.set_occlusion(p(3, 5), false).unwrap();
    let merged = system.region(key(0, 4)).expect("hole joins the 3x4 region of its chunk");
    assert_eq!(merged.cell_count(), 13);
    assert_eq!(
        merged.links(),
        &[
            RegionLink::new(p(0, 4), LinkDirection::AlongRow, 3),
            RegionLink::new(p(4, 5), LinkDirection::AlongColumn, 1),
        ]
    );
    assert!(system.connected(p(0, 0), p(7, 7)));
    assert!(system.connected(p(7, 7), p(0, 0)));
    assert_consistent(&system);
}

#[test]
fn test_block_then_unblock_preserves_connectivity() {
    let mut system = create_test_system(
        &[
            "........",
            "..####..",
            "........",
            "...#....",
            "....#...",
            "........",
            ".####...",
            "........",
        ],
        p(4, 4),
    );
    let cells: Vec<GridPos> = (0..8).flat_map(|y| (0..8).map(move |x| p(x, y))).collect();
    let snapshot = |system: &RegionSystem<(), NoPayload>| -> Vec<bool> {
        cells
            .iter()
            .flat_map(|&a| cells.iter().map(move |&b| (a, b)))
            .map(|(a, b)| system.connected(a, b))
            .collect()
    };

    let before = snapshot(&system);
    system.set_occlusion(p(6, 5), true).unwrap();
    system.set_occlusion(p(6, 5), false).unwrap();
    assert_eq!(snapshot(&system), before);
    assert_consistent(&system);
}

#[test]
fn test_force_relink_keeps_links() {
    let mut system = open_8x8();
    let before: Vec<_> = system.region(key(4, 4)).unwrap().links().to_vec();
    system.force_relink(key(4, 4));
    assert_eq!(system.region(key(4, 4)).unwrap().links(), before.as_slice());
    // Unknown keys are ignored.
    system.force_relink(key(1, 1));
    assert_consistent(&system);
}

// ============================================================================
// Payloads, graph and stats
// ============================================================================

#[test]
fn test_payload_hooks_follow_merges() {
    let occlusion = OcclusionGrid::from_rows(&["..#.", "..#.", "###.", "...."]);
    let mut system = RegionSystem::from_occlusion(occlusion, p(4, 4), SizePayload::default()).unwrap();
    // Top-left 2x2 pocket and the L-shaped rest.
    assert_eq!(system.regions().len(), 2);
    assert_eq!(system.generator().created.get(), 2);

    system.set_occlusion(p(2, 1), false).unwrap();
    system.set_occlusion(p(2, 2), false).unwrap();
    assert_eq!(system.regions().len(), 1);
    assert!(system.generator().merged.get() >= 2);
    for region in system.regions().values() {
        assert_eq!(*region.payload(), region.cell_count());
    }
    // The pocket (5 cells with the first freed cell) is absorbed by the larger region.
    assert_eq!(system.region(key(0, 3)).unwrap().cell_count(), 13);
    assert_eq!(system.generator().created.get(), 4);
    assert_consistent(&system);
}

#[test]
fn test_region_graph_edges() {
    let system = open_8x8();
    let graph = system.region_graph();
    assert_eq!(graph.node_count(), 4);
    assert_eq!(graph.nodes().count(), 4);

    let neighbours: Vec<_> = graph.outgoing_edges(&key(0, 0)).map(|e| e.destination).collect();
    assert_eq!(neighbours, vec![key(0, 4), key(4, 0)]);
    assert!(graph.outgoing_edges(&key(0, 0)).all(|e| e.data == 1.0));
    assert!(!graph.contains_edge(&key(0, 0), &key(4, 4)), "no diagonal links");
    assert_eq!(graph.outgoing_edges(&RegionKey::NONE).count(), 0);
}

#[test]
fn test_stats_serialize() {
    let mut system = open_8x8();
    system.set_occlusion(p(0, 0), true).unwrap();
    let stats = system.stats();
    assert_eq!(stats.region_count, 4);
    assert_eq!(stats.occluded_cells, 1);
    assert_eq!(stats.free_cells, 63);
    assert_eq!(stats.largest_region, 16);

    let json = serde_json::to_value(&stats).unwrap();
    assert_eq!(json["edits_applied"], 1);
    assert_eq!(json["link_count"], 4);
}
