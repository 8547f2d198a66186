//! Region system: owns the occlusion grid and keeps the region partition,
//! union-find keys and link index consistent across edits.
//!
//! # Edits
//!
//! - **Block**: the owning chunk is flood-filled again from scratch. Regions of
//!   the four neighbouring chunks and of the four neighbouring cells are queued
//!   for relink.
//! - **Unblock**: the freed cell becomes a one-cell region and is joined, by
//!   size, with each free neighbour inside the same chunk. Neighbours across a
//!   chunk border are only queued for relink, so regions never leave their chunk.
//!
//! Every edit ends with a synchronous relink of all queued regions.

use region_grid_macros::profile;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, info, trace};

use super::link_index::LinkIndex;
use super::region_graph::RegionGraph;
use super::types::{ChunkId, LinkDirection, LinkList, PayloadGenerator, Region, RegionLink};
use crate::config::{validate_extents, RegionSystemConfig};
use crate::error::{ConfigError, PartitionFault, RegionError};
use crate::graph::{astar_search, expand_unbounded, GridConnectivity, GridGraph};
use crate::grid::{DenseGrid, GridPos, OcclusionGrid, RegionKey, UnionFind2D};
use crate::profile_log;

/// Snapshot of partition size, for logging and tests.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RegionStats {
    pub grid_width: i32,
    pub grid_height: i32,
    pub chunk_count: usize,
    pub region_count: usize,
    pub link_count: usize,
    pub occluded_cells: usize,
    pub free_cells: usize,
    pub largest_region: usize,
    pub edits_applied: u64,
}

pub struct RegionSystem<P, G> {
    grid_extent: GridPos,
    chunk_extent: GridPos,
    chunk_counts: GridPos,

    occlusion: OcclusionGrid,
    keys: UnionFind2D,
    regions: FxHashMap<RegionKey, Region<P>>,
    chunk_regions: DenseGrid<BTreeSet<RegionKey>>,
    links: LinkIndex,
    /// Regions whose links are stale. Drained at the end of every edit.
    pending: BTreeSet<RegionKey>,

    grid_graph: GridGraph,
    generator: G,
    edits_applied: u64,
}

impl<P, G: PayloadGenerator<P>> RegionSystem<P, G> {
    /// Fully free grid of `grid_extent` cells.
    pub fn new(grid_extent: GridPos, chunk_extent: GridPos, generator: G) -> Result<Self, ConfigError> {
        validate_extents(grid_extent, chunk_extent)?;
        Self::from_occlusion(OcclusionGrid::new(grid_extent), chunk_extent, generator)
    }

    pub fn from_config(config: &RegionSystemConfig, generator: G) -> Result<Self, ConfigError> {
        config.validate()?;
        Self::new(config.grid_extent(), config.chunk_extent(), generator)
    }

    /// Partition an existing occlusion grid.
    pub fn from_occlusion(
        occlusion: OcclusionGrid,
        chunk_extent: GridPos,
        generator: G,
    ) -> Result<Self, ConfigError> {
        let grid_extent = occlusion.extent();
        let chunk_counts = validate_extents(grid_extent, chunk_extent)?;

        let mut system = Self {
            grid_extent,
            chunk_extent,
            chunk_counts,
            keys: UnionFind2D::new(grid_extent),
            regions: FxHashMap::default(),
            chunk_regions: DenseGrid::new(chunk_counts, BTreeSet::new()),
            links: LinkIndex::new(),
            pending: BTreeSet::new(),
            grid_graph: GridGraph::new(grid_extent, GridConnectivity::FourDirections),
            occlusion,
            generator,
            edits_applied: 0,
        };
        system.initialize();
        Ok(system)
    }

    fn initialize(&mut self) {
        for cx in 0..self.chunk_counts.x {
            for cy in 0..self.chunk_counts.y {
                self.recompute_chunk(ChunkId::new(cx, cy));
            }
        }
        self.recalculate_pending_links();

        info!(
            "[REGIONS] Initialized {}x{} grid in {} chunks of {}x{}: {} regions, {} links",
            self.grid_extent.x,
            self.grid_extent.y,
            self.chunk_count(),
            self.chunk_extent.x,
            self.chunk_extent.y,
            self.regions.len(),
            self.links.len()
        );
    }

    // ========================================================================
    // Edits
    // ========================================================================

    /// Block (`true`) or free (`false`) one cell.
    ///
    /// Returns `Ok(false)` when the cell already had that state.
    pub fn set_occlusion(&mut self, pos: GridPos, occluded: bool) -> Result<bool, RegionError> {
        if !self.occlusion.contains(pos) {
            return Err(RegionError::OutOfBounds(pos));
        }
        if self.occlusion.is_occluded(pos) == occluded {
            return Ok(false);
        }

        self.occlusion.set(pos, occluded);
        if occluded {
            let chunk = self.chunk_of(pos);
            self.recompute_chunk(chunk);
            // Neighbours may sit in other chunks and must learn about the split.
            for offset in GridPos::CARDINALS {
                self.schedule_cell(pos.offset(offset));
            }
            debug!(
                "[REGIONS] Blocked {:?}: chunk {:?} now has {} regions",
                pos,
                chunk.0,
                self.chunk_regions[chunk.0].len()
            );
        } else {
            self.join_regions_around(pos);
            debug!(
                "[REGIONS] Freed {:?}: cell joined region {:?}",
                pos,
                self.keys.peek(pos).pos()
            );
        }
        self.recalculate_pending_links();

        self.edits_applied += 1;
        profile_log!(
            self.edits_applied,
            "[PERF] {} edits applied, {} regions, {} links",
            self.edits_applied,
            self.regions.len(),
            self.links.len()
        );
        Ok(true)
    }

    /// Apply several edits in order. Returns how many changed a cell.
    ///
    /// Stops at the first out-of-bounds cell; earlier edits stay applied.
    pub fn set_occlusion_batch<I>(&mut self, edits: I) -> Result<usize, RegionError>
    where
        I: IntoIterator<Item = (GridPos, bool)>,
    {
        let mut changed = 0;
        for (pos, occluded) in edits {
            if self.set_occlusion(pos, occluded)? {
                changed += 1;
            }
        }
        Ok(changed)
    }

    /// Recompute the links of `key` immediately.
    pub fn force_relink(&mut self, key: RegionKey) {
        info!("[LINKS] Forced link recalculation for region {:?}", key.pos());
        self.pending.insert(key);
        self.recalculate_pending_links();
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Occlusion of `pos`. Cells outside the grid count as occluded.
    #[inline]
    pub fn occlusion_at(&self, pos: GridPos) -> bool {
        self.occlusion.is_occluded(pos)
    }

    /// Key of the region containing `pos`, or [`RegionKey::NONE`].
    #[inline]
    pub fn region_key(&self, pos: GridPos) -> RegionKey {
        self.keys.peek(pos)
    }

    /// Both cells are free and in the same region.
    pub fn same_region(&self, a: GridPos, b: GridPos) -> bool {
        let key = self.keys.peek(a);
        key.is_some() && key == self.keys.peek(b)
    }

    /// Both cells are free and a chain of linked regions joins them.
    pub fn connected(&self, a: GridPos, b: GridPos) -> bool {
        let key_a = self.keys.peek(a);
        let key_b = self.keys.peek(b);
        if key_a.is_none() || key_b.is_none() {
            return false;
        }
        if key_a == key_b {
            return true;
        }

        let graph = self.region_graph();
        let result = astar_search(
            &graph,
            key_a,
            |key| *key == key_b,
            |edge| edge.data,
            |_| 0.0,
            |_| true,
        );
        matches!(result, Ok(Some(_)))
    }

    // ========================================================================
    // Read surface
    // ========================================================================

    #[inline]
    pub fn grid_extent(&self) -> GridPos {
        self.grid_extent
    }

    #[inline]
    pub fn chunk_extent(&self) -> GridPos {
        self.chunk_extent
    }

    /// Chunks along each axis.
    #[inline]
    pub fn chunk_counts(&self) -> GridPos {
        self.chunk_counts
    }

    pub fn chunk_count(&self) -> usize {
        (self.chunk_counts.x as usize) * (self.chunk_counts.y as usize)
    }

    #[inline]
    pub fn chunk_of(&self, pos: GridPos) -> ChunkId {
        ChunkId::new(pos.x / self.chunk_extent.x, pos.y / self.chunk_extent.y)
    }

    pub fn occlusion(&self) -> &OcclusionGrid {
        &self.occlusion
    }

    pub fn union_find(&self) -> &UnionFind2D {
        &self.keys
    }

    pub fn regions(&self) -> &FxHashMap<RegionKey, Region<P>> {
        &self.regions
    }

    pub fn region(&self, key: RegionKey) -> Option<&Region<P>> {
        self.regions.get(&key)
    }

    /// Regions of one chunk, ordered by key. Empty for chunks outside the grid.
    pub fn regions_in_chunk(&self, chunk: ChunkId) -> impl Iterator<Item = &Region<P>> + '_ {
        self.chunk_regions
            .get(chunk.0)
            .into_iter()
            .flat_map(|keys| keys.iter())
            .filter_map(|key| self.regions.get(key))
    }

    pub fn link_index(&self) -> &LinkIndex {
        &self.links
    }

    pub fn region_graph(&self) -> RegionGraph<'_, P> {
        RegionGraph::new(&self.regions, &self.links)
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn stats(&self) -> RegionStats {
        let occluded_cells = self.occlusion.occluded_count();
        RegionStats {
            grid_width: self.grid_extent.x,
            grid_height: self.grid_extent.y,
            chunk_count: self.chunk_count(),
            region_count: self.regions.len(),
            link_count: self.links.len(),
            occluded_cells,
            free_cells: self.occlusion.cell_count() - occluded_cells,
            largest_region: self
                .regions
                .values()
                .map(|r| r.cell_count())
                .max()
                .unwrap_or(0),
            edits_applied: self.edits_applied,
        }
    }

    /// Full consistency check of keys, cell counts, chunk containment and links.
    ///
    /// Walks every cell, so this is meant for tests and soak runs.
    pub fn verify_partition(&self) -> Result<(), PartitionFault> {
        let mut owned: FxHashMap<RegionKey, usize> = FxHashMap::default();
        for y in 0..self.grid_extent.y {
            for x in 0..self.grid_extent.x {
                let cell = GridPos::new(x, y);
                let key = self.keys.peek(cell);
                if self.occlusion.is_occluded(cell) {
                    if key.is_some() {
                        return Err(PartitionFault::KeyedOccludedCell(cell, key.pos()));
                    }
                    continue;
                }
                if key.is_none() {
                    return Err(PartitionFault::UnkeyedFreeCell(cell));
                }
                if !self.regions.contains_key(&key) {
                    return Err(PartitionFault::UnknownRegion {
                        cell,
                        key: key.pos(),
                    });
                }
                if self.chunk_of(cell) != self.chunk_of(key.pos()) {
                    return Err(PartitionFault::RegionCrossesChunk {
                        cell,
                        key: key.pos(),
                    });
                }
                *owned.entry(key).or_default() += 1;
            }
        }

        for (key, region) in &self.regions {
            let actual = owned.get(key).copied().unwrap_or(0);
            if actual != region.cell_count() {
                return Err(PartitionFault::CellCountMismatch {
                    key: key.pos(),
                    recorded: region.cell_count(),
                    actual,
                });
            }
        }

        for (link, keys) in self.links.iter() {
            if keys.len() != 2 {
                return Err(PartitionFault::UnpairedLink {
                    link: link.to_string(),
                    count: keys.len(),
                });
            }
        }
        Ok(())
    }

    // ========================================================================
    // Region bookkeeping
    // ========================================================================

    fn schedule_cell(&mut self, pos: GridPos) {
        let key = self.keys.find(pos);
        if key.is_some() {
            self.pending.insert(key);
        }
    }

    fn register_region(&mut self, region: Region<P>) {
        let key = region.key();
        let chunk = self.chunk_of(key.pos());
        self.chunk_regions[chunk.0].insert(key);
        self.regions.insert(key, region);
    }

    /// Drop a region and its links. Regions on the far side of its links are
    /// queued for relink.
    fn remove_region(&mut self, key: RegionKey) -> Option<Region<P>> {
        let region = self.regions.remove(&key)?;
        self.pending
            .extend(self.links.adjacent_keys(key, region.links()));
        self.links.remove_all_for(key, region.links());
        let chunk = self.chunk_of(key.pos());
        self.chunk_regions[chunk.0].remove(&key);
        Some(region)
    }

    fn chunk_cells(&self, chunk: ChunkId) -> impl Iterator<Item = GridPos> {
        let origin = chunk.origin(self.chunk_extent);
        let extent = self.chunk_extent;
        (0..extent.x).flat_map(move |cx| {
            (0..extent.y).map(move |cy| GridPos::new(origin.x + cx, origin.y + cy))
        })
    }

    fn clear_chunk(&mut self, chunk: ChunkId) {
        let stale: Vec<RegionKey> = self.chunk_regions[chunk.0].iter().copied().collect();
        for key in stale {
            self.remove_region(key);
        }
        for cell in self.chunk_cells(chunk) {
            self.keys.clear(cell);
        }
    }

    /// Flood-fill every free component of `chunk` into a fresh region.
    #[profile]
    fn recompute_chunk(&mut self, chunk: ChunkId) {
        self.clear_chunk(chunk);

        let cells: Vec<GridPos> = self.chunk_cells(chunk).collect();
        for cell in cells {
            if self.occlusion.is_occluded(cell) || self.keys.has_key(cell) {
                continue;
            }
            self.create_region_from(cell, chunk);
        }

        for offset in GridPos::CARDINALS {
            let neighbour = chunk.0.offset(offset);
            if let Some(keys) = self.chunk_regions.get(neighbour) {
                self.pending.extend(keys.iter().copied());
            }
        }
        trace!(
            "[REGIONS] Chunk {:?} recomputed into {} regions",
            chunk.0,
            self.chunk_regions[chunk.0].len()
        );
    }

    fn create_region_from(&mut self, seed: GridPos, chunk: ChunkId) {
        let chunk_extent = self.chunk_extent;
        let occlusion = &self.occlusion;
        let cells: Vec<GridPos> = expand_unbounded(
            &self.grid_graph,
            seed,
            |edge| occlusion.is_free(edge.destination) && chunk.contains(edge.destination, chunk_extent),
            true,
        )
        .expect("flood fill seed must lie inside the grid")
        .collect();

        let key = RegionKey(seed);
        for &cell in &cells {
            self.keys.set(cell, key);
        }
        let region = Region::new(key, cells.len(), &self.generator);
        self.register_region(region);
        self.pending.insert(key);
    }

    /// Merge the regions of `a` and `b`, the smaller one under the larger one's key.
    fn join_regions(&mut self, a: GridPos, b: GridPos) {
        let key_a = self.keys.find(a);
        let key_b = self.keys.find(b);
        if key_a == key_b {
            return;
        }

        let region_a = self
            .remove_region(key_a)
            .expect("joined cell must belong to a registered region");
        let region_b = self
            .remove_region(key_b)
            .expect("joined cell must belong to a registered region");

        let union_key = if region_a.cell_count() <= region_b.cell_count() {
            self.keys.unite(key_a.pos(), key_b.pos());
            key_b
        } else {
            self.keys.unite(key_b.pos(), key_a.pos());
            key_a
        };

        let merged = Region::merged(union_key, &region_a, &region_b, &self.generator);
        self.register_region(merged);
        self.pending.insert(union_key);
    }

    fn join_regions_around(&mut self, pos: GridPos) {
        let key = RegionKey(pos);
        self.keys.set(pos, key);
        let singleton = Region::new(key, 1, &self.generator);
        self.register_region(singleton);
        self.pending.insert(key);

        let chunk = self.chunk_of(pos);
        for offset in GridPos::CARDINALS {
            let neighbour = pos.offset(offset);
            if chunk.contains(neighbour, self.chunk_extent) && self.occlusion.is_free(neighbour) {
                self.join_regions(pos, neighbour);
            }
            // Across a chunk border the neighbour keeps its own region but gains a link.
            self.schedule_cell(neighbour);
        }
    }

    // ========================================================================
    // Links
    // ========================================================================

    /// Relink every queued region that still exists.
    #[profile]
    fn recalculate_pending_links(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        let mut relinked = 0usize;
        for key in pending {
            if self.regions.contains_key(&key) {
                self.recalculate_links(key);
                relinked += 1;
            }
        }
        trace!(
            "[LINKS] Relinked {} regions, index holds {} links",
            relinked,
            self.links.len()
        );
    }

    fn recalculate_links(&mut self, key: RegionKey) {
        if let Some(region) = self.regions.get(&key) {
            self.links.remove_all_for(key, region.links());
        }

        let chunk_extent = self.chunk_extent;
        let origin = self.chunk_of(key.pos()).origin(chunk_extent);
        let mut links = LinkList::new();

        if origin.y > 0 {
            self.scan_border(origin, LinkDirection::AlongRow, key, GridPos::DOWN, GridPos::ZERO, &mut links);
        }
        let top = origin.offset(GridPos::new(0, chunk_extent.y - 1));
        if top.y < self.grid_extent.y - 1 {
            self.scan_border(top, LinkDirection::AlongRow, key, GridPos::UP, GridPos::UP, &mut links);
        }
        if origin.x > 0 {
            self.scan_border(origin, LinkDirection::AlongColumn, key, GridPos::LEFT, GridPos::ZERO, &mut links);
        }
        let right = origin.offset(GridPos::new(chunk_extent.x - 1, 0));
        if right.x < self.grid_extent.x - 1 {
            self.scan_border(right, LinkDirection::AlongColumn, key, GridPos::RIGHT, GridPos::RIGHT, &mut links);
        }

        for link in &links {
            self.links.add(*link, key);
        }
        if let Some(region) = self.regions.get_mut(&key) {
            region.replace_links(links);
        }
    }

    /// Emit one link per maximal run along a chunk side where cells of `key`
    /// face free cells of a single other region across the border.
    ///
    /// `root_offset` moves the run start onto the upper/right side of the border.
    fn scan_border(
        &mut self,
        start: GridPos,
        direction: LinkDirection,
        key: RegionKey,
        across: GridPos,
        root_offset: GridPos,
        out: &mut LinkList,
    ) {
        let step = direction.step();
        let side = match direction {
            LinkDirection::AlongRow => self.chunk_extent.x,
            LinkDirection::AlongColumn => self.chunk_extent.y,
        };

        let mut delta = 0;
        while delta < side {
            let cell = start.offset(step.scaled(delta));
            let facing = cell.offset(across);
            if self.occlusion.is_occluded(cell)
                || self.occlusion.is_occluded(facing)
                || self.keys.find(cell) != key
            {
                delta += 1;
                continue;
            }
            let facing_key = self.keys.find(facing);
            if facing_key.is_none() {
                delta += 1;
                continue;
            }

            let mut length = 1;
            while delta + length < side {
                let next = cell.offset(step.scaled(length));
                if self.keys.find(next) != key || self.keys.find(next.offset(across)) != facing_key {
                    break;
                }
                length += 1;
            }

            out.push(RegionLink::new(cell.offset(root_offset), direction, length as u32));
            delta += length;
        }
    }
}
