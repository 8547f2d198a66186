//! Union-find over grid cells.
//!
//! Every cell stores a parent position. A root points at itself, an unset cell
//! holds [`RegionKey::NONE`]. The root's position is the region key.

use super::{DenseGrid, GridPos, RegionKey};

#[derive(Clone, Debug)]
pub struct UnionFind2D {
    parents: DenseGrid<RegionKey>,
}

impl UnionFind2D {
    /// All cells start unset.
    pub fn new(extent: GridPos) -> Self {
        Self {
            parents: DenseGrid::new(extent, RegionKey::NONE),
        }
    }

    #[inline]
    pub fn extent(&self) -> GridPos {
        self.parents.extent()
    }

    /// Root of the set containing `pos`, compressing the path on the way back.
    ///
    /// Returns [`RegionKey::NONE`] for cells outside the grid, unset cells, and
    /// cells whose chain runs into an unset cell.
    pub fn find(&mut self, pos: GridPos) -> RegionKey {
        let root = self.peek(pos);
        if root.is_none() {
            return root;
        }

        let mut current = pos;
        while current != root.pos() {
            let next = self.parents[current].pos();
            self.parents[current] = root;
            current = next;
        }
        root
    }

    /// Same answer as [`find`](Self::find) without touching the parent links.
    pub fn peek(&self, pos: GridPos) -> RegionKey {
        let Some(&first) = self.parents.get(pos) else {
            return RegionKey::NONE;
        };

        let mut current = pos;
        let mut parent = first;
        // A parent chain is at most one step per cell.
        let mut budget = self.cell_count();
        while parent.pos() != current {
            if parent.is_none() || budget == 0 {
                return RegionKey::NONE;
            }
            current = parent.pos();
            parent = match self.parents.get(current) {
                Some(&p) => p,
                None => return RegionKey::NONE,
            };
            budget -= 1;
        }
        RegionKey(current)
    }

    /// Attach the root of `smaller` under the root of `larger`.
    ///
    /// No-op when both are already in the same set or either side is unset.
    pub fn unite(&mut self, smaller: GridPos, larger: GridPos) {
        let small_root = self.find(smaller);
        let large_root = self.find(larger);
        if small_root == large_root || small_root.is_none() || large_root.is_none() {
            return;
        }
        self.parents[small_root.pos()] = large_root;
    }

    #[inline]
    pub fn has_key(&self, pos: GridPos) -> bool {
        self.peek(pos).is_some()
    }

    /// Mark `pos` as belonging to no set. `pos` must be inside the grid.
    #[inline]
    pub fn clear(&mut self, pos: GridPos) {
        self.parents[pos] = RegionKey::NONE;
    }

    /// Point `pos` directly at `key`. `pos` must be inside the grid.
    #[inline]
    pub fn set(&mut self, pos: GridPos, key: RegionKey) {
        self.parents[pos] = key;
    }

    fn cell_count(&self) -> usize {
        let extent = self.extent();
        (extent.x as usize) * (extent.y as usize)
    }
}
