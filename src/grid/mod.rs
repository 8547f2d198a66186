//! Grid primitives: integer positions, dense per-cell storage, occlusion bits.

use fixedbitset::FixedBitSet;
use serde::{Deserialize, Serialize};

pub mod coordinates;
pub mod union_find;

pub use coordinates::GridCoordinateConverter;
pub use union_find::UnionFind2D;

// ============================================================================
// Positions
// ============================================================================

/// Integer cell coordinate. `x` grows right, `y` grows up.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub const ZERO: Self = Self { x: 0, y: 0 };
    pub const LEFT: Self = Self { x: -1, y: 0 };
    pub const DOWN: Self = Self { x: 0, y: -1 };
    pub const RIGHT: Self = Self { x: 1, y: 0 };
    pub const UP: Self = Self { x: 0, y: 1 };

    /// Cardinal neighbour offsets, in the order edits visit them.
    pub const CARDINALS: [GridPos; 4] = [Self::LEFT, Self::DOWN, Self::RIGHT, Self::UP];

    /// Cardinal plus diagonal offsets.
    pub const OCTILE: [GridPos; 8] = [
        Self::LEFT,
        Self::DOWN,
        Self::RIGHT,
        Self::UP,
        GridPos { x: -1, y: -1 },
        GridPos { x: 1, y: -1 },
        GridPos { x: 1, y: 1 },
        GridPos { x: -1, y: 1 },
    ];

    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub const fn offset(self, delta: GridPos) -> Self {
        Self {
            x: self.x + delta.x,
            y: self.y + delta.y,
        }
    }

    #[inline]
    pub const fn scaled(self, factor: i32) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
        }
    }

    /// Manhattan distance.
    #[inline]
    pub fn manhattan(self, other: GridPos) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// `true` when `self` lies inside `[0, extent.x) x [0, extent.y)`.
    #[inline]
    pub fn within(self, extent: GridPos) -> bool {
        self.x >= 0 && self.y >= 0 && self.x < extent.x && self.y < extent.y
    }
}

impl From<(i32, i32)> for GridPos {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// Canonical identity of a region: the grid position union-find picked as its
/// representative.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegionKey(pub GridPos);

impl RegionKey {
    /// "No key": unset or out-of-bounds cells.
    pub const NONE: RegionKey = RegionKey(GridPos { x: -1, y: -1 });

    #[inline]
    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    #[inline]
    pub fn is_some(self) -> bool {
        self != Self::NONE
    }

    #[inline]
    pub fn pos(self) -> GridPos {
        self.0
    }
}

impl From<GridPos> for RegionKey {
    fn from(pos: GridPos) -> Self {
        RegionKey(pos)
    }
}

// ============================================================================
// Dense storage
// ============================================================================

/// Row-major array covering a whole grid extent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DenseGrid<T> {
    extent: GridPos,
    cells: Vec<T>,
}

impl<T: Clone> DenseGrid<T> {
    /// Grid of `extent` cells all set to `fill`. Extent components must be positive.
    pub fn new(extent: GridPos, fill: T) -> Self {
        debug_assert!(extent.x > 0 && extent.y > 0, "grid extent must be positive");
        let len = (extent.x as usize) * (extent.y as usize);
        Self {
            extent,
            cells: vec![fill; len],
        }
    }
}

impl<T> DenseGrid<T> {
    #[inline]
    pub fn extent(&self) -> GridPos {
        self.extent
    }

    #[inline]
    pub fn contains(&self, pos: GridPos) -> bool {
        pos.within(self.extent)
    }

    #[inline]
    fn linear(&self, pos: GridPos) -> usize {
        (pos.y as usize) * (self.extent.x as usize) + pos.x as usize
    }

    pub fn get(&self, pos: GridPos) -> Option<&T> {
        if self.contains(pos) {
            Some(&self.cells[self.linear(pos)])
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, pos: GridPos) -> Option<&mut T> {
        if self.contains(pos) {
            let index = self.linear(pos);
            Some(&mut self.cells[index])
        } else {
            None
        }
    }
}

impl<T> std::ops::Index<GridPos> for DenseGrid<T> {
    type Output = T;

    fn index(&self, pos: GridPos) -> &T {
        assert!(self.contains(pos), "cell {pos:?} outside grid {:?}", self.extent);
        &self.cells[self.linear(pos)]
    }
}

impl<T> std::ops::IndexMut<GridPos> for DenseGrid<T> {
    fn index_mut(&mut self, pos: GridPos) -> &mut T {
        assert!(self.contains(pos), "cell {pos:?} outside grid {:?}", self.extent);
        let index = self.linear(pos);
        &mut self.cells[index]
    }
}

// ============================================================================
// Occlusion
// ============================================================================

/// One bit per cell, set when the cell is blocked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OcclusionGrid {
    extent: GridPos,
    bits: FixedBitSet,
}

impl OcclusionGrid {
    /// Fully free grid.
    pub fn new(extent: GridPos) -> Self {
        let len = (extent.x.max(0) as usize) * (extent.y.max(0) as usize);
        Self {
            extent,
            bits: FixedBitSet::with_capacity(len),
        }
    }

    /// Build from text rows. `#` is blocked, anything else is free.
    /// The first row is `y = 0`.
    pub fn from_rows(rows: &[&str]) -> Self {
        let height = rows.len() as i32;
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0) as i32;
        let mut grid = Self::new(GridPos::new(width, height));
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                if ch == '#' {
                    grid.set(GridPos::new(x as i32, y as i32), true);
                }
            }
        }
        grid
    }

    #[inline]
    pub fn extent(&self) -> GridPos {
        self.extent
    }

    #[inline]
    pub fn contains(&self, pos: GridPos) -> bool {
        pos.within(self.extent)
    }

    #[inline]
    fn linear(&self, pos: GridPos) -> usize {
        (pos.y as usize) * (self.extent.x as usize) + pos.x as usize
    }

    /// Blocked state of `pos`. Cells outside the grid count as blocked.
    #[inline]
    pub fn is_occluded(&self, pos: GridPos) -> bool {
        !self.contains(pos) || self.bits.contains(self.linear(pos))
    }

    #[inline]
    pub fn is_free(&self, pos: GridPos) -> bool {
        !self.is_occluded(pos)
    }

    /// Panics if `pos` is outside the grid.
    pub fn set(&mut self, pos: GridPos, occluded: bool) {
        assert!(self.contains(pos), "cell {pos:?} outside grid {:?}", self.extent);
        let index = self.linear(pos);
        self.bits.set(index, occluded);
    }

    pub fn occluded_count(&self) -> usize {
        self.bits.count_ones(..)
    }

    pub fn cell_count(&self) -> usize {
        self.bits.len()
    }
}
