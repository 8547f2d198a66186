use serde::{Deserialize, Serialize};

use super::GridPos;
use crate::fixed_math::{FixedNum, FixedVec2};

/// Maps between world space and grid cells.
///
/// The grid occupies `[lower_left, lower_left + cell_size * extent]` in world
/// space. Cell `(0, 0)` touches the lower-left corner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridCoordinateConverter {
    lower_left: FixedVec2,
    extent: GridPos,
    cell_size: FixedVec2,
}

impl GridCoordinateConverter {
    pub fn new(lower_left: FixedVec2, extent: GridPos, cell_size: FixedVec2) -> Self {
        Self {
            lower_left,
            extent,
            cell_size,
        }
    }

    #[inline]
    pub fn lower_left(&self) -> FixedVec2 {
        self.lower_left
    }

    #[inline]
    pub fn cell_size(&self) -> FixedVec2 {
        self.cell_size
    }

    #[inline]
    pub fn extent(&self) -> GridPos {
        self.extent
    }

    pub fn top_right(&self) -> FixedVec2 {
        let extent = FixedVec2::from_i32(self.extent.x, self.extent.y);
        self.lower_left + self.cell_size.scale(extent)
    }

    /// Inclusive on all four edges.
    pub fn is_world_pos_within_bounds(&self, world: FixedVec2) -> bool {
        let top_right = self.top_right();
        world.x >= self.lower_left.x
            && world.y >= self.lower_left.y
            && world.x <= top_right.x
            && world.y <= top_right.y
    }

    /// Cell containing `world`, or `None` outside the grid.
    ///
    /// Points on the top or right edge belong to the last row or column.
    pub fn world_to_grid(&self, world: FixedVec2) -> Option<GridPos> {
        if !self.is_world_pos_within_bounds(world) {
            return None;
        }
        let local = world - self.lower_left;
        let x: i32 = (local.x / self.cell_size.x).floor().to_num();
        let y: i32 = (local.y / self.cell_size.y).floor().to_num();
        Some(GridPos::new(x.min(self.extent.x - 1), y.min(self.extent.y - 1)))
    }

    /// World position of a point inside cell `pos`.
    ///
    /// `cell_offset` is relative to the cell in `[0, 1] x [0, 1]`: `(0, 0)` is the
    /// lower-left corner of the cell and `(1, 1)` the top-right one.
    pub fn grid_to_world(&self, pos: GridPos, cell_offset: FixedVec2) -> Option<FixedVec2> {
        if !pos.within(self.extent) {
            return None;
        }
        let unit = FixedNum::ONE;
        if cell_offset.x < FixedNum::ZERO
            || cell_offset.x > unit
            || cell_offset.y < FixedNum::ZERO
            || cell_offset.y > unit
        {
            return None;
        }
        let cell = FixedVec2::from_i32(pos.x, pos.y) + cell_offset;
        Some(self.lower_left + cell.scale(self.cell_size))
    }

    pub fn grid_center_to_world(&self, pos: GridPos) -> Option<FixedVec2> {
        let half = FixedNum::ONE / 2;
        self.grid_to_world(pos, FixedVec2::new(half, half))
    }
}
