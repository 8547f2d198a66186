use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

use crate::grid::{GridPos, RegionKey};

// ============================================================================
// Chunks
// ============================================================================

/// Index of a chunk, in chunk units (chunk `(1, 0)` starts at `x = chunk_extent.x`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkId(pub GridPos);

impl ChunkId {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        ChunkId(GridPos::new(x, y))
    }

    /// Grid position of the chunk's lower-left cell.
    #[inline]
    pub fn origin(self, chunk_extent: GridPos) -> GridPos {
        GridPos::new(self.0.x * chunk_extent.x, self.0.y * chunk_extent.y)
    }

    /// `true` if `pos` lies inside this chunk.
    #[inline]
    pub fn contains(self, pos: GridPos, chunk_extent: GridPos) -> bool {
        let origin = self.origin(chunk_extent);
        GridPos::new(pos.x - origin.x, pos.y - origin.y).within(chunk_extent)
    }
}

// ============================================================================
// Links
// ============================================================================

/// Axis along which a link run extends.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LinkDirection {
    /// Run grows in +x across a horizontal chunk border.
    AlongRow = 0,
    /// Run grows in +y across a vertical chunk border.
    AlongColumn = 1,
}

impl LinkDirection {
    #[inline]
    pub fn step(self) -> GridPos {
        match self {
            LinkDirection::AlongRow => GridPos::RIGHT,
            LinkDirection::AlongColumn => GridPos::UP,
        }
    }
}

/// A maximal run of free cell pairs straddling one chunk border.
///
/// `root` is the first cell of the run on the upper (row links) or right
/// (column links) side of the border, so both regions touching the run compute
/// the same value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegionLink {
    pub root: GridPos,
    pub direction: LinkDirection,
    pub length: u32,
}

impl RegionLink {
    pub fn new(root: GridPos, direction: LinkDirection, length: u32) -> Self {
        Self {
            root,
            direction,
            length,
        }
    }
}

impl fmt::Display for RegionLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "link({}, {}) {:?} x{}",
            self.root.x, self.root.y, self.direction, self.length
        )
    }
}

pub type LinkList = SmallVec<[RegionLink; 8]>;

// ============================================================================
// Regions
// ============================================================================

/// Computes the domain payload carried by each region.
///
/// Both hooks must be deterministic given their inputs.
pub trait PayloadGenerator<P> {
    /// Payload of a region created by flood fill or by freeing a single cell.
    fn generate_new(&self, key: RegionKey, cell_count: usize) -> P;

    /// Payload of the region produced by merging `a` and `b`.
    fn generate_on_merge(&self, a: &Region<P>, b: &Region<P>) -> P;
}

/// Generator for regions that carry no payload.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoPayload;

impl PayloadGenerator<()> for NoPayload {
    fn generate_new(&self, _key: RegionKey, _cell_count: usize) {}

    fn generate_on_merge(&self, _a: &Region<()>, _b: &Region<()>) {}
}

/// A connected set of free cells inside one chunk.
#[derive(Clone, Debug)]
pub struct Region<P> {
    key: RegionKey,
    cell_count: usize,
    payload: P,
    links: LinkList,
}

impl<P> Region<P> {
    pub fn new<G: PayloadGenerator<P> + ?Sized>(
        key: RegionKey,
        cell_count: usize,
        generator: &G,
    ) -> Self {
        Self {
            key,
            cell_count,
            payload: generator.generate_new(key, cell_count),
            links: LinkList::new(),
        }
    }

    /// Union of `a` and `b` under `key`. The result has no links yet.
    pub fn merged<G: PayloadGenerator<P> + ?Sized>(
        key: RegionKey,
        a: &Region<P>,
        b: &Region<P>,
        generator: &G,
    ) -> Self {
        Self {
            key,
            cell_count: a.cell_count + b.cell_count,
            payload: generator.generate_on_merge(a, b),
            links: LinkList::new(),
        }
    }

    #[inline]
    pub fn key(&self) -> RegionKey {
        self.key
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        self.cell_count
    }

    #[inline]
    pub fn payload(&self) -> &P {
        &self.payload
    }

    #[inline]
    pub fn links(&self) -> &[RegionLink] {
        &self.links
    }

    pub(crate) fn replace_links(&mut self, links: LinkList) {
        self.links = links;
    }
}

impl<P: fmt::Debug> fmt::Display for Region<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "region {:?} ({} cells, {} links) {:?}",
            self.key.pos(),
            self.cell_count,
            self.links.len(),
            self.payload
        )
    }
}
