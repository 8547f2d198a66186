use serde::{Deserialize, Serialize};

use super::{DirectedGraph, Edge};
use crate::grid::GridPos;

/// Neighbourhood used by [`GridGraph`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GridConnectivity {
    #[default]
    FourDirections,
    EightDirections,
}

impl GridConnectivity {
    #[inline]
    pub fn offsets(self) -> &'static [GridPos] {
        match self {
            GridConnectivity::FourDirections => &GridPos::CARDINALS,
            GridConnectivity::EightDirections => &GridPos::OCTILE,
        }
    }
}

/// Implicit graph over every cell of a grid extent, all edges weighing `1.0`.
///
/// Occlusion is not part of the graph: callers filter edges instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridGraph {
    extent: GridPos,
    connectivity: GridConnectivity,
}

impl GridGraph {
    pub fn new(extent: GridPos, connectivity: GridConnectivity) -> Self {
        Self {
            extent,
            connectivity,
        }
    }

    #[inline]
    pub fn extent(&self) -> GridPos {
        self.extent
    }
}

/// Row-major walk over every cell.
pub struct GridNodes {
    extent: GridPos,
    next: GridPos,
}

impl Iterator for GridNodes {
    type Item = GridPos;

    fn next(&mut self) -> Option<GridPos> {
        if self.extent.x <= 0 || self.next.y >= self.extent.y {
            return None;
        }
        let current = self.next;
        self.next.x += 1;
        if self.next.x >= self.extent.x {
            self.next.x = 0;
            self.next.y += 1;
        }
        Some(current)
    }
}

/// In-bounds neighbours of one cell.
pub struct GridEdges {
    source: GridPos,
    extent: GridPos,
    offsets: std::slice::Iter<'static, GridPos>,
}

impl Iterator for GridEdges {
    type Item = Edge<GridPos, f32>;

    fn next(&mut self) -> Option<Self::Item> {
        for offset in self.offsets.by_ref() {
            let destination = self.source.offset(*offset);
            if destination.within(self.extent) {
                return Some(Edge::new(self.source, destination, 1.0));
            }
        }
        None
    }
}

impl DirectedGraph for GridGraph {
    type Node = GridPos;
    type EdgeData = f32;
    type Nodes<'a> = GridNodes;
    type Edges<'a> = GridEdges;

    #[inline]
    fn contains_node(&self, node: &GridPos) -> bool {
        node.within(self.extent)
    }

    fn nodes(&self) -> GridNodes {
        GridNodes {
            extent: self.extent,
            next: GridPos::ZERO,
        }
    }

    fn outgoing_edges(&self, node: &GridPos) -> GridEdges {
        let offsets: &'static [GridPos] = if self.contains_node(node) {
            self.connectivity.offsets()
        } else {
            &[]
        };
        GridEdges {
            source: *node,
            extent: self.extent,
            offsets: offsets.iter(),
        }
    }
}
