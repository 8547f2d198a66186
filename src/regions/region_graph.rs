use rustc_hash::FxHashMap;

use super::link_index::LinkIndex;
use super::types::Region;
use crate::graph::{DirectedGraph, Edge};
use crate::grid::RegionKey;

/// Region adjacency view: one node per region, a unit edge to every region
/// reachable through a shared link.
pub struct RegionGraph<'a, P> {
    regions: &'a FxHashMap<RegionKey, Region<P>>,
    links: &'a LinkIndex,
}

impl<'a, P> RegionGraph<'a, P> {
    pub fn new(regions: &'a FxHashMap<RegionKey, Region<P>>, links: &'a LinkIndex) -> Self {
        Self { regions, links }
    }

    pub fn node_count(&self) -> usize {
        self.regions.len()
    }
}

/// Unit edges out of one region.
pub struct RegionEdges {
    source: RegionKey,
    neighbours: std::vec::IntoIter<RegionKey>,
}

impl Iterator for RegionEdges {
    type Item = Edge<RegionKey, f32>;

    fn next(&mut self) -> Option<Self::Item> {
        let destination = self.neighbours.next()?;
        Some(Edge::new(self.source, destination, 1.0))
    }
}

impl<'r, P> DirectedGraph for RegionGraph<'r, P> {
    type Node = RegionKey;
    type EdgeData = f32;
    type Nodes<'a>
        = std::iter::Copied<std::collections::hash_map::Keys<'a, RegionKey, Region<P>>>
    where
        Self: 'a;
    type Edges<'a>
        = RegionEdges
    where
        Self: 'a;

    fn contains_node(&self, node: &RegionKey) -> bool {
        self.regions.contains_key(node)
    }

    fn nodes(&self) -> Self::Nodes<'_> {
        self.regions.keys().copied()
    }

    fn outgoing_edges(&self, node: &RegionKey) -> RegionEdges {
        let neighbours = match self.regions.get(node) {
            Some(region) => self.links.adjacent_keys(*node, region.links()),
            None => Vec::new(),
        };
        RegionEdges {
            source: *node,
            neighbours: neighbours.into_iter(),
        }
    }
}
