//! Directed graph abstraction and the searches that run over it.
//!
//! [`DirectedGraph`] is implemented by the concrete [`AdjacencyGraph`], by the
//! per-cell [`GridGraph`](grid_graph::GridGraph) and by the region adjacency
//! graph. Searches in [`search`] only depend on the trait.

use rustc_hash::FxHashMap;
use std::fmt::Debug;
use std::hash::Hash;

use crate::error::GraphError;

pub mod grid_graph;
pub mod search;

pub use grid_graph::{GridConnectivity, GridGraph};
pub use search::{
    astar_multi_search, astar_search, expand, expand_unbounded, AStarSearch, Expand, ResultLimit,
    SearchResult,
};

/// A directed edge with its payload (a weight, usually).
#[derive(Clone, Debug, PartialEq)]
pub struct Edge<N, E> {
    pub source: N,
    pub destination: N,
    pub data: E,
}

impl<N, E> Edge<N, E> {
    pub fn new(source: N, destination: N, data: E) -> Self {
        Self {
            source,
            destination,
            data,
        }
    }
}

/// Read-only view of a directed graph.
///
/// Node and edge enumeration are lazy. `outgoing_edges` of a node that is not in
/// the graph yields nothing.
pub trait DirectedGraph {
    type Node: Clone + Eq + Hash + Debug;
    type EdgeData: Clone;

    type Nodes<'a>: Iterator<Item = Self::Node>
    where
        Self: 'a;
    type Edges<'a>: Iterator<Item = Edge<Self::Node, Self::EdgeData>>
    where
        Self: 'a;

    fn contains_node(&self, node: &Self::Node) -> bool;

    fn nodes(&self) -> Self::Nodes<'_>;

    fn outgoing_edges(&self, node: &Self::Node) -> Self::Edges<'_>;

    fn contains_edge(&self, source: &Self::Node, destination: &Self::Node) -> bool {
        self.outgoing_edges(source)
            .any(|edge| edge.destination == *destination)
    }

    /// Edge from `source` to `destination`, if there is one.
    fn try_get_edge(
        &self,
        source: &Self::Node,
        destination: &Self::Node,
    ) -> Result<Option<Edge<Self::Node, Self::EdgeData>>, GraphError> {
        if source == destination {
            return Err(GraphError::SelfLoop(format!("{source:?}")));
        }
        Ok(self
            .outgoing_edges(source)
            .find(|edge| edge.destination == *destination))
    }
}

// ============================================================================
// Adjacency-list graph
// ============================================================================

/// Adjacency-list graph. Nodes and outgoing edges keep insertion order.
#[derive(Clone, Debug)]
pub struct AdjacencyGraph<N, E> {
    slots: FxHashMap<N, usize>,
    nodes: Vec<N>,
    adjacency: Vec<Vec<(usize, E)>>,
    edge_count: usize,
}

impl<N, E> Default for AdjacencyGraph<N, E> {
    fn default() -> Self {
        Self {
            slots: FxHashMap::default(),
            nodes: Vec::new(),
            adjacency: Vec::new(),
            edge_count: 0,
        }
    }
}

impl<N: Clone + Eq + Hash + Debug, E: Clone> AdjacencyGraph<N, E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn add_node(&mut self, node: N) -> Result<(), GraphError> {
        if self.slots.contains_key(&node) {
            return Err(GraphError::DuplicateNode(format!("{node:?}")));
        }
        self.insert_node(node);
        Ok(())
    }

    /// Adds `source -> destination`, inserting missing endpoints.
    pub fn add_edge(&mut self, source: N, destination: N, data: E) -> Result<(), GraphError> {
        if source == destination {
            return Err(GraphError::SelfLoop(format!("{source:?}")));
        }
        let from = self.slot_or_insert(source);
        let to = self.slot_or_insert(destination);
        if self.adjacency[from].iter().any(|(dst, _)| *dst == to) {
            return Err(GraphError::DuplicateEdge(
                format!("{:?}", self.nodes[from]),
                format!("{:?}", self.nodes[to]),
            ));
        }
        self.adjacency[from].push((to, data));
        self.edge_count += 1;
        Ok(())
    }

    fn slot_or_insert(&mut self, node: N) -> usize {
        match self.slots.get(&node) {
            Some(&slot) => slot,
            None => self.insert_node(node),
        }
    }

    fn insert_node(&mut self, node: N) -> usize {
        let slot = self.nodes.len();
        self.slots.insert(node.clone(), slot);
        self.nodes.push(node);
        self.adjacency.push(Vec::new());
        slot
    }
}

/// Outgoing edges of one [`AdjacencyGraph`] node.
pub struct AdjacencyEdges<'a, N, E> {
    graph: &'a AdjacencyGraph<N, E>,
    source: usize,
    next: usize,
}

impl<'a, N: Clone, E: Clone> Iterator for AdjacencyEdges<'a, N, E> {
    type Item = Edge<N, E>;

    fn next(&mut self) -> Option<Self::Item> {
        let edges = self.graph.adjacency.get(self.source)?;
        let (destination, data) = edges.get(self.next)?;
        self.next += 1;
        Some(Edge::new(
            self.graph.nodes[self.source].clone(),
            self.graph.nodes[*destination].clone(),
            data.clone(),
        ))
    }
}

impl<N: Clone + Eq + Hash + Debug, E: Clone> DirectedGraph for AdjacencyGraph<N, E> {
    type Node = N;
    type EdgeData = E;
    type Nodes<'a>
        = std::iter::Cloned<std::slice::Iter<'a, N>>
    where
        Self: 'a;
    type Edges<'a>
        = AdjacencyEdges<'a, N, E>
    where
        Self: 'a;

    fn contains_node(&self, node: &N) -> bool {
        self.slots.contains_key(node)
    }

    fn nodes(&self) -> Self::Nodes<'_> {
        self.nodes.iter().cloned()
    }

    fn outgoing_edges(&self, node: &N) -> Self::Edges<'_> {
        AdjacencyEdges {
            graph: self,
            // usize::MAX never indexes an adjacency list: unknown nodes yield nothing.
            source: self.slots.get(node).copied().unwrap_or(usize::MAX),
            next: 0,
        }
    }
}
