//! Best-first multi-goal search and cost-bounded expansion.
//!
//! Both searches are iterators holding their own frontier. Pull results one at a
//! time; dropping the iterator abandons the search.

use rustc_hash::{FxHashMap, FxHashSet};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};
use std::time::{Duration, Instant};

use super::{DirectedGraph, Edge};
use crate::error::SearchError;

// ============================================================================
// Results
// ============================================================================

/// Maximum number of goals a multi-goal search reports.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResultLimit {
    #[default]
    Unlimited,
    AtMost(usize),
}

impl ResultLimit {
    /// `-1` means unlimited, any other negative value is rejected.
    pub fn from_signed(limit: i64) -> Result<Self, SearchError> {
        match limit {
            -1 => Ok(ResultLimit::Unlimited),
            n if n >= 0 => Ok(ResultLimit::AtMost(n as usize)),
            n => Err(SearchError::InvalidResultLimit(n)),
        }
    }

    #[inline]
    fn reached(self, found: usize) -> bool {
        match self {
            ResultLimit::Unlimited => false,
            ResultLimit::AtMost(max) => found >= max,
        }
    }
}

/// One goal reached by a search.
#[derive(Clone, Debug)]
pub struct SearchResult<N, E> {
    pub source: N,
    pub goal: N,
    /// Edges from `source` to `goal`, in travel order. Empty when the source is the goal.
    pub path: Vec<Edge<N, E>>,
    pub total_cost: f32,
    /// Nodes dequeued by the search so far, this goal included.
    pub explored_nodes: usize,
    /// Wall time since the search started.
    pub elapsed: Duration,
}

impl<N: PartialEq, E> SearchResult<N, E> {
    /// Nodes along the path, source first.
    pub fn node_path(&self) -> Vec<&N> {
        let mut nodes = Vec::with_capacity(self.path.len() + 1);
        nodes.push(&self.source);
        nodes.extend(self.path.iter().map(|edge| &edge.destination));
        nodes
    }
}

// ============================================================================
// A* multi-goal search
// ============================================================================

struct NodeRecord<N, E> {
    node: N,
    cost: f32,
    estimate: f32,
    parent: Option<(usize, Edge<N, E>)>,
    /// Sequence number of the frontier entry currently standing for this node.
    entry: u64,
    visited: bool,
}

#[derive(Clone, Copy, Debug)]
struct State {
    estimate: f32,
    seq: u64,
    slot: usize,
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for State {}

impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap: lowest estimate first, then oldest entry.
        other
            .estimate
            .total_cmp(&self.estimate)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Lazy A* over a [`DirectedGraph`] that reports every goal it dequeues.
///
/// Ties on `f = g + h` are broken by frontier insertion order. A node whose
/// estimate improves while it is still queued is re-queued as a fresh entry and
/// the stale one is skipped on dequeue.
pub struct AStarSearch<'g, G, Goal, Cost, Heuristic, Filter>
where
    G: DirectedGraph,
{
    graph: &'g G,
    source: G::Node,
    is_goal: Goal,
    cost_fn: Cost,
    heuristic: Heuristic,
    edge_filter: Filter,
    limit: ResultLimit,
    records: Vec<NodeRecord<G::Node, G::EdgeData>>,
    slots: FxHashMap<G::Node, usize>,
    frontier: BinaryHeap<State>,
    next_seq: u64,
    explored: usize,
    found: usize,
    started: Instant,
}

/// Start a multi-goal A* search from `source`.
///
/// `cost_fn` gives the weight of an edge, `heuristic` a lower bound of the
/// remaining cost from a node and `edge_filter` rejects edges outright.
pub fn astar_multi_search<'g, G, Goal, Cost, Heuristic, Filter>(
    graph: &'g G,
    source: G::Node,
    is_goal: Goal,
    cost_fn: Cost,
    heuristic: Heuristic,
    edge_filter: Filter,
    limit: ResultLimit,
) -> Result<AStarSearch<'g, G, Goal, Cost, Heuristic, Filter>, SearchError>
where
    G: DirectedGraph,
    Goal: FnMut(&G::Node) -> bool,
    Cost: FnMut(&Edge<G::Node, G::EdgeData>) -> f32,
    Heuristic: FnMut(&G::Node) -> f32,
    Filter: FnMut(&Edge<G::Node, G::EdgeData>) -> bool,
{
    if !graph.contains_node(&source) {
        return Err(SearchError::SourceNotInGraph);
    }

    let mut search = AStarSearch {
        graph,
        source: source.clone(),
        is_goal,
        cost_fn,
        heuristic,
        edge_filter,
        limit,
        records: Vec::new(),
        slots: FxHashMap::default(),
        frontier: BinaryHeap::new(),
        next_seq: 0,
        explored: 0,
        found: 0,
        started: Instant::now(),
    };
    let estimate = (search.heuristic)(&source);
    search.push(source, 0.0, estimate, None);
    Ok(search)
}

/// First goal reached from `source`, or `None` if no goal is reachable.
pub fn astar_search<G, Goal, Cost, Heuristic, Filter>(
    graph: &G,
    source: G::Node,
    is_goal: Goal,
    cost_fn: Cost,
    heuristic: Heuristic,
    edge_filter: Filter,
) -> Result<Option<SearchResult<G::Node, G::EdgeData>>, SearchError>
where
    G: DirectedGraph,
    Goal: FnMut(&G::Node) -> bool,
    Cost: FnMut(&Edge<G::Node, G::EdgeData>) -> f32,
    Heuristic: FnMut(&G::Node) -> f32,
    Filter: FnMut(&Edge<G::Node, G::EdgeData>) -> bool,
{
    let mut search = astar_multi_search(
        graph,
        source,
        is_goal,
        cost_fn,
        heuristic,
        edge_filter,
        ResultLimit::AtMost(1),
    )?;
    Ok(search.next())
}

impl<'g, G, Goal, Cost, Heuristic, Filter> AStarSearch<'g, G, Goal, Cost, Heuristic, Filter>
where
    G: DirectedGraph,
{
    /// Nodes dequeued so far.
    pub fn explored_nodes(&self) -> usize {
        self.explored
    }

    fn push(
        &mut self,
        node: G::Node,
        cost: f32,
        estimate: f32,
        parent: Option<(usize, Edge<G::Node, G::EdgeData>)>,
    ) {
        let seq = self.next_seq;
        self.next_seq += 1;

        let slot = match self.slots.get(&node) {
            Some(&slot) => {
                let record = &mut self.records[slot];
                record.cost = cost;
                record.estimate = estimate;
                record.parent = parent;
                record.entry = seq;
                slot
            }
            None => {
                let slot = self.records.len();
                self.slots.insert(node.clone(), slot);
                self.records.push(NodeRecord {
                    node,
                    cost,
                    estimate,
                    parent,
                    entry: seq,
                    visited: false,
                });
                slot
            }
        };
        self.frontier.push(State {
            estimate,
            seq,
            slot,
        });
    }

    fn build_result(&self, goal_slot: usize) -> SearchResult<G::Node, G::EdgeData> {
        let mut path = Vec::new();
        let mut slot = goal_slot;
        while let Some((parent, edge)) = &self.records[slot].parent {
            path.push(edge.clone());
            slot = *parent;
        }
        path.reverse();

        let goal = &self.records[goal_slot];
        SearchResult {
            source: self.source.clone(),
            goal: goal.node.clone(),
            path,
            total_cost: goal.cost,
            explored_nodes: self.explored,
            elapsed: self.started.elapsed(),
        }
    }
}

impl<'g, G, Goal, Cost, Heuristic, Filter> Iterator
    for AStarSearch<'g, G, Goal, Cost, Heuristic, Filter>
where
    G: DirectedGraph,
    Goal: FnMut(&G::Node) -> bool,
    Cost: FnMut(&Edge<G::Node, G::EdgeData>) -> f32,
    Heuristic: FnMut(&G::Node) -> f32,
    Filter: FnMut(&Edge<G::Node, G::EdgeData>) -> bool,
{
    type Item = SearchResult<G::Node, G::EdgeData>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.limit.reached(self.found) {
            return None;
        }

        while let Some(State { seq, slot, .. }) = self.frontier.pop() {
            let record = &self.records[slot];
            if record.visited || record.entry != seq {
                continue;
            }
            self.records[slot].visited = true;
            self.explored += 1;

            let graph = self.graph;
            let current = self.records[slot].node.clone();
            let current_cost = self.records[slot].cost;
            for edge in graph.outgoing_edges(&current) {
                let known = self.slots.get(&edge.destination).copied();
                if known.is_some_and(|s| self.records[s].visited) {
                    continue;
                }
                if !(self.edge_filter)(&edge) {
                    continue;
                }

                let cost = current_cost + (self.cost_fn)(&edge);
                let estimate = cost + (self.heuristic)(&edge.destination);
                let improves = match known {
                    Some(s) => estimate < self.records[s].estimate,
                    None => true,
                };
                if improves {
                    self.push(edge.destination.clone(), cost, estimate, Some((slot, edge)));
                }
            }

            if (self.is_goal)(&current) {
                self.found += 1;
                return Some(self.build_result(slot));
            }
        }
        None
    }
}

// ============================================================================
// Cost-bounded expansion
// ============================================================================

/// Breadth-first reachability with a cost cap.
///
/// The frontier is FIFO and a node is claimed by the first path that reaches it,
/// so with non-uniform edge costs a node can be rejected through one path while a
/// cheaper, later path to it exists. Uniform costs are exact.
pub struct Expand<'g, G, Cost, Filter>
where
    G: DirectedGraph,
{
    graph: &'g G,
    cost_fn: Cost,
    edge_filter: Filter,
    max_cost: f32,
    queue: VecDeque<(G::Node, f32, bool)>,
    visited: FxHashSet<G::Node>,
}

/// Nodes reachable from `source` with accumulated cost at most `max_cost`.
pub fn expand<'g, G, Cost, Filter>(
    graph: &'g G,
    source: G::Node,
    cost_fn: Cost,
    max_cost: f32,
    edge_filter: Filter,
    include_source: bool,
) -> Result<Expand<'g, G, Cost, Filter>, SearchError>
where
    G: DirectedGraph,
    Cost: FnMut(&Edge<G::Node, G::EdgeData>) -> f32,
    Filter: FnMut(&Edge<G::Node, G::EdgeData>) -> bool,
{
    if !graph.contains_node(&source) {
        return Err(SearchError::SourceNotInGraph);
    }
    if max_cost.is_nan() || max_cost < 0.0 {
        return Err(SearchError::NegativeMaxCost(max_cost));
    }

    let mut visited = FxHashSet::default();
    visited.insert(source.clone());
    let mut queue = VecDeque::new();
    queue.push_back((source, 0.0, include_source));

    Ok(Expand {
        graph,
        cost_fn,
        edge_filter,
        max_cost,
        queue,
        visited,
    })
}

/// Every node reachable from `source` through edges accepted by `edge_filter`.
#[allow(clippy::type_complexity)]
pub fn expand_unbounded<'g, G, Filter>(
    graph: &'g G,
    source: G::Node,
    edge_filter: Filter,
    include_source: bool,
) -> Result<Expand<'g, G, fn(&Edge<G::Node, G::EdgeData>) -> f32, Filter>, SearchError>
where
    G: DirectedGraph,
    Filter: FnMut(&Edge<G::Node, G::EdgeData>) -> bool,
{
    let zero_cost: fn(&Edge<G::Node, G::EdgeData>) -> f32 = |_| 0.0;
    expand(
        graph,
        source,
        zero_cost,
        f32::INFINITY,
        edge_filter,
        include_source,
    )
}

impl<'g, G, Cost, Filter> Iterator for Expand<'g, G, Cost, Filter>
where
    G: DirectedGraph,
    Cost: FnMut(&Edge<G::Node, G::EdgeData>) -> f32,
    Filter: FnMut(&Edge<G::Node, G::EdgeData>) -> bool,
{
    type Item = G::Node;

    fn next(&mut self) -> Option<G::Node> {
        while let Some((node, cost, report)) = self.queue.pop_front() {
            let graph = self.graph;
            for edge in graph.outgoing_edges(&node) {
                if self.visited.contains(&edge.destination) {
                    continue;
                }
                if !(self.edge_filter)(&edge) {
                    continue;
                }
                let total = cost + (self.cost_fn)(&edge);
                if total > self.max_cost {
                    continue;
                }
                self.visited.insert(edge.destination.clone());
                self.queue.push_back((edge.destination, total, true));
            }

            if report {
                return Some(node);
            }
        }
        None
    }
}
