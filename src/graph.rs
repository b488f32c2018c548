//! Directed graph with per-edge weight and resource consumption vectors.

use std::cell::Cell;

use hashbrown::HashMap;

use crate::preprocess;
use crate::Direction;

/// Dense vertex index assigned in registration order.
pub type NodeIndex = usize;

/// An arc of the graph: endpoints, weight, and one consumption value per
/// resource.
#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
    /// Tail vertex (dense index).
    pub tail: NodeIndex,
    /// Head vertex (dense index).
    pub head: NodeIndex,
    /// Weight contributed to the cost of any path using this edge.
    pub weight: f64,
    /// Resource consumption, one entry per resource.
    pub resources: Vec<f64>,
}

/// Immutable-after-construction directed graph with forward and reverse
/// adjacency, two distinguished vertices (source and sink), and the flags the
/// search consults during preprocessing.
///
/// Vertices are registered by user-facing id and mapped to dense indices in
/// `[0, node_count)`. The graph must not be mutated once a search has
/// started; the solver upholds this by only exposing population before
/// [`run`](crate::BiDirectional::run).
#[derive(Debug)]
pub struct DiGraph {
    edges: Vec<Edge>,
    out_edges: Vec<Vec<usize>>,
    in_edges: Vec<Vec<usize>>,
    ids: Vec<usize>,
    index_of: HashMap<usize, NodeIndex>,
    source_id: usize,
    sink_id: usize,
    num_resources: usize,
    any_negative_weight: bool,
    all_resources_nonnegative: bool,
    negative_cycle: Cell<Option<bool>>,
}

impl DiGraph {
    /// Create an empty graph for `num_resources` resources, reserving room
    /// for `num_nodes` vertices and `num_edges` edges.
    ///
    /// `source_id` and `sink_id` are user-facing ids; the corresponding
    /// vertices are recognised when they are registered with
    /// [`add_node`](DiGraph::add_node).
    pub fn new(
        num_nodes: usize,
        num_edges: usize,
        source_id: usize,
        sink_id: usize,
        num_resources: usize,
    ) -> Self {
        DiGraph {
            edges: Vec::with_capacity(num_edges),
            out_edges: Vec::with_capacity(num_nodes),
            in_edges: Vec::with_capacity(num_nodes),
            ids: Vec::with_capacity(num_nodes),
            index_of: HashMap::with_capacity(num_nodes),
            source_id,
            sink_id,
            num_resources,
            any_negative_weight: false,
            all_resources_nonnegative: true,
            negative_cycle: Cell::new(None),
        }
    }

    /// Register a vertex and return its dense index.
    ///
    /// Registering the same id twice returns the index assigned the first
    /// time.
    pub fn add_node(&mut self, id: usize) -> NodeIndex {
        if let Some(&index) = self.index_of.get(&id) {
            return index;
        }
        let index = self.ids.len();
        self.ids.push(id);
        self.out_edges.push(Vec::new());
        self.in_edges.push(Vec::new());
        self.index_of.insert(id, index);
        index
    }

    /// Add a directed edge between two registered vertices.
    ///
    /// # Panics
    /// Panics if either endpoint id has not been registered, or if
    /// `resources` does not have one entry per resource.
    pub fn add_edge(&mut self, tail_id: usize, head_id: usize, weight: f64, resources: Vec<f64>) {
        let tail = match self.index_of.get(&tail_id) {
            Some(&index) => index,
            None => panic!("add_edge: tail id {} is not a registered vertex", tail_id),
        };
        let head = match self.index_of.get(&head_id) {
            Some(&index) => index,
            None => panic!("add_edge: head id {} is not a registered vertex", head_id),
        };
        assert_eq!(
            resources.len(),
            self.num_resources,
            "add_edge: expected {} resource entries, got {}",
            self.num_resources,
            resources.len()
        );
        if weight < 0.0 {
            self.any_negative_weight = true;
        }
        if resources.iter().any(|&r| r < 0.0) {
            self.all_resources_nonnegative = false;
        }
        let index = self.edges.len();
        self.out_edges[tail].push(index);
        self.in_edges[head].push(index);
        self.edges.push(Edge {
            tail,
            head,
            weight,
            resources,
        });
        self.negative_cycle.set(None);
    }

    /// Number of registered vertices.
    pub fn node_count(&self) -> usize {
        self.ids.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Resource dimension shared by every edge.
    pub fn num_resources(&self) -> usize {
        self.num_resources
    }

    /// Whether any edge carries a negative weight.
    pub fn any_negative_weight(&self) -> bool {
        self.any_negative_weight
    }

    /// Whether every edge's resource vector is component-wise non-negative.
    pub fn all_resources_nonnegative(&self) -> bool {
        self.all_resources_nonnegative
    }

    /// Dense index of the source vertex, once registered.
    pub fn source(&self) -> Option<NodeIndex> {
        self.index_of.get(&self.source_id).copied()
    }

    /// Dense index of the sink vertex, once registered.
    pub fn sink(&self) -> Option<NodeIndex> {
        self.index_of.get(&self.sink_id).copied()
    }

    /// User-facing id of a vertex.
    pub fn id_of(&self, vertex: NodeIndex) -> usize {
        self.ids[vertex]
    }

    /// Iterate the out-arcs of `vertex`.
    pub fn out_edges(&self, vertex: NodeIndex) -> impl Iterator<Item = &Edge> {
        self.out_edges[vertex].iter().map(move |&e| &self.edges[e])
    }

    /// Iterate the in-arcs of `vertex`.
    pub fn in_edges(&self, vertex: NodeIndex) -> impl Iterator<Item = &Edge> {
        self.in_edges[vertex].iter().map(move |&e| &self.edges[e])
    }

    /// Iterate the arcs used to extend a label at `vertex` in `direction`:
    /// out-arcs forward, in-arcs backward.
    pub(crate) fn edges_directed(
        &self,
        vertex: NodeIndex,
        direction: Direction,
    ) -> impl Iterator<Item = &Edge> {
        let list = match direction {
            Direction::Backward => &self.in_edges[vertex],
            _ => &self.out_edges[vertex],
        };
        list.iter().map(move |&e| &self.edges[e])
    }

    pub(crate) fn raw_edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Whether a cycle of negative total weight is reachable from the source.
    ///
    /// Runs Bellman-Ford from the source the first time it is called; the
    /// result is cached until the graph is mutated. Returns `false` when the
    /// source has not been registered yet or no edge has a negative weight.
    pub fn has_negative_cycle(&self) -> bool {
        if !self.any_negative_weight {
            return false;
        }
        let source = match self.source() {
            Some(source) => source,
            None => return false,
        };
        if let Some(cached) = self.negative_cycle.get() {
            return cached;
        }
        let found =
            preprocess::shortest_distances(self, source, false, |edge| edge.weight).is_err();
        self.negative_cycle.set(Some(found));
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diamond() -> DiGraph {
        let mut g = DiGraph::new(4, 4, 0, 3, 1);
        for id in 0..4 {
            g.add_node(id);
        }
        g.add_edge(0, 1, 1.0, vec![1.0]);
        g.add_edge(0, 2, 2.0, vec![1.0]);
        g.add_edge(1, 3, 3.0, vec![1.0]);
        g.add_edge(2, 3, 4.0, vec![1.0]);
        g
    }

    #[test]
    fn adjacency_is_split_by_direction() {
        let g = diamond();
        let out: Vec<_> = g.out_edges(0).map(|e| e.head).collect();
        assert_eq!(out, vec![1, 2]);
        let into: Vec<_> = g.in_edges(3).map(|e| e.tail).collect();
        assert_eq!(into, vec![1, 2]);
        assert_eq!(g.out_edges(3).count(), 0);
    }

    #[test]
    fn ids_map_to_dense_indices() {
        let mut g = DiGraph::new(3, 2, 10, 30, 1);
        assert_eq!(g.add_node(10), 0);
        assert_eq!(g.add_node(20), 1);
        assert_eq!(g.add_node(20), 1);
        assert_eq!(g.add_node(30), 2);
        assert_eq!(g.source(), Some(0));
        assert_eq!(g.sink(), Some(2));
        assert_eq!(g.id_of(1), 20);
    }

    #[test]
    fn flags_track_edge_data() {
        let mut g = diamond();
        assert!(!g.any_negative_weight());
        assert!(g.all_resources_nonnegative());
        g.add_edge(3, 0, -1.0, vec![-1.0]);
        assert!(g.any_negative_weight());
        assert!(!g.all_resources_nonnegative());
    }

    #[test]
    fn negative_cycle_is_detected_and_cached() {
        let mut g = DiGraph::new(3, 3, 0, 2, 1);
        for id in 0..3 {
            g.add_node(id);
        }
        g.add_edge(0, 1, 1.0, vec![1.0]);
        g.add_edge(1, 2, -3.0, vec![1.0]);
        assert!(!g.has_negative_cycle());
        g.add_edge(2, 1, 1.0, vec![1.0]);
        assert!(g.has_negative_cycle());
        assert!(g.has_negative_cycle());
    }

    #[test]
    #[should_panic(expected = "not a registered vertex")]
    fn unknown_endpoint_panics() {
        let mut g = DiGraph::new(2, 1, 0, 1, 1);
        g.add_node(0);
        g.add_edge(0, 1, 1.0, vec![1.0]);
    }
}
