//! Per-vertex Pareto buckets for one search direction.

use hashbrown::HashSet;
use indexmap::IndexSet;

use crate::graph::NodeIndex;
use crate::label::Label;
use crate::Direction;

/// Stores, per vertex, the mutually non-dominated labels seen so far, the
/// least weight among them, and the set of vertices with a non-empty bucket.
///
/// The unprocessed heap references labels by id; a label removed here after
/// being dominated is skipped when the heap later pops it (lazy deletion).
pub(crate) struct Buckets {
    direction: Direction,
    critical: usize,
    buckets: Vec<Vec<Label>>,
    best_weight: Vec<f64>,
    visited: IndexSet<NodeIndex>,
    alive: HashSet<usize>,
}

impl Buckets {
    pub(crate) fn new(num_nodes: usize, direction: Direction, critical: usize) -> Self {
        Buckets {
            direction,
            critical,
            buckets: vec![Vec::new(); num_nodes],
            best_weight: vec![f64::INFINITY; num_nodes],
            visited: IndexSet::new(),
            alive: HashSet::new(),
        }
    }

    /// Insert `label` into the bucket at its vertex.
    ///
    /// Returns `false` (dropping the label) if an existing bucket member
    /// dominates it; otherwise removes every member the new label dominates
    /// and stores it.
    pub(crate) fn insert(&mut self, label: Label) -> bool {
        let Buckets {
            direction,
            critical,
            buckets,
            best_weight,
            visited,
            alive,
        } = self;
        let vertex = label.vertex;
        let bucket = &mut buckets[vertex];
        if bucket
            .iter()
            .any(|member| member.dominates(&label, *direction, *critical))
        {
            return false;
        }
        bucket.retain(|member| {
            if label.dominates(member, *direction, *critical) {
                alive.remove(&member.id);
                false
            } else {
                true
            }
        });
        best_weight[vertex] = best_weight[vertex].min(label.weight);
        alive.insert(label.id);
        visited.insert(vertex);
        bucket.push(label);
        true
    }

    /// Whether the label with this id is still stored (not yet dominated).
    pub(crate) fn is_alive(&self, id: usize) -> bool {
        self.alive.contains(&id)
    }

    pub(crate) fn bucket(&self, vertex: NodeIndex) -> &[Label] {
        &self.buckets[vertex]
    }

    /// Least weight ever stored at `vertex`; `+inf` when never visited.
    pub(crate) fn best_weight(&self, vertex: NodeIndex) -> f64 {
        self.best_weight[vertex]
    }

    /// Vertices with a non-empty bucket, in first-visit order.
    pub(crate) fn visited(&self) -> &IndexSet<NodeIndex> {
        &self.visited
    }
}
