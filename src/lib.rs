//! **rcsp** solves the resource constrained shortest path problem: given a
//! directed graph whose edges carry a weight and a vector of resource
//! consumptions, find a minimum-weight path from a source vertex to a sink
//! vertex whose accumulated resources stay inside per-resource lower and
//! upper bounds.
//!
//! The solver is a bidirectional dynamic-programming labelling algorithm.
//! Partial paths are represented as labels kept in per-vertex Pareto buckets;
//! forward and backward searches advance alternately, each bounded by a
//! halfway point on a *critical* resource that tightens monotonically from
//! both sides, and a join step reconciles the two half-paths into the single
//! best source-to-sink path.
//!
//! Optional behaviour is configured on [`BiDirectional`] before calling
//! [`run`](BiDirectional::run): single-direction search, elementary (simple)
//! paths, lower-bound pruning, automatic critical-resource selection, a
//! wall-clock time limit, an early-exit cost threshold, and custom resource
//! extension callbacks through the [`ResourceExtension`] trait.
//!
//! # Example
//! ```rust
//! use rcsp::BiDirectional;
//!
//! // Two resources: the first is bounded by 4.0, the second by 20.0.
//! let mut alg = BiDirectional::new(5, 5, 0, 4, vec![4.0, 20.0], vec![0.0, 0.0]);
//! alg.add_nodes(0..5);
//! alg.add_edge(0, 1, -1.0, vec![1.0, 2.0]);
//! alg.add_edge(1, 2, -1.0, vec![1.0, 0.3]);
//! alg.add_edge(2, 3, -10.0, vec![1.0, 3.0]);
//! alg.add_edge(2, 4, 10.0, vec![1.0, 2.0]);
//! alg.add_edge(3, 4, -1.0, vec![1.0, 10.0]);
//! alg.run();
//!
//! assert_eq!(alg.path(), vec![0, 1, 2, 3, 4]);
//! assert_eq!(alg.total_cost(), -13.0);
//! ```
//!
//! Infeasibility is not an error: if no path fits in the resource box the
//! solver returns an empty path and a total cost of `f64::INFINITY`.

mod bucket;
mod extension;
mod graph;
mod join;
mod label;
mod preprocess;
mod search;
mod solver;

pub use crate::extension::ResourceExtension;
pub use crate::graph::{DiGraph, Edge, NodeIndex};
pub use crate::solver::BiDirectional;

/// Direction of graph traversal.
///
/// `Both` runs the forward and the backward search together and joins their
/// half-paths; the single-direction variants run one search to exhaustion.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Extend labels from the source along outgoing edges.
    Forward,
    /// Extend labels from the sink along incoming edges.
    Backward,
    /// Run both searches, interleaved according to a [`SelectionMethod`].
    Both,
}

impl Direction {
    #[inline]
    pub(crate) fn opposite(self) -> Direction {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
            Direction::Both => Direction::Both,
        }
    }
}

/// Policy used to pick which search advances next when both are active.
///
/// The choice affects performance only, never the returned path.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SelectionMethod {
    /// Advance the direction with the smaller unprocessed-label queue.
    Unprocessed,
    /// Advance the direction that has processed fewer labels.
    Processed,
    /// Advance the direction that has generated fewer labels.
    Generated,
}
