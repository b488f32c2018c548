//! One direction of the labelling search.
//!
//! Each [`Search`] owns its unprocessed heap, its Pareto buckets and its
//! best source-sink label so far; the orchestrator interleaves calls to
//! [`Search::step`] and shares the halfway vectors and the primal bound
//! between the two directions through a [`StepContext`].

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::bucket::Buckets;
use crate::extension::ResourceExtension;
use crate::graph::{DiGraph, NodeIndex};
use crate::label::Label;
use crate::Direction;

/// Shared, per-step view of the solver state. The halfway vectors and the
/// primal bound are the only state exchanged between directions; both move
/// monotonically, so the interleaving order never changes the answer.
pub(crate) struct StepContext<'a> {
    pub graph: &'a DiGraph,
    pub source: NodeIndex,
    pub sink: NodeIndex,
    pub critical: usize,
    pub max_res: &'a [f64],
    pub min_res: &'a [f64],
    pub max_res_curr: &'a mut [f64],
    pub min_res_curr: &'a mut [f64],
    pub elementary: bool,
    pub callback: Option<&'a dyn ResourceExtension>,
    /// Remaining-weight bounds for this direction, when pruning is on.
    pub lower_bound: Option<&'a [f64]>,
    pub primal_bound: &'a mut f64,
    pub bidirectional: bool,
}

pub(crate) struct Search {
    pub direction: Direction,
    heap: BinaryHeap<QueuedLabel>,
    pub buckets: Buckets,
    /// Best globally feasible source-sink label found by this direction,
    /// kept in forward orientation.
    pub intermediate: Option<Label>,
    pub stopped: bool,
    pub processed: usize,
    pub generated: usize,
    next_id: usize,
}

impl Search {
    /// Seed the direction with its initial label at `origin` (the source
    /// forward, the sink backward).
    pub(crate) fn new(
        direction: Direction,
        graph: &DiGraph,
        origin: NodeIndex,
        critical: usize,
        max_res: &[f64],
        elementary: bool,
    ) -> Self {
        let label = Label::origin(
            origin,
            direction,
            critical,
            max_res,
            elementary,
            graph.node_count(),
        );
        let mut buckets = Buckets::new(graph.node_count(), direction, critical);
        let mut heap = BinaryHeap::new();
        buckets.insert(label.clone());
        heap.push(QueuedLabel::new(direction, critical, label));
        Search {
            direction,
            heap,
            buckets,
            intermediate: None,
            stopped: false,
            processed: 0,
            generated: 1,
            next_id: 1,
        }
    }

    /// Labels waiting in the unprocessed heap (stale entries included).
    pub(crate) fn unprocessed(&self) -> usize {
        self.heap.len()
    }

    /// Advance this direction by one label.
    ///
    /// Pops the next unprocessed label, tightens the halfway split, stops if
    /// the label overshot the opposite direction's territory, otherwise
    /// extends it along every adjacent edge and records it as the new best
    /// source-sink label when it completes a feasible path.
    pub(crate) fn step(&mut self, ctx: &mut StepContext<'_>) {
        let mut current = loop {
            match self.heap.pop() {
                Some(entry) => {
                    if self.buckets.is_alive(entry.label.id) {
                        break entry.label;
                    }
                }
                None => {
                    self.stopped = true;
                    return;
                }
            }
        };
        self.processed += 1;

        let graph = ctx.graph;
        let c = ctx.critical;
        let value = current.resources[c];
        if self.direction == Direction::Forward {
            ctx.min_res_curr[c] = ctx.min_res_curr[c].max(value.min(ctx.max_res_curr[c]));
            if ctx.bidirectional && value > ctx.max_res_curr[c] {
                self.stopped = true;
                return;
            }
        } else {
            ctx.max_res_curr[c] = ctx.max_res_curr[c].min(value.max(ctx.min_res_curr[c]));
            if ctx.bidirectional && value < ctx.min_res_curr[c] {
                self.stopped = true;
                return;
            }
        }

        for edge in graph.edges_directed(current.vertex, self.direction) {
            let candidate = current.extend(
                graph,
                edge,
                self.direction,
                c,
                ctx.callback,
                ctx.max_res_curr,
                ctx.min_res_curr,
                self.next_id,
            );
            let candidate = match candidate {
                Some(candidate) => candidate,
                None => {
                    // remember the dead end so later extensions of this
                    // label skip it, and so its descendants inherit the mark
                    if ctx.elementary {
                        let target = if self.direction == Direction::Backward {
                            edge.tail
                        } else {
                            edge.head
                        };
                        if let Some(set) = current.unreachable.as_mut() {
                            set.insert(target);
                        }
                    }
                    continue;
                }
            };
            self.next_id += 1;
            self.generated += 1;
            if let Some(lower_bound) = ctx.lower_bound {
                if ctx.primal_bound.is_finite()
                    && candidate.weight + lower_bound[candidate.vertex] > *ctx.primal_bound
                {
                    continue;
                }
            }
            if self.buckets.insert(candidate.clone()) {
                self.heap
                    .push(QueuedLabel::new(self.direction, c, candidate));
            }
        }

        let terminal = if self.direction == Direction::Forward {
            ctx.sink
        } else {
            ctx.source
        };
        if current.vertex == terminal {
            let candidate = if self.direction == Direction::Forward {
                current
            } else {
                current.into_forward_oriented(c, ctx.max_res[c])
            };
            if candidate.feasible(ctx.max_res, ctx.min_res) {
                let improves = match &self.intermediate {
                    None => true,
                    Some(best) => {
                        candidate.weight < best.weight
                            || candidate.full_dominates(best, Direction::Forward, c)
                    }
                };
                if improves {
                    log::trace!(
                        "{:?} search found a source-sink label of weight {}",
                        self.direction,
                        candidate.weight
                    );
                    *ctx.primal_bound = ctx.primal_bound.min(candidate.weight);
                    self.intermediate = Some(candidate);
                }
            }
        }
    }
}

/// Entry of the unprocessed queue.
///
/// `BinaryHeap` pops its greatest element, so the priority stores the label's
/// critical-resource value negated for the forward search (which consumes
/// labels smallest-first) and as-is for the backward search (largest-first).
/// The order is total so float keys are safe: an entry whose priority is NaN
/// sorts below every other entry and surfaces last.
struct QueuedLabel {
    priority: f64,
    label: Label,
}

impl QueuedLabel {
    fn new(direction: Direction, critical: usize, label: Label) -> Self {
        let value = label.resources[critical];
        let priority = match direction {
            Direction::Backward => value,
            _ => -value,
        };
        QueuedLabel { priority, label }
    }
}

impl PartialEq for QueuedLabel {
    fn eq(&self, other: &QueuedLabel) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueuedLabel {}

impl PartialOrd for QueuedLabel {
    fn partial_cmp(&self, other: &QueuedLabel) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedLabel {
    fn cmp(&self, other: &QueuedLabel) -> Ordering {
        match self.priority.partial_cmp(&other.priority) {
            Some(ordering) => ordering,
            None => match (self.priority.is_nan(), other.priority.is_nan()) {
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                _ => Ordering::Equal,
            },
        }
    }
}
