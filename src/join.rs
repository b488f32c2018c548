//! Reconciliation of forward and backward half-paths.
//!
//! After a bidirectional search ends, every forward label below the locked-in
//! halfway value is paired with every backward label above it across each
//! connecting edge. Candidate pairs run through a ladder of primal-bound
//! prunes before the halves are merged, checked against the full resource
//! box, and deduplicated by their halfway distance, so each distinct path is
//! considered once.

use fixedbitset::FixedBitSet;
use hashbrown::hash_map::Entry;
use hashbrown::HashMap;

use crate::bucket::Buckets;
use crate::extension::ResourceExtension;
use crate::graph::{DiGraph, Edge, NodeIndex};
use crate::label::Label;
use crate::Direction;

pub(crate) struct JoinContext<'a> {
    pub graph: &'a DiGraph,
    pub critical: usize,
    pub max_res: &'a [f64],
    pub min_res: &'a [f64],
    /// Critical-resource value separating forward and backward territory,
    /// locked in when the search ended.
    pub halfway: f64,
    pub elementary: bool,
    pub callback: Option<&'a dyn ResourceExtension>,
    pub source: NodeIndex,
}

/// Merge forward and backward buckets into the single best source-sink
/// label, starting from `best` (the winning per-direction label, if any) and
/// tightening `primal_bound` as better merges are adopted.
pub(crate) fn join_labels(
    ctx: &JoinContext<'_>,
    fwd: &Buckets,
    bwd: &Buckets,
    mut best: Option<Label>,
    primal_bound: &mut f64,
) -> Option<Label> {
    let c = ctx.critical;
    let mut ub = *primal_bound;
    let bwd_min = bwd
        .visited()
        .iter()
        .filter(|&&vertex| vertex != ctx.source)
        .map(|&vertex| bwd.best_weight(vertex))
        .fold(f64::INFINITY, f64::min);

    // smallest halfway distance seen per merged path; a second split point
    // producing the same path is dropped unless it sits closer to the split
    let mut seen: HashMap<Vec<NodeIndex>, f64> = HashMap::new();
    let mut on_path = FixedBitSet::with_capacity(ctx.graph.node_count());
    let mut merged_count = 0usize;

    for &n in fwd.visited() {
        if fwd.best_weight(n) + bwd_min > ub {
            continue;
        }
        for f_label in fwd.bucket(n) {
            if f_label.resources[c] > ctx.halfway || f_label.weight + bwd_min > ub {
                continue;
            }
            if ctx.elementary {
                on_path.clear();
                for &vertex in &f_label.path {
                    on_path.insert(vertex);
                }
            }
            for edge in ctx.graph.out_edges(n) {
                let m = edge.head;
                if m == ctx.source || !bwd.visited().contains(&m) {
                    continue;
                }
                if f_label.weight + edge.weight + bwd.best_weight(m) > ub {
                    continue;
                }
                for b_label in bwd.bucket(m) {
                    if b_label.resources[c] < ctx.halfway {
                        continue;
                    }
                    if f_label.weight + edge.weight + b_label.weight > ub {
                        continue;
                    }
                    if ctx.elementary
                        && b_label.path.iter().any(|&vertex| on_path.contains(vertex))
                    {
                        continue;
                    }
                    let merged = match merge(ctx, f_label, b_label, edge) {
                        Some(merged) => merged,
                        None => continue,
                    };
                    if !merged.feasible(ctx.max_res, ctx.min_res) {
                        continue;
                    }
                    let phi =
                        (f_label.resources[c] - (ctx.max_res[c] - b_label.resources[c])).abs();
                    match seen.entry(merged.path.clone()) {
                        Entry::Occupied(mut entry) => {
                            if *entry.get() < phi {
                                continue;
                            }
                            entry.insert(phi);
                        }
                        Entry::Vacant(entry) => {
                            entry.insert(phi);
                        }
                    }
                    merged_count += 1;
                    let improves = match &best {
                        None => true,
                        Some(best) => {
                            best.weight > merged.weight
                                || merged.full_dominates(best, Direction::Forward, c)
                        }
                    };
                    if improves {
                        ub = ub.min(merged.weight);
                        best = Some(merged);
                    }
                }
            }
        }
    }

    log::debug!(
        "join adopted from {} merged labels at halfway {}",
        merged_count,
        ctx.halfway
    );
    *primal_bound = ub;
    best
}

/// Concatenate a forward and a backward half across `edge` and combine their
/// resources.
///
/// With the default extension the backward vector is reoriented (critical
/// component inverted against its upper bound) and the forward-side
/// accumulation over the edge is added. A custom join callback's result is
/// used as-is apart from the critical component, which is corrected when the
/// callback did not account for the backward half's inverted scale.
fn merge(
    ctx: &JoinContext<'_>,
    f_label: &Label,
    b_label: &Label,
    edge: &Edge,
) -> Option<Label> {
    let c = ctx.critical;
    let dimension = ctx.max_res.len();
    let resources = match ctx.callback {
        Some(callback) => {
            let mut resources = callback.join(
                &f_label.resources,
                &b_label.resources,
                ctx.graph.id_of(edge.tail),
                ctx.graph.id_of(edge.head),
                &edge.resources,
            )?;
            if resources.len() != dimension {
                return None;
            }
            let expected = f_label.resources[c]
                + edge.resources[c]
                + (ctx.max_res[c] - b_label.resources[c]);
            if resources[c] != expected {
                resources[c] = expected;
            }
            resources
        }
        None => {
            let mut resources = b_label.resources.clone();
            resources[c] = ctx.max_res[c] - resources[c];
            for (i, value) in resources.iter_mut().enumerate() {
                *value += f_label.resources[i] + edge.resources[i];
            }
            resources
        }
    };
    let mut path = f_label.path.clone();
    path.extend(b_label.path.iter().rev());
    let unreachable = match (&f_label.unreachable, &b_label.unreachable) {
        (Some(a), Some(b)) => {
            let mut set = a.clone();
            set.union_with(b);
            Some(set)
        }
        _ => None,
    };
    let vertex = path[path.len() - 1];
    Some(Label {
        id: 0,
        weight: f_label.weight + edge.weight + b_label.weight,
        vertex,
        resources,
        path,
        unreachable,
    })
}
