//! Preprocessing passes that run before the labelling search: weight-only
//! shortest distances (lower bounds for pruning, negative-cycle detection)
//! and critical-resource selection.

use crate::graph::{DiGraph, Edge, NodeIndex};

/// A cycle of negative total cost was found while relaxing.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct NegativeCycle(pub(crate) ());

/// Bellman-Ford from `origin` under an arbitrary edge cost, optionally on
/// the reversed graph.
///
/// Returns one distance per vertex (`+inf` where unreachable), or
/// [`NegativeCycle`] if a cycle of negative total cost is reachable from
/// `origin`.
pub(crate) fn shortest_distances<F>(
    graph: &DiGraph,
    origin: NodeIndex,
    reverse: bool,
    mut edge_cost: F,
) -> Result<Vec<f64>, NegativeCycle>
where
    F: FnMut(&Edge) -> f64,
{
    let endpoints = |edge: &Edge| {
        if reverse {
            (edge.head, edge.tail)
        } else {
            (edge.tail, edge.head)
        }
    };
    let mut distances = vec![f64::INFINITY; graph.node_count()];
    distances[origin] = 0.0;

    // relax up to |V| - 1 times, stopping early once no distance moves
    for _ in 1..graph.node_count() {
        let mut did_update = false;
        for edge in graph.raw_edges() {
            let (from, to) = endpoints(edge);
            let next = distances[from] + edge_cost(edge);
            if next < distances[to] {
                distances[to] = next;
                did_update = true;
            }
        }
        if !did_update {
            break;
        }
    }

    for edge in graph.raw_edges() {
        let (from, to) = endpoints(edge);
        if distances[from] + edge_cost(edge) < distances[to] {
            return Err(NegativeCycle(()));
        }
    }

    Ok(distances)
}

/// Weight-only shortest distance from every vertex to the sink, used to
/// prune forward labels against the primal bound.
pub(crate) fn distances_to_sink(
    graph: &DiGraph,
    sink: NodeIndex,
) -> Result<Vec<f64>, NegativeCycle> {
    shortest_distances(graph, sink, true, |edge| edge.weight)
}

/// Weight-only shortest distance from the source to every vertex, used to
/// prune backward labels against the primal bound.
pub(crate) fn distances_from_source(
    graph: &DiGraph,
    source: NodeIndex,
) -> Result<Vec<f64>, NegativeCycle> {
    shortest_distances(graph, source, false, |edge| edge.weight)
}

/// Pick the resource whose shortest source-sink accumulation sits closest to
/// (or furthest past) its upper bound; the heap and the halfway split then
/// operate on the tightest resource.
///
/// Resources whose metric admits a negative cycle or cannot reach the sink
/// are skipped. Returns `None` when every resource is skipped.
pub(crate) fn select_critical_resource(
    graph: &DiGraph,
    source: NodeIndex,
    sink: NodeIndex,
    max_res: &[f64],
) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for index in 0..graph.num_resources() {
        let distances =
            match shortest_distances(graph, source, false, |edge| edge.resources[index]) {
                Ok(distances) => distances,
                Err(NegativeCycle(())) => continue,
            };
        if !distances[sink].is_finite() {
            continue;
        }
        let tightness = distances[sink].abs() - max_res[index];
        if best.map_or(true, |(_, t)| tightness > t) {
            best = Some((index, tightness));
        }
    }
    best.map(|(index, _)| index)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> DiGraph {
        let mut g = DiGraph::new(4, 4, 0, 3, 2);
        for id in 0..4 {
            g.add_node(id);
        }
        g.add_edge(0, 1, 1.0, vec![1.0, 4.0]);
        g.add_edge(1, 2, -2.0, vec![1.0, 4.0]);
        g.add_edge(2, 3, 3.0, vec![1.0, 4.0]);
        g.add_edge(0, 3, 5.0, vec![3.0, 20.0]);
        g
    }

    #[test]
    fn distances_follow_edge_direction() {
        let g = chain();
        let from_source = distances_from_source(&g, 0).unwrap();
        assert_eq!(from_source, vec![0.0, 1.0, -1.0, 2.0]);
        let to_sink = distances_to_sink(&g, 3).unwrap();
        assert_eq!(to_sink, vec![2.0, 1.0, 3.0, 0.0]);
    }

    #[test]
    fn unreachable_vertices_stay_infinite() {
        let mut g = DiGraph::new(3, 1, 0, 2, 1);
        for id in 0..3 {
            g.add_node(id);
        }
        g.add_edge(0, 1, 1.0, vec![1.0]);
        let distances = distances_from_source(&g, 0).unwrap();
        assert_eq!(distances[1], 1.0);
        assert!(distances[2].is_infinite());
    }

    #[test]
    fn negative_cycle_is_reported() {
        let mut g = DiGraph::new(3, 3, 0, 2, 1);
        for id in 0..3 {
            g.add_node(id);
        }
        g.add_edge(0, 1, 1.0, vec![1.0]);
        g.add_edge(1, 0, -2.0, vec![1.0]);
        g.add_edge(1, 2, 1.0, vec![1.0]);
        assert!(distances_from_source(&g, 0).is_err());
    }

    #[test]
    fn critical_resource_prefers_the_tightest_metric() {
        // resource 0 accumulates 3 against a bound of 10, resource 1
        // accumulates 12 against a bound of 13: resource 1 is tighter
        let g = chain();
        assert_eq!(select_critical_resource(&g, 0, 3, &[10.0, 13.0]), Some(1));
        // loosening resource 1 flips the choice
        assert_eq!(select_critical_resource(&g, 0, 3, &[2.0, 100.0]), Some(0));
    }
}
