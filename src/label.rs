//! Partial-path labels and the operations the search performs on them:
//! extension along an edge, feasibility checks, and Pareto dominance.
//!
//! A label is immutable once stored; extension builds a fresh label. In the
//! backward direction the critical resource starts at its upper bound and
//! decreases as the path grows. With the default additive extension, an edge
//! that consumes none of the critical resource still decreases it by one, so
//! that the backward search always makes progress; the consumption reported
//! for a path found backward can therefore exceed a forward replay when such
//! edges exist.

use fixedbitset::FixedBitSet;

use crate::extension::ResourceExtension;
use crate::graph::{DiGraph, Edge, NodeIndex};
use crate::Direction;

/// State of one partial path: its accumulated weight and resources, the
/// vertex it ends at, the vertices it traversed, and (in elementary mode) the
/// vertices it may no longer visit.
///
/// `id` identifies the label within the bucket store of the direction that
/// generated it; it carries no meaning across directions or runs.
#[derive(Clone, Debug)]
pub(crate) struct Label {
    pub id: usize,
    pub weight: f64,
    pub vertex: NodeIndex,
    pub resources: Vec<f64>,
    /// Traversal order: starts at the source going forward, at the sink going
    /// backward.
    pub path: Vec<NodeIndex>,
    /// Vertices this label must not extend to: every vertex already on the
    /// path, plus any vertex a previous extension attempt found infeasible.
    /// `None` unless running in elementary mode.
    pub unreachable: Option<FixedBitSet>,
}

impl Label {
    /// Initial label at `vertex` (the source forward, the sink backward).
    pub(crate) fn origin(
        vertex: NodeIndex,
        direction: Direction,
        critical: usize,
        max_res: &[f64],
        elementary: bool,
        num_nodes: usize,
    ) -> Label {
        let mut resources = vec![0.0; max_res.len()];
        if direction == Direction::Backward {
            resources[critical] = max_res[critical];
        }
        let unreachable = if elementary {
            let mut set = FixedBitSet::with_capacity(num_nodes);
            set.insert(vertex);
            Some(set)
        } else {
            None
        };
        Label {
            id: 0,
            weight: 0.0,
            vertex,
            resources,
            path: vec![vertex],
            unreachable,
        }
    }

    /// Extend this label across `edge`, producing the label at the adjacent
    /// vertex, or `None` if the extension is forbidden or infeasible.
    ///
    /// The upper bound binds every resource component here; the lower bound
    /// binds only the critical one. The remaining lower bounds are settled by
    /// the global feasibility check once a full source-sink path exists, so
    /// that partial paths may pass through resource values that only become
    /// legal after both halves are combined.
    pub(crate) fn extend(
        &self,
        graph: &DiGraph,
        edge: &Edge,
        direction: Direction,
        critical: usize,
        callback: Option<&dyn ResourceExtension>,
        max_res_curr: &[f64],
        min_res_curr: &[f64],
        id: usize,
    ) -> Option<Label> {
        let target = if direction == Direction::Backward {
            edge.tail
        } else {
            edge.head
        };
        if let Some(unreachable) = &self.unreachable {
            if unreachable.contains(target) {
                return None;
            }
        }
        let resources = self.extended_resources(graph, edge, direction, critical, callback)?;
        if resources.len() != max_res_curr.len() {
            return None;
        }
        if resources.iter().zip(max_res_curr).any(|(&r, &max)| r > max) {
            return None;
        }
        if resources[critical] < min_res_curr[critical] {
            return None;
        }
        let mut path = Vec::with_capacity(self.path.len() + 1);
        path.extend_from_slice(&self.path);
        path.push(target);
        let unreachable = self.unreachable.as_ref().map(|set| {
            let mut set = set.clone();
            set.insert(target);
            set
        });
        Some(Label {
            id,
            weight: self.weight + edge.weight,
            vertex: target,
            resources,
            path,
            unreachable,
        })
    }

    fn extended_resources(
        &self,
        graph: &DiGraph,
        edge: &Edge,
        direction: Direction,
        critical: usize,
        callback: Option<&dyn ResourceExtension>,
    ) -> Option<Vec<f64>> {
        match callback {
            Some(callback) => {
                let tail = graph.id_of(edge.tail);
                let head = graph.id_of(edge.head);
                let partial: Vec<usize> = self.path.iter().map(|&v| graph.id_of(v)).collect();
                match direction {
                    Direction::Backward => callback.backward(
                        &self.resources,
                        tail,
                        head,
                        &edge.resources,
                        &partial,
                        self.weight,
                    ),
                    _ => callback.forward(
                        &self.resources,
                        tail,
                        head,
                        &edge.resources,
                        &partial,
                        self.weight,
                    ),
                }
            }
            None => {
                let mut resources: Vec<f64> = self
                    .resources
                    .iter()
                    .zip(&edge.resources)
                    .map(|(&a, &b)| a + b)
                    .collect();
                if direction == Direction::Backward {
                    let consumed = if edge.resources[critical] != 0.0 {
                        edge.resources[critical]
                    } else {
                        1.0
                    };
                    resources[critical] = self.resources[critical] - consumed;
                }
                Some(resources)
            }
        }
    }

    /// Pareto dominance at a shared vertex.
    ///
    /// `self` dominates `other` when it is no worse on weight and on every
    /// resource component (the critical component compares inverted in the
    /// backward direction), no more restricted in elementary mode, and
    /// strictly better somewhere.
    pub(crate) fn dominates(&self, other: &Label, direction: Direction, critical: usize) -> bool {
        if self.weight > other.weight {
            return false;
        }
        let mut strict = self.weight < other.weight;
        for (i, (&a, &b)) in self.resources.iter().zip(&other.resources).enumerate() {
            if direction == Direction::Backward && i == critical {
                if a < b {
                    return false;
                }
                strict |= a > b;
            } else {
                if a > b {
                    return false;
                }
                strict |= a < b;
            }
        }
        if let (Some(a), Some(b)) = (&self.unreachable, &other.unreachable) {
            if !a.is_subset(b) {
                return false;
            }
            strict |= a != b;
        }
        strict
    }

    /// Dominance projected onto a canonical axis: a plain win in `direction`,
    /// or, when neither label dominates the other there, a win in the
    /// opposite direction or on weight alone.
    pub(crate) fn full_dominates(
        &self,
        other: &Label,
        direction: Direction,
        critical: usize,
    ) -> bool {
        if self.dominates(other, direction, critical) {
            return true;
        }
        if other.dominates(self, direction, critical) {
            return false;
        }
        self.dominates(other, direction.opposite(), critical) || self.weight < other.weight
    }

    /// Full box check against the original resource bounds.
    pub(crate) fn feasible(&self, max_res: &[f64], min_res: &[f64]) -> bool {
        self.resources
            .iter()
            .zip(max_res.iter().zip(min_res))
            .all(|(&r, (&max, &min))| r >= min && r <= max)
    }

    /// Reorient a backward label onto the forward axis: the path is reversed
    /// and the critical component returns from its inverted scale.
    pub(crate) fn into_forward_oriented(mut self, critical: usize, max_res_critical: f64) -> Label {
        self.path.reverse();
        self.resources[critical] = max_res_critical - self.resources[critical];
        if let Some(&last) = self.path.last() {
            self.vertex = last;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(weight: f64, resources: Vec<f64>) -> Label {
        Label {
            id: 0,
            weight,
            vertex: 0,
            resources,
            path: vec![0],
            unreachable: None,
        }
    }

    fn tiny_graph() -> DiGraph {
        let mut g = DiGraph::new(2, 1, 0, 1, 2);
        g.add_node(0);
        g.add_node(1);
        g.add_edge(0, 1, 2.0, vec![1.0, 3.0]);
        g
    }

    #[test]
    fn forward_dominance_needs_every_component() {
        let a = label(1.0, vec![1.0, 1.0]);
        let b = label(2.0, vec![2.0, 2.0]);
        let c = label(0.5, vec![3.0, 0.0]);
        assert!(a.dominates(&b, Direction::Forward, 0));
        assert!(!b.dominates(&a, Direction::Forward, 0));
        assert!(!a.dominates(&c, Direction::Forward, 0));
        assert!(!c.dominates(&a, Direction::Forward, 0));
    }

    #[test]
    fn equal_labels_do_not_dominate() {
        let a = label(1.0, vec![1.0, 1.0]);
        let b = label(1.0, vec![1.0, 1.0]);
        assert!(!a.dominates(&b, Direction::Forward, 0));
        assert!(!b.dominates(&a, Direction::Forward, 0));
    }

    #[test]
    fn backward_dominance_flips_the_critical_component() {
        // Backward labels consume the critical resource downwards, so the
        // larger remaining value is the better one.
        let a = label(1.0, vec![5.0, 1.0]);
        let b = label(1.0, vec![3.0, 1.0]);
        assert!(a.dominates(&b, Direction::Backward, 0));
        assert!(!a.dominates(&b, Direction::Forward, 0));
    }

    #[test]
    fn elementary_dominance_requires_subset() {
        let mut a = label(1.0, vec![1.0]);
        let mut b = label(2.0, vec![2.0]);
        let mut set_a = FixedBitSet::with_capacity(4);
        set_a.insert(0);
        set_a.insert(2);
        let mut set_b = FixedBitSet::with_capacity(4);
        set_b.insert(0);
        a.unreachable = Some(set_a.clone());
        b.unreachable = Some(set_b.clone());
        assert!(!a.dominates(&b, Direction::Forward, 0));
        a.unreachable = Some(set_b);
        b.unreachable = Some(set_a);
        assert!(a.dominates(&b, Direction::Forward, 0));
    }

    #[test]
    fn full_dominance_falls_back_to_weight() {
        let a = label(1.0, vec![2.0, 1.0]);
        let b = label(2.0, vec![1.0, 2.0]);
        assert!(!a.dominates(&b, Direction::Forward, 0));
        assert!(!b.dominates(&a, Direction::Forward, 0));
        assert!(a.full_dominates(&b, Direction::Forward, 0));
        assert!(!b.full_dominates(&a, Direction::Forward, 0));
    }

    #[test]
    fn extension_accumulates_and_respects_the_upper_bound() {
        let g = tiny_graph();
        let edge = &g.raw_edges()[0];
        let origin = Label::origin(0, Direction::Forward, 0, &[4.0, 20.0], false, 2);
        let extended = origin
            .extend(&g, edge, Direction::Forward, 0, None, &[4.0, 20.0], &[0.0, 0.0], 1)
            .unwrap();
        assert_eq!(extended.vertex, 1);
        assert_eq!(extended.weight, 2.0);
        assert_eq!(extended.resources, vec![1.0, 3.0]);
        assert_eq!(extended.path, vec![0, 1]);

        assert!(origin
            .extend(&g, edge, Direction::Forward, 0, None, &[4.0, 2.0], &[0.0, 0.0], 1)
            .is_none());
    }

    #[test]
    fn minimum_bound_is_soft_outside_the_critical_component() {
        let g = tiny_graph();
        let edge = &g.raw_edges()[0];
        let origin = Label::origin(0, Direction::Forward, 0, &[4.0, 20.0], false, 2);
        // second component ends below its lower bound: allowed during extension
        let extended = origin.extend(
            &g,
            edge,
            Direction::Forward,
            0,
            None,
            &[4.0, 20.0],
            &[0.0, 5.0],
            1,
        );
        assert!(extended.is_some());
        // critical component below its lower bound: rejected
        let rejected = origin.extend(
            &g,
            edge,
            Direction::Forward,
            0,
            None,
            &[4.0, 20.0],
            &[2.0, 0.0],
            1,
        );
        assert!(rejected.is_none());
    }

    #[test]
    fn backward_extension_decrements_the_critical_component() {
        let g = tiny_graph();
        let edge = &g.raw_edges()[0];
        let origin = Label::origin(1, Direction::Backward, 0, &[4.0, 20.0], false, 2);
        assert_eq!(origin.resources, vec![4.0, 0.0]);
        let extended = origin
            .extend(&g, edge, Direction::Backward, 0, None, &[4.0, 20.0], &[0.0, 0.0], 1)
            .unwrap();
        assert_eq!(extended.vertex, 0);
        assert_eq!(extended.resources, vec![3.0, 3.0]);
        assert_eq!(extended.path, vec![1, 0]);
    }

    #[test]
    fn backward_zero_consumption_still_counts_a_step() {
        let mut g = DiGraph::new(2, 1, 0, 1, 1);
        g.add_node(0);
        g.add_node(1);
        g.add_edge(0, 1, 0.0, vec![0.0]);
        let edge = &g.raw_edges()[0];
        let origin = Label::origin(1, Direction::Backward, 0, &[5.0], false, 2);
        let extended = origin
            .extend(&g, edge, Direction::Backward, 0, None, &[5.0], &[0.0], 1)
            .unwrap();
        assert_eq!(extended.resources, vec![4.0]);
    }

    #[test]
    fn elementary_extension_blocks_marked_vertices() {
        let g = tiny_graph();
        let edge = &g.raw_edges()[0];
        let mut origin = Label::origin(0, Direction::Forward, 0, &[4.0, 20.0], true, 2);
        if let Some(set) = origin.unreachable.as_mut() {
            set.insert(1);
        }
        assert!(origin
            .extend(&g, edge, Direction::Forward, 0, None, &[4.0, 20.0], &[0.0, 0.0], 1)
            .is_none());
    }

    #[test]
    fn reorientation_restores_the_forward_scale() {
        let backward = Label {
            id: 0,
            weight: -2.0,
            vertex: 0,
            resources: vec![1.0, 7.0],
            path: vec![3, 2, 0],
            unreachable: None,
        };
        let forward = backward.into_forward_oriented(0, 4.0);
        assert_eq!(forward.path, vec![0, 2, 3]);
        assert_eq!(forward.resources, vec![3.0, 7.0]);
        assert_eq!(forward.vertex, 3);
        assert_eq!(forward.weight, -2.0);
    }
}
