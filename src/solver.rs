//! The solver facade: graph population, configuration, the main loop that
//! interleaves the two searches, and post-processing into a single path.

use std::time::{Duration, Instant};

use crate::extension::ResourceExtension;
use crate::graph::{DiGraph, NodeIndex};
use crate::join::{self, JoinContext};
use crate::label::Label;
use crate::preprocess;
use crate::search::{Search, StepContext};
use crate::{Direction, SelectionMethod};

/// Bidirectional labelling solver for resource constrained shortest paths.
///
/// Populate the graph with [`add_nodes`](BiDirectional::add_nodes) and
/// [`add_edge`](BiDirectional::add_edge), optionally adjust the
/// configuration, then call [`run`](BiDirectional::run) and read the result
/// through [`path`](BiDirectional::path),
/// [`total_cost`](BiDirectional::total_cost) and
/// [`consumed_resources`](BiDirectional::consumed_resources).
///
/// Running never fails: when no source-sink path fits the resource box the
/// path is empty and the cost is `f64::INFINITY`.
pub struct BiDirectional {
    graph: DiGraph,
    max_res: Vec<f64>,
    min_res: Vec<f64>,
    direction: Direction,
    method: SelectionMethod,
    elementary: bool,
    bounds_pruning: bool,
    find_critical_res: bool,
    critical_res: usize,
    time_limit: Option<Duration>,
    threshold: Option<f64>,
    callback: Option<Box<dyn ResourceExtension>>,
    final_label: Option<Label>,
}

impl BiDirectional {
    /// Allocate a solver for a graph of roughly `num_nodes` vertices and
    /// `num_edges` edges (capacity hints), with resource consumption bounded
    /// component-wise by `min_res` and `max_res`.
    ///
    /// `source_id` and `sink_id` are user-facing vertex ids; they take effect
    /// once registered through [`add_nodes`](BiDirectional::add_nodes).
    ///
    /// # Panics
    /// Panics if `max_res` is empty or the bound vectors differ in length.
    pub fn new(
        num_nodes: usize,
        num_edges: usize,
        source_id: usize,
        sink_id: usize,
        max_res: Vec<f64>,
        min_res: Vec<f64>,
    ) -> Self {
        assert!(!max_res.is_empty(), "at least one resource is required");
        assert_eq!(
            max_res.len(),
            min_res.len(),
            "max_res and min_res must have the same length"
        );
        let graph = DiGraph::new(num_nodes, num_edges, source_id, sink_id, max_res.len());
        BiDirectional {
            graph,
            max_res,
            min_res,
            direction: Direction::Both,
            method: SelectionMethod::Unprocessed,
            elementary: false,
            bounds_pruning: false,
            find_critical_res: false,
            critical_res: 0,
            time_limit: None,
            threshold: None,
            callback: None,
            final_label: None,
        }
    }

    /// Register vertices by user-facing id. Ids already registered are kept.
    pub fn add_nodes(&mut self, ids: impl IntoIterator<Item = usize>) {
        for id in ids {
            self.graph.add_node(id);
        }
    }

    /// Add a directed edge with a weight and one consumption per resource.
    ///
    /// # Panics
    /// Panics if either endpoint was not registered or `resources` has the
    /// wrong length.
    pub fn add_edge(&mut self, tail_id: usize, head_id: usize, weight: f64, resources: Vec<f64>) {
        self.graph.add_edge(tail_id, head_id, weight, resources);
    }

    /// The populated graph.
    pub fn graph(&self) -> &DiGraph {
        &self.graph
    }

    /// Search direction (default [`Direction::Both`]).
    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }

    /// Interleaving policy for bidirectional runs (default
    /// [`SelectionMethod::Unprocessed`]).
    pub fn set_method(&mut self, method: SelectionMethod) {
        self.method = method;
    }

    /// Enforce simple paths (no vertex visited twice). Default `false`.
    ///
    /// When the graph has no negative cycle, all resources are non-negative,
    /// all lower bounds are zero and no custom extension is registered, the
    /// flag is relaxed automatically: every optimal path is then simple
    /// anyway. The relaxation is logged at `info` level.
    pub fn set_elementary(&mut self, elementary: bool) {
        self.elementary = elementary;
    }

    /// Prune labels that cannot beat the best known path, using weight-only
    /// shortest-path bounds computed upfront. Default `false`.
    pub fn set_bounds_pruning(&mut self, bounds_pruning: bool) {
        self.bounds_pruning = bounds_pruning;
    }

    /// Let preprocessing pick the critical resource instead of
    /// [`set_critical_res`](BiDirectional::set_critical_res). Default `false`.
    pub fn set_find_critical_res(&mut self, find_critical_res: bool) {
        self.find_critical_res = find_critical_res;
    }

    /// Index of the resource the heaps and the halfway split operate on.
    /// Default `0`.
    ///
    /// # Panics
    /// Panics if `index` is not a valid resource index.
    pub fn set_critical_res(&mut self, index: usize) {
        assert!(
            index < self.max_res.len(),
            "critical resource index {} out of range ({} resources)",
            index,
            self.max_res.len()
        );
        self.critical_res = index;
    }

    /// Abort the search once this much wall-clock time has elapsed,
    /// returning the best path found so far.
    pub fn set_time_limit(&mut self, limit: Duration) {
        self.time_limit = Some(limit);
    }

    /// Stop as soon as any direction finds a source-sink path of at most
    /// this cost and return it, skipping the join. The returned path is not
    /// necessarily optimal.
    pub fn set_threshold(&mut self, threshold: f64) {
        self.threshold = Some(threshold);
    }

    /// Replace the additive resource accumulation with custom extension
    /// callbacks.
    pub fn set_ref_callback(&mut self, callback: impl ResourceExtension + 'static) {
        self.callback = Some(Box::new(callback));
    }

    /// Execute the search once.
    ///
    /// Re-running the same configured instance repeats the computation from
    /// scratch and yields the same result.
    ///
    /// # Panics
    /// Panics if the source or sink id was never registered.
    ///
    /// # Example
    /// ```rust
    /// use rcsp::BiDirectional;
    ///
    /// let mut alg = BiDirectional::new(3, 2, 0, 2, vec![10.0], vec![0.0]);
    /// alg.add_nodes(0..3);
    /// alg.add_edge(0, 1, 1.0, vec![4.0]);
    /// alg.add_edge(1, 2, 2.0, vec![4.0]);
    /// alg.run();
    ///
    /// assert_eq!(alg.path(), vec![0, 1, 2]);
    /// assert_eq!(alg.total_cost(), 3.0);
    /// assert_eq!(alg.consumed_resources(), vec![8.0]);
    /// ```
    pub fn run(&mut self) {
        let started = Instant::now();
        let source = match self.graph.source() {
            Some(source) => source,
            None => panic!("run: the source id was never registered with add_nodes"),
        };
        let sink = match self.graph.sink() {
            Some(sink) => sink,
            None => panic!("run: the sink id was never registered with add_nodes"),
        };
        self.final_label = None;

        let critical = self.pick_critical(source, sink);
        let elementary = self.effective_elementary();
        let bidirectional = self.direction == Direction::Both;
        log::debug!(
            "run: {} vertices, {} edges, direction {:?}, critical resource {}, elementary {}",
            self.graph.node_count(),
            self.graph.edge_count(),
            self.direction,
            critical,
            elementary
        );

        let to_sink = if self.bounds_pruning && self.direction != Direction::Backward {
            match preprocess::distances_to_sink(&self.graph, sink) {
                Ok(distances) => Some(distances),
                Err(_) => {
                    log::debug!("forward bounds pruning disabled: negative cycle");
                    None
                }
            }
        } else {
            None
        };
        let from_source = if self.bounds_pruning && self.direction != Direction::Forward {
            match preprocess::distances_from_source(&self.graph, source) {
                Ok(distances) => Some(distances),
                Err(_) => {
                    log::debug!("backward bounds pruning disabled: negative cycle");
                    None
                }
            }
        } else {
            None
        };

        let mut fwd = (self.direction != Direction::Backward).then(|| {
            Search::new(
                Direction::Forward,
                &self.graph,
                source,
                critical,
                &self.max_res,
                elementary,
            )
        });
        let mut bwd = (self.direction != Direction::Forward).then(|| {
            Search::new(
                Direction::Backward,
                &self.graph,
                sink,
                critical,
                &self.max_res,
                elementary,
            )
        });

        let mut max_res_curr = self.max_res.clone();
        let mut min_res_curr = self.min_res.clone();
        let mut primal_bound = f64::INFINITY;
        let mut early: Option<Label> = None;

        loop {
            let fwd_active = fwd.as_ref().map_or(false, |search| !search.stopped);
            let bwd_active = bwd.as_ref().map_or(false, |search| !search.stopped);
            if !fwd_active && !bwd_active {
                break;
            }
            if let Some(limit) = self.time_limit {
                if started.elapsed() >= limit {
                    log::warn!("time limit {:?} reached, returning best so far", limit);
                    break;
                }
            }
            let step_forward = match (fwd.as_ref(), bwd.as_ref()) {
                (Some(f), Some(b)) if fwd_active && bwd_active => {
                    // ties go forward
                    self.measure(f) <= self.measure(b)
                }
                _ => fwd_active,
            };
            let search = if step_forward {
                fwd.as_mut()
            } else {
                bwd.as_mut()
            };
            let Some(search) = search else { break };
            let lower_bound = match search.direction {
                Direction::Backward => from_source.as_deref(),
                _ => to_sink.as_deref(),
            };
            let mut ctx = StepContext {
                graph: &self.graph,
                source,
                sink,
                critical,
                max_res: &self.max_res,
                min_res: &self.min_res,
                max_res_curr: &mut max_res_curr,
                min_res_curr: &mut min_res_curr,
                elementary,
                callback: self.callback.as_deref(),
                lower_bound,
                primal_bound: &mut primal_bound,
                bidirectional,
            };
            search.step(&mut ctx);
            if let (Some(threshold), Some(best)) = (self.threshold, &search.intermediate) {
                if best.weight <= threshold {
                    log::debug!(
                        "cost {} meets threshold {}, terminating early",
                        best.weight,
                        threshold
                    );
                    early = Some(best.clone());
                    break;
                }
            }
        }

        if let Some(search) = &fwd {
            log::debug!(
                "forward search processed {} of {} generated labels",
                search.processed,
                search.generated
            );
        }
        if let Some(search) = &bwd {
            log::debug!(
                "backward search processed {} of {} generated labels",
                search.processed,
                search.generated
            );
        }

        self.final_label = if early.is_some() {
            early
        } else {
            let fwd_best = fwd.as_ref().and_then(|search| search.intermediate.clone());
            let bwd_best = bwd.as_ref().and_then(|search| search.intermediate.clone());
            let mut best = match (fwd_best, bwd_best) {
                (Some(f), Some(b)) => {
                    if b.weight < f.weight || b.full_dominates(&f, Direction::Forward, critical) {
                        Some(b)
                    } else {
                        Some(f)
                    }
                }
                (f, b) => f.or(b),
            };
            if let (Some(f), Some(b)) = (&fwd, &bwd) {
                let halfway = max_res_curr[critical].min(min_res_curr[critical]);
                let ctx = JoinContext {
                    graph: &self.graph,
                    critical,
                    max_res: &self.max_res,
                    min_res: &self.min_res,
                    halfway,
                    elementary,
                    callback: self.callback.as_deref(),
                    source,
                };
                best = join::join_labels(&ctx, &f.buckets, &b.buckets, best, &mut primal_bound);
            }
            best
        };

        match &self.final_label {
            Some(label) => log::debug!("finished: cost {}", label.weight),
            None => log::debug!("finished: no feasible path"),
        }
    }

    /// Vertex ids of the best path found, source first; empty when no
    /// feasible path exists or [`run`](BiDirectional::run) has not been
    /// called.
    pub fn path(&self) -> Vec<usize> {
        match &self.final_label {
            Some(label) => label
                .path
                .iter()
                .map(|&vertex| self.graph.id_of(vertex))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Weight of the best path, or `f64::INFINITY` when there is none.
    pub fn total_cost(&self) -> f64 {
        self.final_label
            .as_ref()
            .map_or(f64::INFINITY, |label| label.weight)
    }

    /// Accumulated resources of the best path; empty when there is none.
    pub fn consumed_resources(&self) -> Vec<f64> {
        self.final_label
            .as_ref()
            .map(|label| label.resources.clone())
            .unwrap_or_default()
    }

    fn measure(&self, search: &Search) -> usize {
        match self.method {
            SelectionMethod::Unprocessed => search.unprocessed(),
            SelectionMethod::Processed => search.processed,
            SelectionMethod::Generated => search.generated,
        }
    }

    fn pick_critical(&self, source: NodeIndex, sink: NodeIndex) -> usize {
        if !self.find_critical_res {
            return self.critical_res;
        }
        match preprocess::select_critical_resource(&self.graph, source, sink, &self.max_res) {
            Some(index) => {
                log::info!("critical resource selected: index {}", index);
                index
            }
            None => self.critical_res,
        }
    }

    fn effective_elementary(&self) -> bool {
        if !self.elementary {
            return false;
        }
        let relaxable = self.callback.is_none()
            && self.min_res.iter().all(|&bound| bound == 0.0)
            && self.graph.all_resources_nonnegative()
            && !self.graph.has_negative_cycle();
        if relaxable {
            log::info!(
                "relaxing the elementary flag: without negative cycles every optimal path is simple"
            );
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elementary_is_relaxed_only_on_benign_instances() {
        let mut alg = BiDirectional::new(3, 2, 0, 2, vec![5.0], vec![0.0]);
        alg.add_nodes(0..3);
        alg.add_edge(0, 1, 1.0, vec![1.0]);
        alg.add_edge(1, 2, 1.0, vec![1.0]);
        alg.set_elementary(true);
        assert!(!alg.effective_elementary());

        // a negative cycle keeps the flag
        alg.add_edge(1, 1, -1.0, vec![1.0]);
        assert!(alg.effective_elementary());
    }

    #[test]
    fn nonzero_lower_bounds_keep_the_elementary_flag() {
        let mut alg = BiDirectional::new(2, 1, 0, 1, vec![5.0, 5.0], vec![0.0, 1.0]);
        alg.add_nodes(0..2);
        alg.add_edge(0, 1, 1.0, vec![1.0, 1.0]);
        alg.set_elementary(true);
        assert!(alg.effective_elementary());
    }

    #[test]
    #[should_panic(expected = "critical resource index")]
    fn critical_resource_index_is_validated() {
        let mut alg = BiDirectional::new(2, 1, 0, 1, vec![5.0], vec![0.0]);
        alg.set_critical_res(1);
    }
}
