//! Pluggable resource extension functions.
//!
//! By default the solver accumulates resources additively along a path. A
//! custom [`ResourceExtension`] replaces that behaviour, for example to model
//! time windows, load-dependent consumption, or any extension function that
//! cannot be expressed as a fixed per-edge vector.

/// Per-direction resource extension callbacks.
///
/// Each method receives the cumulative resource vector of the label being
/// extended, the edge's endpoints as user-facing vertex ids, the edge's own
/// resource vector, and the label's partial path and accumulated weight. It
/// returns the resource vector of the extended label, or `None` to reject the
/// extension as infeasible. A returned vector whose length differs from the
/// problem's resource dimension is also treated as infeasible.
///
/// The solver never interprets the returned values beyond comparing them
/// against the configured resource bounds.
pub trait ResourceExtension {
    /// Extend `resources` across `(tail, head)` in the forward direction.
    fn forward(
        &self,
        resources: &[f64],
        tail: usize,
        head: usize,
        edge_resources: &[f64],
        partial_path: &[usize],
        weight: f64,
    ) -> Option<Vec<f64>>;

    /// Extend `resources` across `(tail, head)` in the backward direction.
    ///
    /// The critical resource of a backward label starts at its upper bound
    /// and decreases as the path grows towards the source; a custom
    /// implementation must preserve that monotonicity for the search to
    /// terminate.
    fn backward(
        &self,
        resources: &[f64],
        tail: usize,
        head: usize,
        edge_resources: &[f64],
        partial_path: &[usize],
        weight: f64,
    ) -> Option<Vec<f64>>;

    /// Combine a forward and a backward resource vector across the edge
    /// `(tail, head)` that connects the two half-paths.
    ///
    /// The default forwards to [`forward`](ResourceExtension::forward) with an
    /// empty partial path, matching the additive default. The solver corrects
    /// the critical component afterwards if the returned vector does not
    /// already account for the backward half running on an inverted scale.
    fn join(
        &self,
        forward_resources: &[f64],
        backward_resources: &[f64],
        tail: usize,
        head: usize,
        edge_resources: &[f64],
    ) -> Option<Vec<f64>> {
        let _ = backward_resources;
        self.forward(forward_resources, tail, head, edge_resources, &[], 0.0)
    }
}
