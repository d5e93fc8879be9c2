//! Vertex upper bounds and Tim's bound.

use tracing::debug;

use crate::error::{ReductionError, Result};
use crate::graph::{vid, ColoredGraph, VertexId};

/// `UB[v]` for every vertex.
///
/// # Invariants
/// - Values only ever decrease through [`UpperBounds::tighten`]; the only way
///   up is an explicit [`UpperBounds::reset`].
/// - No value is NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct UpperBounds {
    values: Vec<f64>,
}

impl UpperBounds {
    /// Every vertex starts at `+inf`.
    pub fn unbounded(vertex_count: usize) -> Self {
        Self {
            values: vec![f64::INFINITY; vertex_count],
        }
    }

    pub fn get(&self, v: VertexId) -> f64 {
        self.values[v.index()]
    }

    /// Lowers `UB[v]` to `value` if that is tighter; returns the result.
    pub fn tighten(&mut self, v: VertexId, value: f64) -> f64 {
        let slot = &mut self.values[v.index()];
        if value < *slot {
            *slot = value;
        }
        *slot
    }

    pub fn reset(&mut self) {
        self.values.fill(f64::INFINITY);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Largest finite bound, or `None` when every bound is infinite.
    pub fn highest(&self) -> Option<f64> {
        self.values
            .iter()
            .copied()
            .filter(|x| x.is_finite())
            .reduce(f64::max)
    }

    pub(crate) fn check_not_nan(&self) -> Result<()> {
        match self.values.iter().position(|x| x.is_nan()) {
            Some(index) => Err(ReductionError::invariant(format!(
                "upper bound of {} is NaN",
                vid(index)
            ))),
            None => Ok(()),
        }
    }
}

/// What one bound pass produced, folded into the reduction statistics.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoundSummary {
    /// Largest bound computed in this pass (before merging with older ones).
    pub highest: f64,
    /// Non-leaf vertices whose merged bound is exactly zero.
    pub zero_bound_vertices: usize,
    /// Outgoing edges of those vertices.
    pub edges_below_zero_bounds: usize,
}

impl BoundSummary {
    pub(crate) fn new() -> Self {
        Self {
            highest: f64::NEG_INFINITY,
            ..Self::default()
        }
    }

    pub(crate) fn record(&mut self, graph: &ColoredGraph, v: VertexId, computed: f64, merged: f64) {
        self.highest = self.highest.max(computed);
        if merged == 0.0 && !graph.is_leaf(v) {
            self.zero_bound_vertices += 1;
            self.edges_below_zero_bounds += graph.out_edges(v).len();
        }
    }
}

/// Tim's bound: for every vertex, per target color the best
/// `max(0, w(e) + UB(target(e)))`, summed over colors. Leaves get 0.
///
/// Vertices are visited by decreasing id, so on a canonical graph every
/// child's bound is final before its parents read it. Each result is merged
/// into `ub` by taking the minimum.
pub fn tim_bound(graph: &ColoredGraph, ub: &mut UpperBounds) -> Result<BoundSummary> {
    let mut summary = BoundSummary::new();
    let mut best = vec![f64::NEG_INFINITY; graph.color_count()];
    let mut touched = Vec::new();

    for v in graph.vertices().rev() {
        for &e in graph.out_edges(v) {
            let loss = &graph[e];
            let c = graph.color(loss.target).index();
            if best[c] == f64::NEG_INFINITY {
                touched.push(c);
            }
            best[c] = best[c].max(loss.weight + ub.get(loss.target));
        }
        let mut x = 0.0;
        for c in touched.drain(..) {
            x += best[c].max(0.0);
            best[c] = f64::NEG_INFINITY;
        }
        let merged = ub.tighten(v, x);
        summary.record(graph, v, x, merged);
    }

    ub.check_not_nan()?;
    debug!(highest = summary.highest, zero = summary.zero_bound_vertices, "tim bound");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canon::Canonicalizer;
    use crate::graph::ColorId;
    use crate::testutil::{arb_rooted_dag, best_subtree_below};
    use proptest::prelude::*;

    /// root -> a (2.0), root -> b (1.0) with a, b the same color; a -> c (3.0),
    /// b -> c (-1.0).
    fn small() -> ColoredGraph {
        let mut g = ColoredGraph::new();
        let root = g.add_vertex(ColorId::new(0));
        let a = g.add_vertex(ColorId::new(1));
        let b = g.add_vertex(ColorId::new(1));
        let c = g.add_vertex(ColorId::new(2));
        g.add_edge(root, a, 2.0).unwrap();
        g.add_edge(root, b, 1.0).unwrap();
        g.add_edge(a, c, 3.0).unwrap();
        g.add_edge(b, c, -1.0).unwrap();
        g.set_root(root).unwrap();
        g
    }

    #[test]
    fn tim_bound_values() {
        let g = small();
        let mut ub = UpperBounds::unbounded(g.vertex_count());
        let summary = tim_bound(&g, &mut ub).unwrap();
        assert_eq!(ub.as_slice(), &[5.0, 3.0, 0.0, 0.0]);
        assert_eq!(summary.highest, 5.0);
        // b has an outgoing edge but nothing to gain below it.
        assert_eq!(summary.zero_bound_vertices, 1);
        assert_eq!(ub.highest(), Some(5.0));
    }

    #[test]
    fn tighten_never_loosens() {
        let mut ub = UpperBounds::unbounded(2);
        let v = VertexId::new(1);
        assert_eq!(ub.tighten(v, 4.0), 4.0);
        assert_eq!(ub.tighten(v, 6.0), 4.0);
        ub.reset();
        assert_eq!(ub.get(v), f64::INFINITY);
        assert_eq!(ub.highest(), None);
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

        /// Tim's bound never undercuts the best subtree hanging below a vertex.
        #[test]
        fn tim_bound_is_an_upper_bound(mut g in arb_rooted_dag(8, 5)) {
            Canonicalizer::default().canonicalize(&mut g).unwrap();
            let mut ub = UpperBounds::unbounded(g.vertex_count());
            tim_bound(&g, &mut ub).unwrap();
            for v in g.vertices() {
                prop_assert!(ub.get(v) >= best_subtree_below(&g, v) - 1e-9);
            }
        }

        #[test]
        fn repeated_passes_are_monotone(mut g in arb_rooted_dag(8, 5)) {
            Canonicalizer::default().canonicalize(&mut g).unwrap();
            let mut ub = UpperBounds::unbounded(g.vertex_count());
            tim_bound(&g, &mut ub).unwrap();
            let first = ub.clone();
            tim_bound(&g, &mut ub).unwrap();
            for v in g.vertices() {
                prop_assert!(ub.get(v) <= first.get(v));
            }
        }
    }
}
