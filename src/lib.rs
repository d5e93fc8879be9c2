//! fragprune: safe edge reductions for the Maximum Colorful Subtree problem.
//!
//! A fragmentation graph is a rooted, edge-weighted DAG whose vertices carry
//! colors. A *colorful subtree* is a subtree rooted at the root that holds at
//! most one vertex of each color; finding the heaviest one is NP-hard. This
//! crate does not solve that problem. It shrinks the input for an exact
//! solver by deleting edges that provably cannot change the optimum.
//!
//! The pipeline has four layers:
//!
//! - [`canon`]: renumbers vertices so every edge goes up in id and color and
//!   every color occupies one contiguous id block.
//! - [`bounds`]: upper bounds on what a vertex can still contribute (Tim's
//!   and Sebastian's bound) and lower bounds on what a restructuring
//!   certainly gains (anchor and slide bounds).
//! - [`reduce`]: the deletion rules that compare edges against those bounds.
//! - [`controller`]: the fixpoint loop, and scripts for custom pipelines.
//!
//! A [`ReductionSession`] owns the graph and every table computed on it and
//! refuses to run a rule on tables that no longer match the graph.
//!
//! # Example
//!
//! ```
//! use fragprune::prelude::*;
//!
//! let mut graph = ColoredGraph::new();
//! let root = graph.add_vertex(ColorId::new(0));
//! let a = graph.add_vertex(ColorId::new(1));
//! let b = graph.add_vertex(ColorId::new(2));
//! graph.add_edge(root, a, 2.0)?;
//! graph.add_edge(root, b, -3.0)?;
//! graph.add_edge(a, b, 0.5)?;
//! graph.set_root(root)?;
//!
//! let (reduced, stats) = ReductionController::new(graph, ReductionConfig::default()).run()?;
//! assert_eq!(reduced.edge_count(), 2);
//! assert_eq!(stats.deleted_by(RuleKind::Vub), 1);
//! # Ok::<(), fragprune::ReductionError>(())
//! ```

pub mod arena;
pub mod bounds;
pub mod canon;
pub mod config;
pub mod controller;
pub mod error;
pub mod graph;
pub mod reduce;
pub mod session;
pub mod stats;

#[cfg(test)]
mod testutil;

pub use arena::EdgeId;
pub use canon::{Canonicalizer, ColorIntervals, Renumbering};
pub use config::ReductionConfig;
pub use controller::{ReductionController, ReductionScript};
pub use error::{GraphError, ReductionError, Result, ScriptError};
pub use graph::{ColorId, ColoredGraph, Loss, VertexId};
pub use reduce::RuleKind;
pub use session::ReductionSession;
pub use stats::ReductionStats;

/// Runs the standard fixpoint reduction on `graph`.
pub fn reduce(graph: ColoredGraph, config: ReductionConfig) -> Result<(ColoredGraph, ReductionStats)> {
    ReductionController::new(graph, config).run()
}

/// Prelude for convenient usage.
pub mod prelude {
    pub use crate::bounds::{
        sebastian_bound, tim_bound, AnchorBounds, PairAnchorBounds, SebastianMode, SlideBounds,
        UpperBounds,
    };
    pub use crate::canon::{Canonicalizer, ColorIntervals, Renumbering};
    pub use crate::config::ReductionConfig;
    pub use crate::controller::{ControllerState, ReductionController, ReductionScript, ScriptItem, Step};
    pub use crate::error::{GraphError, ReductionError, ScriptError};
    pub use crate::graph::{ColorId, ColoredGraph, Loss, VertexId};
    pub use crate::reduce::RuleKind;
    pub use crate::session::ReductionSession;
    pub use crate::stats::{ImpliedEdgeStats, ReductionStats};
    pub use crate::EdgeId;
}

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use crate::testutil::{arb_rooted_dag, arb_tied_dag, optimum};
    use proptest::prelude::*;

    /// Five vertices: the root (color 0), x and y (color 2), a and b
    /// (color 1). The root reaches x only through a -10.0 edge, and x can
    /// make at most 4.0.
    #[test]
    fn hopeless_edge_then_orphaned_subtree() {
        let mut g = ColoredGraph::new();
        let root = g.add_vertex(ColorId::new(0));
        let x = g.add_vertex(ColorId::new(2));
        let y = g.add_vertex(ColorId::new(2));
        let a = g.add_vertex(ColorId::new(1));
        let b = g.add_vertex(ColorId::new(1));
        g.add_edge(root, x, -10.0).unwrap();
        g.add_edge(root, y, 1.0).unwrap();
        g.add_edge(x, a, 4.0).unwrap();
        g.add_edge(y, b, 2.0).unwrap();
        g.set_root(root).unwrap();

        let mut s = ReductionSession::new(g, ReductionConfig::default());
        s.renumber().unwrap();
        s.tim_upper_bounds().unwrap();
        let renumbering = s.renumbering().unwrap().clone();
        let canonical = |v| renumbering.canonical_id(v).unwrap();
        assert_eq!(s.upper_bounds().unwrap().get(canonical(x)), 4.0);

        assert_eq!(s.reduce_vub().unwrap(), 1);
        assert!(s.graph().find_edge(canonical(root), canonical(x)).is_none());
        assert_eq!(s.reduce_unreach().unwrap(), 1);
        assert!(s.graph().out_edges(canonical(x)).is_empty());
        assert!(s.graph().find_edge(canonical(y), canonical(b)).is_some());
        assert_eq!(s.graph().edge_count(), 2);
    }

    /// A root in the middle of the id range with a stray parent: the
    /// controller must neither delete the root's edges as unreachable nor
    /// lose the root.
    #[test]
    fn root_is_exempt_from_unreach() {
        let mut g = ColoredGraph::new();
        let stray = g.add_vertex(ColorId::new(1));
        let root = g.add_vertex(ColorId::new(0));
        let leaf = g.add_vertex(ColorId::new(2));
        g.add_edge(root, leaf, 1.0).unwrap();
        g.add_edge(stray, leaf, 5.0).unwrap();
        g.set_root(root).unwrap();

        let (reduced, _) = crate::reduce(g, ReductionConfig::default()).unwrap();
        let root = reduced.root().unwrap();
        assert_eq!(reduced.out_edges(root).len(), 1);
        // The stray vertex has no in-edges, so its edge goes.
        assert_eq!(reduced.edge_count(), 1);
    }

    const EVERY_RULE: &str = "renumber tim-ubs reduce-vub reduce-unreach reduce-negpend \
        * ( clear-ubs seb-ubs tim-ubs reduce-vub reduce-unreach \
            calc-anchor-lbs reduce-colsubtree-adv \
            calc-anchor-lbs calc-slide-lbs reduce-slide-strong \
            calc-implied-edges reduce-unreach reduce-negpend )";

    fn edge_list(g: &ColoredGraph) -> Vec<(VertexId, VertexId, u64)> {
        let mut edges: Vec<_> = g
            .edges()
            .map(|(_, l)| (l.source, l.target, l.weight.to_bits()))
            .collect();
        edges.sort_unstable();
        edges
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

        #[test]
        fn default_pipeline_keeps_the_optimum(g in arb_rooted_dag(9, 5)) {
            let before = optimum(&g);
            let (reduced, stats) = crate::reduce(g, ReductionConfig::default()).unwrap();
            prop_assert!((optimum(&reduced) - before).abs() < 1e-9);
            prop_assert!(stats.iterations >= 1);
        }

        #[test]
        fn every_rule_keeps_the_optimum(g in arb_rooted_dag(9, 5)) {
            let before = optimum(&g);
            let mut session = ReductionSession::new(g, ReductionConfig::default());
            ReductionScript::parse(EVERY_RULE).unwrap().run(&mut session).unwrap();
            prop_assert!((optimum(session.graph()) - before).abs() < 1e-9);
        }

        /// Integer weights make ties between best and runner-up edges and
        /// zero-weight edges routine; `-inf` edges show up too.
        #[test]
        fn default_pipeline_keeps_the_optimum_with_ties(g in arb_tied_dag(9, 5)) {
            let before = optimum(&g);
            let (reduced, _) = crate::reduce(g, ReductionConfig::default()).unwrap();
            prop_assert!((optimum(&reduced) - before).abs() < 1e-9);
        }

        #[test]
        fn every_rule_keeps_the_optimum_with_ties(g in arb_tied_dag(9, 5)) {
            let before = optimum(&g);
            let mut session = ReductionSession::new(g, ReductionConfig::default());
            ReductionScript::parse(EVERY_RULE).unwrap().run(&mut session).unwrap();
            prop_assert!((optimum(session.graph()) - before).abs() < 1e-9);
        }

        #[test]
        fn plain_bounds_keep_the_optimum(g in arb_rooted_dag(9, 5)) {
            let before = optimum(&g);
            let config = ReductionConfig { strengthen_upper_bounds: false, ..ReductionConfig::default() };
            let (reduced, _) = crate::reduce(g, config).unwrap();
            prop_assert!((optimum(&reduced) - before).abs() < 1e-9);
        }

        #[test]
        fn script_matches_controller(g in arb_rooted_dag(9, 5)) {
            let (by_controller, _) = crate::reduce(g.clone(), ReductionConfig::default()).unwrap();
            let mut session = ReductionSession::new(g, ReductionConfig::default());
            ReductionScript::default_pipeline().run(&mut session).unwrap();
            prop_assert_eq!(edge_list(&by_controller), edge_list(session.graph()));
        }

        /// After reduce-vub every surviving edge pays for itself and a second
        /// pass has nothing left to do.
        #[test]
        fn vub_is_safe_and_idempotent(g in arb_rooted_dag(9, 5)) {
            let mut s = ReductionSession::new(g, ReductionConfig::default());
            s.renumber().unwrap();
            s.sebastian_upper_bounds().unwrap();
            s.tim_upper_bounds().unwrap();
            s.reduce_vub().unwrap();
            let ub = s.upper_bounds().unwrap().clone();
            for (_, loss) in s.graph().edges() {
                prop_assert!(loss.weight + ub.get(loss.target) > 0.0);
            }
            prop_assert_eq!(s.reduce_vub().unwrap(), 0);
        }

        #[test]
        fn restored_graph_keeps_ids(g in arb_rooted_dag(9, 5)) {
            let config = ReductionConfig { restore_numbering: true, ..ReductionConfig::default() };
            let (reduced, _) = crate::reduce(g.clone(), config).unwrap();
            prop_assert_eq!(reduced.root(), g.root());
            for v in g.vertices() {
                prop_assert_eq!(reduced.color(v), g.color(v));
            }
            for (e, loss) in reduced.edges() {
                prop_assert_eq!(g[e].source, loss.source);
                prop_assert_eq!(g[e].target, loss.target);
            }
        }
    }
}
