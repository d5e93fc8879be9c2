//! Colorful-subtree advantage.
//!
//! Take an optimal tree that uses `(u, v)` and cut it there. Everything the
//! subtree `S` below `v` held can be paid back from the root path of `u`,
//! which stays in the tree:
//!
//! - a vertex `y` of `S` can be regrafted there together with its own
//!   subtree, through an edge of at least `LBpair[y][u]`;
//! - the color of `y` can come back as a leaf, through an edge of at least
//!   `max(0, LBcolor[u][color(y)], LBpair[y][u])`.
//!
//! An edge `(x, y)` of `S` with `w(x, y) <= LBpair[y][u]` can always be
//! traded for the regraft, so such edges and what hangs below them are left
//! out. Each remaining edge is charged the leaf promise of its target and is
//! capped, per source `x`, by what regrafting `x` would have saved over the
//! leaf promise of `x`. Sebastian's bound over these charged weights limits
//! what `S` earns beyond the payback, and `(u, v)` goes when that cannot
//! cover `w(u, v)`.
//!
//! For one `u` the charged weights do not depend on `v`, so a single slot
//! fold over the ids above `u` serves every outgoing edge of `u`.

use super::basic::finish;
use super::RuleKind;
use crate::arena::EdgeId;
use crate::bounds::sebastian::{fold_slots, slot_bound};
use crate::bounds::{AnchorBounds, PairAnchorBounds, SebastianMode};
use crate::graph::{vid, ColoredGraph, VertexId};
use crate::stats::ReductionStats;

/// Requires canonical order and anchor tables computed on this graph.
pub fn reduce_colsubtree_adv(
    graph: &mut ColoredGraph,
    anchor: &AnchorBounds,
    pair: &PairAnchorBounds,
    mode: SebastianMode,
    stats: &mut ReductionStats,
) -> usize {
    let g: &ColoredGraph = graph;
    let mut doomed = Vec::new();
    let mut below = vec![0.0; g.vertex_count()];

    for u in g.vertices() {
        if g.out_edges(u).is_empty() {
            continue;
        }
        let payback = Payback::new(g, u, anchor, pair);
        fold_slots(
            g,
            vid(u.index() + 1),
            |e| payback.charged(g, e),
            |v, slots| below[v.index()] = slot_bound(g, v, slots, mode),
        );
        for &e in g.out_edges(u) {
            let v = g[e].target;
            if g[e].weight - payback.promise[v.index()] + below[v.index()] < 0.0 {
                doomed.push(e);
            }
        }
    }
    finish(graph, RuleKind::ColsubtreeAdvantage, doomed, stats)
}

/// What the root path of one vertex `u` offers back for each vertex above
/// `u`, once the subtree holding it is cut away.
struct Payback {
    /// `LBpair[y][u]`.
    regraft: Vec<f64>,
    /// Never negative.
    promise: Vec<f64>,
}

impl Payback {
    fn new(graph: &ColoredGraph, u: VertexId, anchor: &AnchorBounds, pair: &PairAnchorBounds) -> Self {
        let n = graph.vertex_count();
        let mut regraft = vec![f64::NEG_INFINITY; n];
        let mut promise = vec![0.0; n];
        for y in graph.vertices().skip(u.index() + 1) {
            let r = pair.get(y, u);
            regraft[y.index()] = r;
            promise[y.index()] = anchor.get(u, graph.color(y)).max(r).max(0.0);
        }
        Self { regraft, promise }
    }

    /// `None` for edges the regraft makes unnecessary.
    fn charged(&self, graph: &ColoredGraph, e: EdgeId) -> Option<f64> {
        let loss = &graph[e];
        let (x, y) = (loss.source.index(), loss.target.index());
        if loss.weight <= self.regraft[y] {
            return None;
        }
        let cap = self.promise[x] - self.regraft[x];
        Some((loss.weight - self.promise[y]).min(cap))
    }
}
