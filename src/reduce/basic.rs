//! Rules that need at most an upper bound table.

use tracing::debug;

use super::RuleKind;
use crate::arena::EdgeId;
use crate::bounds::UpperBounds;
use crate::graph::ColoredGraph;
use crate::stats::ReductionStats;

/// Deletes every edge `(u, v)` with `w(u, v) + UB(v) <= 0`: the best subtree
/// hanging from it cannot pay for the edge.
///
/// Also lowers `stats.scared_edge` to the smallest margin among the edges
/// it keeps.
pub fn reduce_vub(graph: &mut ColoredGraph, ub: &UpperBounds, stats: &mut ReductionStats) -> usize {
    let mut doomed = Vec::new();
    let mut scared = f64::INFINITY;
    for (e, loss) in graph.edges() {
        let margin = loss.weight + ub.get(loss.target);
        if margin <= 0.0 {
            doomed.push(e);
        } else {
            scared = scared.min(margin);
        }
    }
    if scared.is_finite() {
        stats.scared_edge = Some(stats.scared_edge.map_or(scared, |s| s.min(scared)));
    }
    finish(graph, RuleKind::Vub, doomed, stats)
}

/// Deletes the outgoing edges of non-root vertices that have no incoming
/// edges. Vertices are visited in id order and each one's edges go right
/// away, so in canonical order whole unreachable subtrees disappear in one
/// call. Edges touching the root are never deleted.
pub fn reduce_unreach(graph: &mut ColoredGraph, stats: &mut ReductionStats) -> usize {
    let root = graph.root();
    let mut deleted = 0;
    let mut doomed: Vec<EdgeId> = Vec::new();
    for v in graph.vertices() {
        if Some(v) == root || !graph.in_edges(v).is_empty() {
            continue;
        }
        doomed.clear();
        doomed.extend(
            graph
                .out_edges(v)
                .iter()
                .copied()
                .filter(|&e| Some(graph[e].target) != root),
        );
        deleted += graph.delete_edges(doomed.iter().copied());
    }
    record(RuleKind::Unreach, deleted, stats)
}

/// Deletes non-positive edges into leaves. The root is never a leaf here.
pub fn reduce_negpend(graph: &mut ColoredGraph, stats: &mut ReductionStats) -> usize {
    let root = graph.root();
    let doomed: Vec<EdgeId> = graph
        .vertices()
        .filter(|&v| Some(v) != root && graph.is_leaf(v))
        .flat_map(|v| graph.in_edges(v).iter().copied())
        .filter(|&e| graph[e].weight <= 0.0)
        .collect();
    finish(graph, RuleKind::Negpend, doomed, stats)
}

/// Applies a deletion set and books it.
pub(crate) fn finish(
    graph: &mut ColoredGraph,
    rule: RuleKind,
    doomed: Vec<EdgeId>,
    stats: &mut ReductionStats,
) -> usize {
    let deleted = graph.delete_edges(doomed);
    record(rule, deleted, stats)
}

fn record(rule: RuleKind, deleted: usize, stats: &mut ReductionStats) -> usize {
    stats.record_deletions(rule, deleted);
    debug!(%rule, deleted, "rule applied");
    deleted
}
