//! Recursive slide bound.
//!
//! For same-colored `u`, `v`, `Slide[u][v] <= 0` bounds from below the score
//! change of deleting the subtree under `u` and growing a subtree under `v`
//! in its place, using only the colors the deleted subtree held.
//! `worst[u]` is the minimum over all `v`, for when the destination is not
//! known.
//!
//! Colors are processed from the highest canonical color down, so the
//! entries for every child color are final before a parent color reads them.

use tracing::debug;

use super::anchor::AnchorBounds;
use super::upper::UpperBounds;
use crate::arena::EdgeId;
use crate::canon::ColorIntervals;
use crate::graph::{cid, vid, ColorId, ColoredGraph, VertexId};

#[derive(Debug, Clone, PartialEq)]
pub struct SlideBounds {
    /// `rows[u][offset(v)]`, `offset` being `v`'s position in its color block.
    rows: Vec<Vec<f64>>,
    worst: Vec<f64>,
    first_of_color: Vec<usize>,
}

impl SlideBounds {
    /// Requires a canonical graph whose blocks are described by `intervals`.
    pub fn compute(
        graph: &ColoredGraph,
        intervals: &ColorIntervals,
        ub: &UpperBounds,
        anchor: &AnchorBounds,
    ) -> Self {
        let n = graph.vertex_count();
        let mut rows: Vec<Vec<f64>> = (0..n)
            .map(|u| vec![f64::NEG_INFINITY; intervals.block_len(graph.color(vid(u)))])
            .collect();
        let mut worst = vec![f64::INFINITY; n];
        let first_of_color: Vec<usize> = (0..intervals.color_count())
            .map(|c| intervals.first_of_color(cid(c)))
            .collect();
        let inputs = SlideInputs {
            graph,
            by_color: sorted_children(graph),
            first_of_color: &first_of_color,
            ub,
            anchor,
        };

        for col in (0..intervals.color_count()).rev() {
            let block = intervals.block(cid(col));
            for u in block.clone().map(vid) {
                for v in block.clone().map(vid) {
                    let value = if u == v {
                        0.0
                    } else {
                        let total = inputs.substitution_cost(&rows, &worst, u, v);
                        total.max(-ub.get(u))
                    };
                    rows[u.index()][v.index() - block.start] = value;
                    worst[u.index()] = worst[u.index()].min(value);
                }
            }
        }

        debug!(vertices = n, "slide bound");
        Self {
            rows,
            worst,
            first_of_color,
        }
    }

    /// `Slide[u][v]` for `u`, `v` of the same color.
    pub fn get(&self, graph: &ColoredGraph, u: VertexId, v: VertexId) -> f64 {
        lookup(&self.rows, &self.first_of_color, graph.color(v), u, v)
    }

    pub fn worst(&self, u: VertexId) -> f64 {
        self.worst[u.index()]
    }
}

fn lookup(rows: &[Vec<f64>], first_of_color: &[usize], v_color: ColorId, u: VertexId, v: VertexId) -> f64 {
    rows[u.index()][v.index() - first_of_color[v_color.index()]]
}

/// Outgoing edges of every vertex as `(target color, edge)`, sorted by color.
fn sorted_children(graph: &ColoredGraph) -> Vec<Vec<(ColorId, EdgeId)>> {
    graph
        .vertices()
        .map(|v| {
            let mut children: Vec<_> = graph
                .out_edges(v)
                .iter()
                .map(|&e| (graph.color(graph[e].target), e))
                .collect();
            children.sort_unstable();
            children
        })
        .collect()
}

/// Read-only inputs shared by every entry of one computation.
struct SlideInputs<'a> {
    graph: &'a ColoredGraph,
    by_color: Vec<Vec<(ColorId, EdgeId)>>,
    first_of_color: &'a [usize],
    ub: &'a UpperBounds,
    anchor: &'a AnchorBounds,
}

impl SlideInputs<'_> {
    /// Sum over `u`'s child colors of the worst substitution for any child
    /// of that color, when `v` takes over.
    fn substitution_cost(&self, rows: &[Vec<f64>], worst: &[f64], u: VertexId, v: VertexId) -> f64 {
        let graph = self.graph;
        let v_children = &self.by_color[v.index()];
        let mut total = 0.0;
        for group in self.by_color[u.index()].chunk_by(|a, b| a.0 == b.0) {
            let c = group[0].0;
            let lo = v_children.partition_point(|&(cc, _)| cc < c);
            let hi = v_children.partition_point(|&(cc, _)| cc <= c);
            let substitutes = &v_children[lo..hi];

            let mut worst_for_color: f64 = 0.0;
            for &(_, ue) in group {
                let x = graph[ue].target;
                let mut best_for_child = -self.ub.get(x);
                if !substitutes.is_empty() {
                    let lb = self.anchor.get(v, c);
                    best_for_child += lb.max(0.0);
                    best_for_child = best_for_child.max(lb + worst[x.index()]);
                    for &(_, ve) in substitutes {
                        let y = graph[ve].target;
                        let slide = lookup(rows, self.first_of_color, c, x, y);
                        best_for_child = best_for_child.max(graph[ve].weight + slide);
                    }
                }
                worst_for_color = worst_for_color.min(best_for_child - graph[ue].weight);
            }
            total += worst_for_color;
        }
        total
    }
}
