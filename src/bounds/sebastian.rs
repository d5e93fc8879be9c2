//! Sebastian's bound, plain and strengthened.
//!
//! One pass over the vertices by decreasing id. Every vertex `u` collects, per
//! color `c > color(u)`, the best and second-best edge into color `c` found
//! anywhere below `u`. A colorful subtree rooted at `u` enters each color
//! through at most one edge, so the sum of the best weights (never below zero)
//! bounds its score. The strengthened variant subtracts the cost of repairing
//! the chosen edges into an actual subtree.
//!
//! A summary is created when the first child of `u` finishes and released as
//! soon as `u` itself has been folded into its parents.

use std::collections::BTreeMap;

use tracing::debug;

use super::upper::{BoundSummary, UpperBounds};
use crate::arena::EdgeId;
use crate::error::Result;
use crate::graph::{ColoredGraph, VertexId};

/// A best/second-best slot entry: an edge, or a sentinel without one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BestEdge {
    pub edge: Option<EdgeId>,
    pub weight: f64,
}

impl BestEdge {
    /// "Use no edge into this color": contributes nothing.
    pub const ZERO: BestEdge = BestEdge {
        edge: None,
        weight: 0.0,
    };

    /// Empty slot that loses every comparison.
    pub const NEG_INFINITY: BestEdge = BestEdge {
        edge: None,
        weight: f64::NEG_INFINITY,
    };

    pub fn of(graph: &ColoredGraph, e: EdgeId) -> Self {
        Self {
            edge: Some(e),
            weight: graph[e].weight,
        }
    }

    /// Sentinels share one identity; real edges compare by id.
    fn same_edge(&self, other: &BestEdge) -> bool {
        self.edge == other.edge
    }
}

/// Per-color summary slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ColorSlot {
    best: BestEdge,
    second: BestEdge,
    /// Largest weight of an edge entering `best`'s source from inside the
    /// summarized region.
    max_in_edge: f64,
}

impl ColorSlot {
    const EMPTY: ColorSlot = ColorSlot {
        best: BestEdge::ZERO,
        second: BestEdge::NEG_INFINITY,
        max_in_edge: f64::NEG_INFINITY,
    };

    /// Offers `candidate` for the best slot.
    ///
    /// Ties go to the candidate. The recorded best edge itself only raises
    /// `max_in_edge`, so one edge never fills both slots.
    fn merge(&mut self, candidate: BestEdge, max_in_edge: f64) {
        if candidate.same_edge(&self.best) {
            self.max_in_edge = self.max_in_edge.max(max_in_edge);
        } else if candidate.weight >= self.best.weight {
            self.second = self.best;
            self.best = candidate;
            self.max_in_edge = max_in_edge;
        } else {
            self.offer_runner_up(candidate);
        }
    }

    /// Offers `candidate` for the second slot only.
    fn offer_runner_up(&mut self, candidate: BestEdge) {
        if !candidate.same_edge(&self.best)
            && !candidate.same_edge(&self.second)
            && candidate.weight > self.second.weight
        {
            self.second = candidate;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SebastianMode {
    Plain,
    #[default]
    Strengthened,
}

/// Computes Sebastian's bound for every vertex and merges it into `ub` by
/// taking the minimum.
pub fn sebastian_bound(
    graph: &ColoredGraph,
    ub: &mut UpperBounds,
    mode: SebastianMode,
) -> Result<BoundSummary> {
    let mut summary = BoundSummary::new();
    fold_slots(
        graph,
        VertexId::new(0),
        |e| Some(graph[e].weight),
        |v, slots| {
            let x = slot_bound(graph, v, slots, mode);
            let merged = ub.tighten(v, x);
            summary.record(graph, v, x, merged);
        },
    );

    ub.check_not_nan()?;
    debug!(?mode, highest = summary.highest, zero = summary.zero_bound_vertices, "sebastian bound");
    Ok(summary)
}

/// Folds per-color slots bottom-up over the vertices with id `>= lowest`.
///
/// `weight(e)` is the weight edge `e` counts with, or `None` to leave it
/// out. `visit(v, slots)` receives every vertex's finished summary, `None`
/// if nothing was folded into it, before the summary moves on to the
/// parents of `v`.
pub(crate) fn fold_slots<W, V>(graph: &ColoredGraph, lowest: VertexId, weight: W, mut visit: V)
where
    W: Fn(EdgeId) -> Option<f64>,
    V: FnMut(VertexId, Option<&[ColorSlot]>),
{
    let colors = graph.color_count();
    let start = lowest.index();
    let mut slots: Vec<Option<Vec<ColorSlot>>> =
        vec![None; graph.vertex_count().saturating_sub(start)];

    for v in graph.vertices().rev().take_while(|v| v.index() >= start) {
        let v_color = graph.color(v).index();
        let own = slots[v.index() - start].take();
        visit(v, own.as_deref());

        for &e in graph.in_edges(v) {
            let Some(parent) = graph[e]
                .source
                .index()
                .checked_sub(start)
                .and_then(|i| slots.get_mut(i))
            else {
                continue;
            };
            let Some(w) = weight(e) else {
                continue;
            };
            let parent = parent.get_or_insert_with(|| vec![ColorSlot::EMPTY; colors]);

            if let Some(own) = &own {
                for c in v_color + 1..colors {
                    let child = &own[c];
                    parent[c].merge(child.best, child.max_in_edge);
                    // A runner-up never takes the best slot, not even on a
                    // tie: the best slot keeps the edge its max_in_edge was
                    // recorded for.
                    parent[c].offer_runner_up(child.second);
                    let best_from_v = parent[c]
                        .best
                        .edge
                        .is_some_and(|b| graph[b].source == v);
                    if best_from_v {
                        parent[c].max_in_edge = parent[c].max_in_edge.max(w);
                    }
                }
            }

            parent[v_color].merge(
                BestEdge {
                    edge: Some(e),
                    weight: w,
                },
                f64::NEG_INFINITY,
            );
        }
    }
}

/// Bound on a colorful subtree rooted at `v`, from `v`'s folded slots.
pub(crate) fn slot_bound(
    graph: &ColoredGraph,
    v: VertexId,
    slots: Option<&[ColorSlot]>,
    mode: SebastianMode,
) -> f64 {
    match (slots, mode) {
        (None, _) => 0.0,
        (Some(slots), SebastianMode::Plain) => slots[graph.color(v).index() + 1..]
            .iter()
            .map(|s| s.best.weight)
            .sum(),
        (Some(slots), SebastianMode::Strengthened) => strengthened_value(graph, v, slots),
    }
}

/// Plain sum minus, per color bucket `i >= color(v)`, the cheapest way to
/// make the recorded best edges leaving color `i` consistent: replace all of
/// them by their runners-up, or keep the ones leaving a single `i`-colored
/// vertex `u` and pay for an edge into `u`.
fn strengthened_value(graph: &ColoredGraph, v: VertexId, slots: &[ColorSlot]) -> f64 {
    let colors = slots.len();
    let v_color = graph.color(v).index();
    let mut x: f64 = slots[v_color + 1..].iter().map(|s| s.best.weight).sum();

    // colors_from[i]: colors whose best edge leaves an i-colored vertex.
    let mut colors_from: Vec<Vec<(usize, VertexId)>> = vec![Vec::new(); colors];
    for (d, slot) in slots.iter().enumerate().skip(v_color + 1) {
        if let Some(e) = slot.best.edge {
            let source = graph[e].source;
            colors_from[graph.color(source).index()].push((d, source));
        }
    }

    let mut safe = vec![false; colors];
    for i in v_color..colors {
        let targets = &colors_from[i];
        if targets.is_empty() {
            continue;
        }

        let mut cost_from: BTreeMap<VertexId, f64> = BTreeMap::new();
        let mut total = 0.0;
        for &(d, u) in targets {
            let cost = slots[d].best.weight - slots[d].second.weight;
            debug_assert!(cost >= 0.0);
            *cost_from.entry(u).or_insert(0.0) += cost;
            total += cost;
        }

        let mut best_repair = total;
        for &(d, u) in targets {
            let max_in = slots[d].max_in_edge;
            let in_edge_cost = if i > v_color {
                match slots[i].best.edge {
                    None => -max_in,
                    Some(into_i) if graph[into_i].target != u && safe[i] => {
                        slots[i].best.weight - max_in
                    }
                    Some(_) => 0.0,
                }
            } else {
                0.0
            };
            let keep_u = total - cost_from[&u] + in_edge_cost;
            best_repair = best_repair.min(keep_u);
        }

        if best_repair == 0.0 {
            for &(d, _) in targets {
                safe[d] = true;
            }
        }
        x -= best_repair;
    }
    x
}
