//! Slide-strong: an edge loses to a same-colored twin.
//!
//! If a tree uses `(u, v)`, the color of `v` is taken, so any other vertex
//! `z` of that color is free. Hanging `z` off the root path of `u` gains at
//! least `LBpair[z][u]`, and moving the subtree of `v` under `z` changes the
//! score by at least `Slide[v][z]`. When that beats `w(u, v)` strictly, the
//! tree was not optimal.

use super::basic::finish;
use super::RuleKind;
use crate::bounds::{PairAnchorBounds, SlideBounds};
use crate::canon::ColorIntervals;
use crate::graph::{vid, ColoredGraph};
use crate::stats::ReductionStats;

/// Requires canonical order and slide and pair anchor tables computed on
/// this graph.
pub fn reduce_slide_strong(
    graph: &mut ColoredGraph,
    intervals: &ColorIntervals,
    pair: &PairAnchorBounds,
    slide: &SlideBounds,
    stats: &mut ReductionStats,
) -> usize {
    let g: &ColoredGraph = graph;
    let doomed: Vec<_> = g
        .edges()
        .filter(|(_, loss)| {
            let (u, v) = (loss.source, loss.target);
            intervals
                .block(g.color(v))
                .map(vid)
                .filter(|&z| z != v)
                .any(|z| pair.get(z, u) + slide.get(g, v, z) > loss.weight)
        })
        .map(|(e, _)| e)
        .collect();
    finish(graph, RuleKind::SlideStrong, doomed, stats)
}
