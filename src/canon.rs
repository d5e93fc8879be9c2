//! Canonical renumbering.
//!
//! After [`Canonicalizer::canonicalize`] every edge `(u, v)` satisfies
//! `u < v` and `color(u) < color(v)`, and the vertices of each color form one
//! contiguous id block. The bound engines rely on both properties: processing
//! vertices by decreasing id visits children before parents, and a color's
//! vertices can be addressed by an offset into its block.
//!
//! Colors are ordered by a depth-first topological sort of the *color graph*
//! (`x -> y` iff some `x`-colored vertex has an edge to a `y`-colored vertex),
//! numbering colors in reverse finish order. The sort uses an explicit stack.

use std::ops::Range;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::error::{ReductionError, Result};
use crate::graph::{cid, vid, ColorId, ColoredGraph, VertexId};

/// Inverse mapping recorded by a renumbering, used to put the caller's
/// original ids and colors back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Renumbering {
    /// Indexed by canonical id.
    original_id: Vec<VertexId>,
    /// Indexed by canonical color.
    original_color: Vec<ColorId>,
}

impl Renumbering {
    pub fn original_id(&self, v: VertexId) -> VertexId {
        self.original_id[v.index()]
    }

    pub fn original_color(&self, c: ColorId) -> ColorId {
        self.original_color[c.index()]
    }

    /// Canonical id of the vertex that had id `original` before renumbering.
    pub fn canonical_id(&self, original: VertexId) -> Option<VertexId> {
        self.original_id
            .iter()
            .position(|&o| o == original)
            .map(vid)
    }

    /// The mapping of `self` followed by the renumbering `later`, as one
    /// inverse back to the ids `self` started from.
    pub fn then(&self, later: &Renumbering) -> Renumbering {
        Renumbering {
            original_id: later.original_id.iter().map(|&v| self.original_id(v)).collect(),
            original_color: later
                .original_color
                .iter()
                .map(|&c| self.original_color(c))
                .collect(),
        }
    }

    /// Moves every vertex back to its original id and color.
    pub fn restore(&self, graph: &mut ColoredGraph) -> Result<()> {
        graph.set_vertex_order(&self.original_id, &self.original_color)
    }
}

/// Per-color id blocks of a canonical graph.
///
/// Valid until the next renumbering. Edge deletions never move vertices, so
/// the blocks survive them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorIntervals {
    /// `starts[c]` is the first id of color `c`; `starts[color_count]` is the
    /// vertex count.
    starts: Vec<usize>,
}

impl ColorIntervals {
    /// Reads the blocks off a graph whose colors never decrease along ids.
    pub fn compute(graph: &ColoredGraph) -> Result<Self> {
        let colors = graph.color_count();
        let mut starts = vec![0; colors + 1];
        let mut previous: Option<ColorId> = None;
        for v in graph.vertices() {
            let c = graph.color(v);
            if previous.is_some_and(|p| p > c) {
                return Err(ReductionError::invariant(format!(
                    "color {c} at {v} breaks the contiguous color blocks"
                )));
            }
            starts[c.index() + 1] += 1;
            previous = Some(c);
        }
        for c in 0..colors {
            starts[c + 1] += starts[c];
        }
        Ok(Self { starts })
    }

    pub fn color_count(&self) -> usize {
        self.starts.len().saturating_sub(1)
    }

    /// Ids of the vertices colored `c`.
    pub fn block(&self, c: ColorId) -> Range<usize> {
        self.starts[c.index()]..self.starts[c.index() + 1]
    }

    pub fn first_of_color(&self, c: ColorId) -> usize {
        self.starts[c.index()]
    }

    pub fn first_of_next_color(&self, c: ColorId) -> usize {
        self.starts[c.index() + 1]
    }

    pub fn block_len(&self, c: ColorId) -> usize {
        self.first_of_next_color(c) - self.first_of_color(c)
    }

    /// Position of `v` inside its color block.
    pub fn offset(&self, graph: &ColoredGraph, v: VertexId) -> usize {
        v.index() - self.first_of_color(graph.color(v))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unseen,
    Open,
    Done,
}

/// Computes and applies the canonical order.
#[derive(Debug, Clone, Copy)]
pub struct Canonicalizer {
    verify: bool,
}

impl Default for Canonicalizer {
    fn default() -> Self {
        Self { verify: true }
    }
}

impl Canonicalizer {
    /// `verify` re-checks the topological property of every edge after the
    /// renumbering is applied.
    pub fn new(verify: bool) -> Self {
        Self { verify }
    }

    #[instrument(skip_all, fields(vertices = graph.vertex_count(), edges = graph.edge_count()))]
    pub fn canonicalize(&self, graph: &mut ColoredGraph) -> Result<(Renumbering, ColorIntervals)> {
        let root = graph
            .root()
            .ok_or_else(|| ReductionError::invariant("graph has no root"))?;

        let new_color = sort_colors(graph, graph.color(root))?;
        let colors = new_color.len();

        let mut original_color = vec![cid(0); colors];
        for (old, &new) in new_color.iter().enumerate() {
            original_color[new.index()] = cid(old);
        }

        let groups = graph.vertices_by_color();
        let mut new_id = vec![vid(0); graph.vertex_count()];
        let mut original_id = Vec::with_capacity(graph.vertex_count());
        for &old_color in &original_color {
            for &v in &groups[old_color.index()] {
                new_id[v.index()] = vid(original_id.len());
                original_id.push(v);
            }
        }

        graph.set_vertex_order(&new_id, &new_color)?;
        if self.verify {
            graph.check_topological()?;
        }

        let root = new_id[root.index()];
        if graph.is_leaf(root) {
            if let Some(fallback) = graph.vertices().find(|&v| !graph.is_leaf(v)) {
                warn!(%root, %fallback, "root has no outgoing edges; re-pointing root");
                graph.force_root(fallback)?;
            }
        }

        let intervals = ColorIntervals::compute(graph)?;
        debug!(colors, "canonical order applied");
        Ok((
            Renumbering {
                original_id,
                original_color,
            },
            intervals,
        ))
    }
}

/// Topologically sorts the color graph; returns the new number of every old
/// color. `root_color` is started last so that, being a source, it gets 0.
fn sort_colors(graph: &ColoredGraph, root_color: ColorId) -> Result<Vec<ColorId>> {
    let colors = graph.color_count();
    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); colors];
    for (e, loss) in graph.edges() {
        let (from, to) = (graph.color(loss.source), graph.color(loss.target));
        if from == to {
            return Err(ReductionError::invariant(format!(
                "edge {e} joins two vertices of color {from}"
            )));
        }
        successors[from.index()].push(to.index());
    }
    for list in &mut successors {
        list.sort_unstable();
        list.dedup();
    }

    let mut mark = vec![Mark::Unseen; colors];
    let mut new_color = vec![cid(0); colors];
    let mut next = colors;
    let mut stack: Vec<(usize, usize)> = Vec::new();

    let starts = (0..colors)
        .filter(|&c| c != root_color.index())
        .chain(std::iter::once(root_color.index()));
    for start in starts {
        if mark[start] != Mark::Unseen {
            continue;
        }
        mark[start] = Mark::Open;
        stack.push((start, 0));
        while let Some((c, child)) = stack.last_mut() {
            let c = *c;
            if let Some(&succ) = successors[c].get(*child) {
                *child += 1;
                match mark[succ] {
                    Mark::Unseen => {
                        mark[succ] = Mark::Open;
                        stack.push((succ, 0));
                    }
                    Mark::Open => {
                        return Err(ReductionError::invariant(format!(
                            "color graph has a cycle through {}",
                            cid(succ)
                        )));
                    }
                    Mark::Done => {}
                }
            } else {
                stack.pop();
                mark[c] = Mark::Done;
                next -= 1;
                new_color[c] = cid(next);
            }
        }
    }
    Ok(new_color)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{arb_rooted_dag, is_canonical};
    use proptest::prelude::*;

    /// Root colored 3, children colored 0 and 2, grandchild colored 1.
    fn scrambled() -> ColoredGraph {
        let mut g = ColoredGraph::new();
        let leaf = g.add_vertex(ColorId::new(1));
        let a = g.add_vertex(ColorId::new(0));
        let root = g.add_vertex(ColorId::new(3));
        let b = g.add_vertex(ColorId::new(2));
        let a2 = g.add_vertex(ColorId::new(0));
        g.add_edge(root, a, 1.0).unwrap();
        g.add_edge(root, a2, 1.5).unwrap();
        g.add_edge(root, b, 2.0).unwrap();
        g.add_edge(a, leaf, -1.0).unwrap();
        g.add_edge(b, leaf, 3.0).unwrap();
        g.add_edge(a2, b, 0.5).unwrap();
        g.set_root(root).unwrap();
        g
    }

    #[test]
    fn canonical_order_and_blocks() {
        let mut g = scrambled();
        let (renumbering, intervals) = Canonicalizer::default().canonicalize(&mut g).unwrap();
        assert!(is_canonical(&g));
        assert_eq!(g.root(), Some(VertexId::new(0)));
        assert_eq!(g.color(VertexId::new(0)), ColorId::new(0));
        assert_eq!(renumbering.original_id(VertexId::new(0)), VertexId::new(2));
        assert_eq!(renumbering.original_color(ColorId::new(0)), ColorId::new(3));

        // Old color 0 holds two vertices; they stay in original order.
        let c = renumbering.canonical_id(VertexId::new(1)).map(|v| g.color(v)).unwrap();
        assert_eq!(intervals.block_len(c), 2);
        assert_eq!(
            renumbering.canonical_id(VertexId::new(4)).unwrap().index(),
            renumbering.canonical_id(VertexId::new(1)).unwrap().index() + 1
        );
        assert_eq!(intervals.first_of_next_color(ColorId::new(3)), 5);
    }

    #[test]
    fn color_cycle_is_invariant_violation() {
        let mut g = ColoredGraph::new();
        let r = g.add_vertex(ColorId::new(0));
        let a = g.add_vertex(ColorId::new(1));
        let b = g.add_vertex(ColorId::new(2));
        let a2 = g.add_vertex(ColorId::new(1));
        g.add_edge(r, a, 1.0).unwrap();
        g.add_edge(a, b, 1.0).unwrap();
        g.add_edge(b, a2, 1.0).unwrap();
        g.set_root(r).unwrap();
        let err = Canonicalizer::default().canonicalize(&mut g).unwrap_err();
        assert!(matches!(err, ReductionError::InternalInvariantViolation(_)));
    }

    #[test]
    fn missing_root_is_invariant_violation() {
        let mut g = ColoredGraph::new();
        g.add_vertex(ColorId::new(0));
        assert!(Canonicalizer::default().canonicalize(&mut g).is_err());
    }

    /// A root without outgoing edges is replaced by the first vertex that
    /// still has some.
    #[test]
    fn leaf_root_falls_back() {
        let mut g = ColoredGraph::new();
        let r = g.add_vertex(ColorId::new(0));
        let a = g.add_vertex(ColorId::new(1));
        let b = g.add_vertex(ColorId::new(2));
        g.add_edge(a, b, 1.0).unwrap();
        g.set_root(r).unwrap();
        let (renumbering, _) = Canonicalizer::default().canonicalize(&mut g).unwrap();
        let root = g.root().unwrap();
        assert!(!g.is_leaf(root));
        assert_eq!(renumbering.original_id(root), a);
    }

    #[test]
    fn contiguity_is_checked() {
        let mut g = ColoredGraph::new();
        g.add_vertex(ColorId::new(1));
        g.add_vertex(ColorId::new(0));
        assert!(ColorIntervals::compute(&g).is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

        #[test]
        fn renumbering_is_canonical(mut g in arb_rooted_dag(9, 5)) {
            let (_, intervals) = Canonicalizer::default().canonicalize(&mut g).unwrap();
            prop_assert!(is_canonical(&g));
            for c in 0..intervals.color_count() {
                for v in intervals.block(ColorId::new(c as u32)) {
                    prop_assert_eq!(g.color(VertexId::new(v as u32)).index(), c);
                }
            }
        }

        #[test]
        fn restore_round_trips(g in arb_rooted_dag(9, 5)) {
            let mut h = g.clone();
            let (renumbering, _) = Canonicalizer::default().canonicalize(&mut h).unwrap();
            renumbering.restore(&mut h).unwrap();
            for v in g.vertices() {
                prop_assert_eq!(g.color(v), h.color(v));
                prop_assert_eq!(g.out_edges(v), h.out_edges(v));
            }
            for (e, loss) in g.edges() {
                prop_assert_eq!(loss.source, h[e].source);
                prop_assert_eq!(loss.target, h[e].target);
            }
        }

        #[test]
        fn composed_renumberings_restore(g in arb_rooted_dag(9, 5)) {
            let mut h = g.clone();
            let canon = Canonicalizer::default();
            let (first, _) = canon.canonicalize(&mut h).unwrap();
            let (second, _) = canon.canonicalize(&mut h).unwrap();
            first.then(&second).restore(&mut h).unwrap();
            for (e, loss) in g.edges() {
                prop_assert_eq!(loss.source, h[e].source);
                prop_assert_eq!(loss.target, h[e].target);
            }
            for v in g.vertices() {
                prop_assert_eq!(g.color(v), h.color(v));
            }
        }
    }
}
