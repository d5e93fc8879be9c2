//! Anchor lower bounds.
//!
//! Both tables answer the same kind of question: if some vertex is in a
//! colorful subtree, what edge weight can we certainly add by hanging one more
//! vertex off the (unknown) path from the root down to it? The anchor-to-color
//! table names a color, the vertex anchor table a concrete target vertex.
//!
//! Both require that no unreachable edges are left (see
//! [`has_unreachable_edges`]); a non-root vertex without in-edges gets
//! `-inf` everywhere because no subtree can contain it.

use crate::graph::{vid, ColorId, ColoredGraph, VertexId};

/// `true` if some non-root vertex has outgoing edges but no incoming ones.
pub fn has_unreachable_edges(graph: &ColoredGraph) -> bool {
    let root = graph.root();
    graph
        .vertices()
        .any(|v| Some(v) != root && graph.in_edges(v).is_empty() && !graph.is_leaf(v))
}

/// `LBcolor[v][c]`: with `v` in the subtree and no `c`-colored vertex in it,
/// some vertex on the root path of `v` (including `v`) has an edge of at
/// least this weight to a `c`-colored vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorBounds {
    colors: usize,
    values: Vec<f64>,
}

impl AnchorBounds {
    /// One pass in id order: the direct edges of `v`, or the weakest
    /// guarantee among its parents, whichever is larger. The root has no
    /// parents to fall back on and keeps its direct edges only.
    pub fn compute(graph: &ColoredGraph) -> Self {
        let colors = graph.color_count();
        let mut values = vec![f64::NEG_INFINITY; graph.vertex_count() * colors];
        let root = graph.root();

        for v in graph.vertices() {
            let is_root = Some(v) == root;
            if !is_root && graph.in_edges(v).is_empty() {
                continue;
            }
            let (done, rest) = values.split_at_mut(v.index() * colors);
            let row = &mut rest[..colors];
            row[graph.color(v).index()] = 0.0;
            for &e in graph.out_edges(v) {
                let loss = &graph[e];
                let c = graph.color(loss.target).index();
                row[c] = row[c].max(loss.weight);
            }
            if is_root {
                continue;
            }
            for (c, slot) in row.iter_mut().enumerate() {
                let worst = graph
                    .in_edges(v)
                    .iter()
                    .map(|&e| {
                        done.get(graph[e].source.index() * colors + c)
                            .copied()
                            .unwrap_or(f64::NEG_INFINITY)
                    })
                    .fold(f64::INFINITY, f64::min);
                *slot = slot.max(worst);
            }
        }
        Self { colors, values }
    }

    pub fn get(&self, v: VertexId, c: ColorId) -> f64 {
        self.values[v.index() * self.colors + c.index()]
    }

    pub fn color_count(&self) -> usize {
        self.colors
    }
}

/// `LBpair[z][u]` for `u <= z`: with `u` in the subtree and `z`'s color
/// free, an edge into `z` of at least this weight can be added from the root
/// path of `u`.
#[derive(Debug, Clone, PartialEq)]
pub struct PairAnchorBounds {
    /// Row `z` holds `z + 1` entries, stored back to back.
    values: Vec<f64>,
}

impl PairAnchorBounds {
    /// For every target `z`, walks `u = 0..=z` in id order so each parent's
    /// entry is ready before its children need it.
    pub fn compute(graph: &ColoredGraph) -> Self {
        let n = graph.vertex_count();
        let mut values = Vec::with_capacity(n * (n + 1) / 2);
        let root = graph.root();

        for z in graph.vertices() {
            let row_start = values.len();
            let z_reachable = !graph.in_edges(z).is_empty();
            for u in 0..=z.index() {
                let u = vid(u);
                if Some(z) == root {
                    values.push(0.0);
                    continue;
                }
                let north = if graph.in_edges(u).is_empty() {
                    f64::NEG_INFINITY
                } else {
                    graph
                        .in_edges(u)
                        .iter()
                        .map(|&e| {
                            values
                                .get(row_start + graph[e].source.index())
                                .copied()
                                .unwrap_or(f64::NEG_INFINITY)
                        })
                        .fold(f64::INFINITY, f64::min)
                };
                let direct = if u == z && z_reachable {
                    0.0
                } else {
                    graph
                        .find_edge(u, z)
                        .map_or(f64::NEG_INFINITY, |e| graph[e].weight)
                };
                values.push(north.max(direct));
            }
        }
        Self { values }
    }

    /// `-inf` for `u > z`.
    pub fn get(&self, z: VertexId, u: VertexId) -> f64 {
        if u > z {
            return f64::NEG_INFINITY;
        }
        let (z, u) = (z.index(), u.index());
        self.values[z * (z + 1) / 2 + u]
    }
}
