//! Rooted, edge-weighted, vertex-colored DAG.
//!
//! # Invariants
//! - Every live edge appears exactly once in its source's outgoing list and
//!   exactly once in its target's incoming list.
//! - `Loss::out_pos` / `Loss::in_pos` are the edge's current positions in
//!   those two lists.
//! - No edge weight is NaN or `+inf`.
//!
//! Deletion swap-removes the edge from both lists in one call and repairs the
//! cached position of whichever edge moved into the freed slot. Callers that
//! want to delete while scanning collect ids first and use
//! [`ColoredGraph::delete_edges`].

use std::ops::Index;

use serde::{Deserialize, Serialize};

use super::{vid, ColorId, VertexId};
use crate::arena::{EdgeArena, EdgeId};
use crate::error::{GraphError, ReductionError};

/// A weighted edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loss {
    pub source: VertexId,
    pub target: VertexId,
    pub weight: f64,
    #[serde(skip)]
    out_pos: usize,
    #[serde(skip)]
    in_pos: usize,
}

/// A vertex with its color and adjacency.
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    color: ColorId,
    out: Vec<EdgeId>,
    inc: Vec<EdgeId>,
}

impl Vertex {
    pub fn color(&self) -> ColorId {
        self.color
    }

    pub fn out_edges(&self) -> &[EdgeId] {
        &self.out
    }

    pub fn in_edges(&self) -> &[EdgeId] {
        &self.inc
    }
}

#[derive(Debug, Clone, Default)]
pub struct ColoredGraph {
    vertices: Vec<Vertex>,
    edges: EdgeArena<Loss>,
    root: Option<VertexId>,
}

impl ColoredGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_vertex(&mut self, color: ColorId) -> VertexId {
        let id = vid(self.vertices.len());
        self.vertices.push(Vertex {
            color,
            out: Vec::new(),
            inc: Vec::new(),
        });
        id
    }

    /// Adds an edge `source -> target`.
    ///
    /// Rejects unknown endpoints, self loops, NaN and `+inf` weights.
    /// Negative weights, `-inf` included, are accepted.
    pub fn add_edge(
        &mut self,
        source: VertexId,
        target: VertexId,
        weight: f64,
    ) -> Result<EdgeId, GraphError> {
        self.check_vertex(source)?;
        self.check_vertex(target)?;
        if source == target {
            return Err(GraphError::SelfLoop(source));
        }
        if weight.is_nan() {
            return Err(GraphError::NanWeight {
                from: source,
                to: target,
            });
        }
        if weight == f64::INFINITY {
            return Err(GraphError::InfiniteWeight {
                from: source,
                to: target,
            });
        }
        let out_pos = self.vertices[source.index()].out.len();
        let in_pos = self.vertices[target.index()].inc.len();
        let id = self.edges.allocate(Loss {
            source,
            target,
            weight,
            out_pos,
            in_pos,
        });
        self.vertices[source.index()].out.push(id);
        self.vertices[target.index()].inc.push(id);
        Ok(id)
    }

    pub fn set_root(&mut self, root: VertexId) -> Result<(), GraphError> {
        self.check_vertex(root)?;
        self.root = Some(root);
        Ok(())
    }

    /// Re-points the root reference without any structural checks beyond
    /// existence. Used when renumbering leaves the designated root without
    /// outgoing edges.
    pub fn force_root(&mut self, root: VertexId) -> Result<(), GraphError> {
        self.set_root(root)
    }

    pub fn root(&self) -> Option<VertexId> {
        self.root
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.live_count()
    }

    /// Largest color in use, or `None` for an empty graph.
    pub fn max_color(&self) -> Option<ColorId> {
        self.vertices.iter().map(|v| v.color).max()
    }

    /// Number of color slots (`max_color + 1`).
    pub fn color_count(&self) -> usize {
        self.max_color().map_or(0, |c| c.index() + 1)
    }

    pub fn vertex(&self, v: VertexId) -> &Vertex {
        &self.vertices[v.index()]
    }

    pub fn vertices(&self) -> impl DoubleEndedIterator<Item = VertexId> + ExactSizeIterator {
        (0..self.vertices.len()).map(vid)
    }

    pub fn color(&self, v: VertexId) -> ColorId {
        self.vertices[v.index()].color
    }

    pub fn out_edges(&self, v: VertexId) -> &[EdgeId] {
        &self.vertices[v.index()].out
    }

    pub fn in_edges(&self, v: VertexId) -> &[EdgeId] {
        &self.vertices[v.index()].inc
    }

    pub fn is_leaf(&self, v: VertexId) -> bool {
        self.vertices[v.index()].out.is_empty()
    }

    /// One past the highest edge id ever handed out; sizes per-edge tables.
    pub fn edge_capacity(&self) -> usize {
        self.edges.capacity()
    }

    pub fn edge(&self, e: EdgeId) -> Option<&Loss> {
        self.edges.get(e)
    }

    /// Live edges in arena order.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &Loss)> {
        self.edges.iter()
    }

    /// Finds an edge `source -> target`, if any.
    pub fn find_edge(&self, source: VertexId, target: VertexId) -> Option<EdgeId> {
        self.out_edges(source)
            .iter()
            .copied()
            .find(|&e| self.edges[e].target == target)
    }

    /// Removes `e` from both adjacency lists and the arena.
    pub fn delete_edge(&mut self, e: EdgeId) -> Result<Loss, GraphError> {
        let loss = self.edges.deallocate(e).ok_or(GraphError::UnknownEdge(e))?;

        let out = &mut self.vertices[loss.source.index()].out;
        debug_assert_eq!(out[loss.out_pos], e);
        out.swap_remove(loss.out_pos);
        if let Some(&moved) = out.get(loss.out_pos) {
            self.edges[moved].out_pos = loss.out_pos;
        }

        let inc = &mut self.vertices[loss.target.index()].inc;
        debug_assert_eq!(inc[loss.in_pos], e);
        inc.swap_remove(loss.in_pos);
        if let Some(&moved) = inc.get(loss.in_pos) {
            self.edges[moved].in_pos = loss.in_pos;
        }

        Ok(loss)
    }

    /// Deletes every live edge in `batch`, ignoring duplicates and ids that
    /// are already gone. Returns the number of edges removed.
    pub fn delete_edges<I>(&mut self, batch: I) -> usize
    where
        I: IntoIterator<Item = EdgeId>,
    {
        batch
            .into_iter()
            .filter(|&e| self.delete_edge(e).is_ok())
            .count()
    }

    /// Moves every vertex `v` to position `new_id[v]` and gives it color
    /// `new_color[color(v)]`. `new_id` must be a permutation of the vertex
    /// ids; edge ids and adjacency order are preserved.
    pub fn set_vertex_order(
        &mut self,
        new_id: &[VertexId],
        new_color: &[ColorId],
    ) -> Result<(), ReductionError> {
        let n = self.vertices.len();
        if new_id.len() != n {
            return Err(ReductionError::invariant(format!(
                "vertex order has {} entries for {} vertices",
                new_id.len(),
                n
            )));
        }
        let mut taken = vec![false; n];
        for &target in new_id {
            match taken.get_mut(target.index()) {
                Some(slot) if !*slot => *slot = true,
                _ => {
                    return Err(ReductionError::invariant(format!(
                        "vertex order is not a permutation at {target}"
                    )))
                }
            }
        }
        if let Some(v) = self.vertices.iter().find(|v| v.color.index() >= new_color.len()) {
            return Err(ReductionError::invariant(format!(
                "no color mapping for {}",
                v.color
            )));
        }

        let mut slots: Vec<Option<Vertex>> = (0..n).map(|_| None).collect();
        for (old, vertex) in self.vertices.drain(..).enumerate() {
            let color = new_color[vertex.color.index()];
            slots[new_id[old].index()] = Some(Vertex { color, ..vertex });
        }
        self.vertices = slots.into_iter().flatten().collect();
        for (_, loss) in self.edges.iter_mut() {
            loss.source = new_id[loss.source.index()];
            loss.target = new_id[loss.target.index()];
        }
        self.root = self.root.map(|r| new_id[r.index()]);
        Ok(())
    }

    /// Releases spare adjacency capacity and verifies the bookkeeping: list
    /// lengths sum to the live edge count on both sides and every cached
    /// position points back at its edge.
    pub fn compact(&mut self) -> Result<(), ReductionError> {
        let live = self.edges.live_count();
        let mut out_total = 0;
        let mut in_total = 0;
        for (index, vertex) in self.vertices.iter_mut().enumerate() {
            vertex.out.shrink_to_fit();
            vertex.inc.shrink_to_fit();
            out_total += vertex.out.len();
            in_total += vertex.inc.len();
            for (pos, &e) in vertex.out.iter().enumerate() {
                let loss = self.edges.get(e).ok_or_else(|| {
                    ReductionError::invariant(format!("{} lists dead edge {e}", vid(index)))
                })?;
                if loss.out_pos != pos || loss.source.index() != index {
                    return Err(ReductionError::invariant(format!(
                        "stale outgoing position for {e}"
                    )));
                }
            }
            for (pos, &e) in vertex.inc.iter().enumerate() {
                let loss = self.edges.get(e).ok_or_else(|| {
                    ReductionError::invariant(format!("{} lists dead edge {e}", vid(index)))
                })?;
                if loss.in_pos != pos || loss.target.index() != index {
                    return Err(ReductionError::invariant(format!(
                        "stale incoming position for {e}"
                    )));
                }
            }
        }
        if out_total != live || in_total != live {
            return Err(ReductionError::invariant(format!(
                "adjacency sums ({out_total} out, {in_total} in) disagree with {live} live edges"
            )));
        }
        Ok(())
    }

    /// Checks `id(u) < id(v)` and `color(u) < color(v)` for every edge.
    pub fn check_topological(&self) -> Result<(), ReductionError> {
        for (e, loss) in self.edges.iter() {
            let (u, v) = (loss.source, loss.target);
            if u >= v || self.color(u) >= self.color(v) {
                return Err(ReductionError::invariant(format!(
                    "edge {e} ({u} {} -> {v} {}) violates the canonical order",
                    self.color(u),
                    self.color(v)
                )));
            }
        }
        Ok(())
    }

    /// Vertex ids grouped by color, each group in id order.
    pub fn vertices_by_color(&self) -> Vec<Vec<VertexId>> {
        let mut groups = vec![Vec::new(); self.color_count()];
        for (index, vertex) in self.vertices.iter().enumerate() {
            groups[vertex.color.index()].push(vid(index));
        }
        groups
    }

    fn check_vertex(&self, v: VertexId) -> Result<(), GraphError> {
        if v.index() < self.vertices.len() {
            Ok(())
        } else {
            Err(GraphError::UnknownVertex(v))
        }
    }
}

impl Index<EdgeId> for ColoredGraph {
    type Output = Loss;

    fn index(&self, e: EdgeId) -> &Loss {
        &self.edges[e]
    }
}
