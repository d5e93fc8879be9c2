//! Colored fragmentation graphs.
//!
//! Vertices are addressed by dense `VertexId`s (their position in the vertex
//! list) and carry a `ColorId`. Edges live in an [`EdgeArena`](crate::arena::EdgeArena)
//! and are referenced from both endpoints' adjacency lists.

pub mod colored;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use colored::{ColoredGraph, Loss, Vertex};

/// Dense vertex identifier: the vertex's position in the graph's vertex list.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VertexId(u32);

impl VertexId {
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn as_u32(&self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Color of a vertex. A colorful subtree holds at most one vertex per color.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ColorId(u32);

impl ColorId {
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn as_u32(&self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ColorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

#[inline]
pub(crate) fn vid(index: usize) -> VertexId {
    VertexId(index as u32)
}

#[inline]
pub(crate) fn cid(index: usize) -> ColorId {
    ColorId(index as u32)
}
