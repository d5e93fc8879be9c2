//! Error types.
//!
//! Construction problems (`GraphError`) and malformed reduction scripts
//! (`ScriptError`) are ordinary recoverable errors. Everything that means the
//! graph or a bound table is corrupt surfaces as
//! `ReductionError::InternalInvariantViolation`; callers should discard the
//! session when they see it.

use thiserror::Error;

use crate::arena::EdgeId;
use crate::graph::VertexId;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("unknown vertex {0}")]
    UnknownVertex(VertexId),
    #[error("unknown or deleted edge {0}")]
    UnknownEdge(EdgeId),
    #[error("self loop on vertex {0}")]
    SelfLoop(VertexId),
    #[error("edge {from} -> {to} has a NaN weight")]
    NanWeight { from: VertexId, to: VertexId },
    #[error("edge {from} -> {to} has an infinite positive weight")]
    InfiniteWeight { from: VertexId, to: VertexId },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    #[error("unknown reduction step `{0}`")]
    UnknownStep(String),
    #[error("invalid repeat count `{0}`")]
    InvalidCount(String),
    #[error("expected `(` after `{0}`")]
    MissingBlock(String),
    #[error("`(` without a repeat marker")]
    UnexpectedOpen,
    #[error("unexpected `)`")]
    UnexpectedClose,
    #[error("unclosed `(`")]
    UnclosedBlock,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReductionError {
    #[error("internal invariant violation: {0}")]
    InternalInvariantViolation(String),
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Script(#[from] ScriptError),
}

impl ReductionError {
    pub(crate) fn invariant(msg: impl Into<String>) -> Self {
        Self::InternalInvariantViolation(msg.into())
    }
}

pub type Result<T, E = ReductionError> = std::result::Result<T, E>;
