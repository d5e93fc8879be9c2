//! Bound engines.
//!
//! Upper bounds (`UB[v]`, a ceiling on the score any colorful subtree rooted
//! at `v` can add below `v`) come from [`upper::tim_bound`] and
//! [`sebastian::sebastian_bound`]. Lower bounds come from the anchor tables in
//! [`anchor`] and the slide table in [`slide`]. All of them assume the
//! canonical order produced by [`crate::canon::Canonicalizer`]: processing
//! ids in decreasing order visits every child before its parents.

pub mod anchor;
pub mod sebastian;
pub mod slide;
pub mod upper;

pub use anchor::{AnchorBounds, PairAnchorBounds};
pub use sebastian::{sebastian_bound, BestEdge, SebastianMode};
pub use slide::SlideBounds;
pub use upper::{tim_bound, BoundSummary, UpperBounds};
