//! Sequencing of bounds and rules.
//!
//! [`ReductionController`] runs the standard fixpoint loop as an explicit
//! state machine; [`ReductionScript`] runs any sequence of steps the caller
//! writes down.

pub mod fixpoint;
pub mod script;

pub use fixpoint::{ControllerState, ReductionController};
pub use script::{ReductionScript, ScriptItem, Step};
