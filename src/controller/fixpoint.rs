//! The fixed reduction loop.
//!
//! `Init -> SeedPass -> Loop* -> Done`. The seed pass runs Tim's bound and
//! reduce-vub once on the fresh canonical graph. Every loop iteration starts
//! the upper bounds over, tightens them with Sebastian's and then Tim's bound
//! and runs reduce-vub and reduce-unreach. The loop ends after the first
//! iteration that deletes nothing.

use tracing::{debug, info, instrument};

use crate::config::ReductionConfig;
use crate::error::{ReductionError, Result};
use crate::graph::ColoredGraph;
use crate::session::ReductionSession;
use crate::stats::ReductionStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Init,
    SeedPass,
    Loop,
    Done,
}

/// Drives one graph to its reduction fixpoint.
#[derive(Debug, Clone)]
pub struct ReductionController {
    session: ReductionSession,
    state: ControllerState,
    iterations: usize,
    limit: usize,
}

impl ReductionController {
    pub fn new(graph: ColoredGraph, config: ReductionConfig) -> Self {
        Self {
            session: ReductionSession::new(graph, config),
            state: ControllerState::Init,
            iterations: 0,
            limit: 0,
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state == ControllerState::Done
    }

    pub fn session(&self) -> &ReductionSession {
        &self.session
    }

    /// Hands the session over, for further steps or scripts.
    pub fn into_session(self) -> ReductionSession {
        self.session
    }

    /// Performs one state transition. Returns the number of edges it deleted.
    ///
    /// Stepping a finished controller does nothing.
    pub fn step(&mut self) -> Result<usize> {
        match self.state {
            ControllerState::Init => {
                self.session.renumber()?;
                self.state = ControllerState::SeedPass;
                Ok(0)
            }
            ControllerState::SeedPass => {
                self.session.tim_upper_bounds()?;
                let deleted = self.session.reduce_vub()?;
                self.limit = self
                    .session
                    .config()
                    .iteration_limit(self.session.graph().edge_count());
                self.state = ControllerState::Loop;
                Ok(deleted)
            }
            ControllerState::Loop => self.iterate(),
            ControllerState::Done => Ok(0),
        }
    }

    fn iterate(&mut self) -> Result<usize> {
        if self.iterations >= self.limit {
            return Err(ReductionError::invariant(format!(
                "no fixpoint after {} iterations",
                self.iterations
            )));
        }
        self.iterations += 1;
        self.session.stats_mut().iterations += 1;

        let s = &mut self.session;
        s.clear_upper_bounds()?;
        s.sebastian_upper_bounds()?;
        s.tim_upper_bounds()?;
        let deleted = s.reduce_vub()? + s.reduce_unreach()?;
        debug!(iteration = self.iterations, deleted, "fixpoint iteration");

        if deleted == 0 {
            if self.session.config().restore_numbering {
                self.session.unrenumber()?;
            }
            info!(
                iterations = self.iterations,
                edges = self.session.graph().edge_count(),
                deleted = self.session.stats().total_deleted(),
                "reduction reached its fixpoint"
            );
            self.state = ControllerState::Done;
        }
        Ok(deleted)
    }

    /// Steps until done and returns the reduced graph.
    #[instrument(skip_all, fields(vertices = self.session.graph().vertex_count(), edges = self.session.graph().edge_count()))]
    pub fn run(mut self) -> Result<(ColoredGraph, ReductionStats)> {
        while !self.is_done() {
            self.step()?;
        }
        Ok(self.session.finish())
    }
}
