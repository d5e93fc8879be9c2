//! Diagnostic counters for one reduction session.
//!
//! Purely informational: nothing in the reduction reads these back.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::bounds::BoundSummary;
use crate::reduce::RuleKind;

/// Why calc-implied-edges removed an edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpliedEdgeStats {
    /// Two forced-in child edges imply the same color.
    pub known_forced: usize,
    /// The counting argument over undetermined children forces a color twice.
    pub unknown_forced: usize,
    /// No choice of children can pay for the edge.
    pub insufficient_payoff: usize,
}

impl ImpliedEdgeStats {
    pub fn total(&self) -> usize {
        self.known_forced + self.unknown_forced + self.insufficient_payoff
    }

    fn merge(&mut self, other: &ImpliedEdgeStats) {
        self.known_forced += other.known_forced;
        self.unknown_forced += other.unknown_forced;
        self.insufficient_payoff += other.insufficient_payoff;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReductionStats {
    /// Edges deleted, per rule.
    pub deleted_by_rule: BTreeMap<RuleKind, usize>,
    /// Completed iterations of the fixpoint loop (or of `* ( ... )` blocks).
    pub iterations: usize,
    /// Highest upper bound any bound pass produced.
    pub highest_upper_bound: Option<f64>,
    /// Smallest `w + UB(target)` among edges kept by any reduce-vub pass.
    pub scared_edge: Option<f64>,
    /// Non-leaf vertices with a zero bound after the latest bound pass.
    pub zero_bound_vertices: usize,
    /// Outgoing edges of those vertices.
    pub edges_below_zero_bounds: usize,
    pub implied: ImpliedEdgeStats,
}

impl ReductionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_deleted(&self) -> usize {
        self.deleted_by_rule.values().sum()
    }

    pub fn deleted_by(&self, rule: RuleKind) -> usize {
        self.deleted_by_rule.get(&rule).copied().unwrap_or(0)
    }

    pub(crate) fn record_deletions(&mut self, rule: RuleKind, deleted: usize) {
        *self.deleted_by_rule.entry(rule).or_insert(0) += deleted;
    }

    pub(crate) fn record_bound(&mut self, summary: &BoundSummary) {
        if summary.highest.is_finite() {
            self.highest_upper_bound = Some(
                self.highest_upper_bound
                    .map_or(summary.highest, |h| h.max(summary.highest)),
            );
        }
        self.zero_bound_vertices = summary.zero_bound_vertices;
        self.edges_below_zero_bounds = summary.edges_below_zero_bounds;
    }

    /// Folds another session's (or sub-run's) counters into this one.
    pub fn merge(&mut self, other: &ReductionStats) {
        for (&rule, &n) in &other.deleted_by_rule {
            self.record_deletions(rule, n);
        }
        self.iterations += other.iterations;
        self.highest_upper_bound = match (self.highest_upper_bound, other.highest_upper_bound) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        self.scared_edge = match (self.scared_edge, other.scared_edge) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        self.zero_bound_vertices = other.zero_bound_vertices;
        self.edges_below_zero_bounds = other.edges_below_zero_bounds;
        self.implied.merge(&other.implied);
    }
}
