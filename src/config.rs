//! Reduction settings.

use serde::{Deserialize, Serialize};

use crate::bounds::SebastianMode;

/// Knobs for a [`ReductionController`](crate::ReductionController) or
/// [`ReductionSession`](crate::ReductionSession). Missing fields take their
/// defaults when deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReductionConfig {
    /// Use the strengthened variant of Sebastian's bound.
    pub strengthen_upper_bounds: bool,
    /// Re-check topological order after renumbering and adjacency
    /// bookkeeping before the slide bound.
    pub verify_invariants: bool,
    /// Put the original vertex ids and colors back when done.
    pub restore_numbering: bool,
    /// Cap on fixpoint iterations; `None` means one more than the edge count
    /// at the start of the loop.
    pub max_iterations: Option<usize>,
}

impl Default for ReductionConfig {
    fn default() -> Self {
        Self {
            strengthen_upper_bounds: true,
            verify_invariants: true,
            restore_numbering: false,
            max_iterations: None,
        }
    }
}

impl ReductionConfig {
    pub fn sebastian_mode(&self) -> SebastianMode {
        if self.strengthen_upper_bounds {
            SebastianMode::Strengthened
        } else {
            SebastianMode::Plain
        }
    }

    /// Iteration cap for a graph that currently has `edges` edges.
    pub fn iteration_limit(&self, edges: usize) -> usize {
        self.max_iterations.unwrap_or(edges + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config: ReductionConfig = serde_json::from_str(r#"{"restore_numbering": true}"#).unwrap();
        assert!(config.restore_numbering);
        assert!(config.strengthen_upper_bounds);
        assert!(config.verify_invariants);
        assert_eq!(config.max_iterations, None);
    }

    #[test]
    fn round_trips_through_json() {
        let config = ReductionConfig {
            strengthen_upper_bounds: false,
            max_iterations: Some(7),
            ..ReductionConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: ReductionConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
        assert_eq!(back.sebastian_mode(), SebastianMode::Plain);
    }

    #[test]
    fn iteration_limit_defaults_to_edges_plus_one() {
        assert_eq!(ReductionConfig::default().iteration_limit(10), 11);
        let capped = ReductionConfig {
            max_iterations: Some(3),
            ..ReductionConfig::default()
        };
        assert_eq!(capped.iteration_limit(10), 3);
    }
}
