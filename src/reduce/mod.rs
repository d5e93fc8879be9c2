//! Edge-deletion rules.
//!
//! Every rule is safe (the optimum score of the graph is unchanged) and
//! incomplete. Each one scans the current edges, collects what it wants to
//! delete and applies the whole set at once, so no adjacency list is changed
//! while it is being read.

pub mod basic;
pub mod colsubtree;
pub mod implied;
pub mod slide_strong;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use basic::{reduce_negpend, reduce_unreach, reduce_vub};
pub use colsubtree::reduce_colsubtree_adv;
pub use implied::calc_implied_edges;
pub use slide_strong::reduce_slide_strong;

/// The deletion rules, named after their script commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RuleKind {
    #[serde(rename = "reduce-vub")]
    Vub,
    #[serde(rename = "reduce-unreach")]
    Unreach,
    #[serde(rename = "reduce-negpend")]
    Negpend,
    #[serde(rename = "reduce-colsubtree-adv")]
    ColsubtreeAdvantage,
    #[serde(rename = "reduce-slide-strong")]
    SlideStrong,
    #[serde(rename = "calc-implied-edges")]
    ImpliedEdges,
}

impl RuleKind {
    pub const ALL: [RuleKind; 6] = [
        RuleKind::Vub,
        RuleKind::Unreach,
        RuleKind::Negpend,
        RuleKind::ColsubtreeAdvantage,
        RuleKind::SlideStrong,
        RuleKind::ImpliedEdges,
    ];

    pub fn command(self) -> &'static str {
        match self {
            RuleKind::Vub => "reduce-vub",
            RuleKind::Unreach => "reduce-unreach",
            RuleKind::Negpend => "reduce-negpend",
            RuleKind::ColsubtreeAdvantage => "reduce-colsubtree-adv",
            RuleKind::SlideStrong => "reduce-slide-strong",
            RuleKind::ImpliedEdges => "calc-implied-edges",
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.command())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_serde_name() {
        for rule in RuleKind::ALL {
            let json = serde_json::to_string(&rule).unwrap();
            assert_eq!(json, format!("\"{rule}\""));
        }
    }
}
