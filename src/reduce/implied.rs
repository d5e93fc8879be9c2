//! Implied colors.
//!
//! Call a subtree *worth keeping* when the edge into its root plus the rest
//! of it scores strictly above zero. Some optimal tree consists of
//! worth-keeping subtrees only, so an edge whose subtree can never be worth
//! keeping may go. For every surviving edge we record the colors any
//! worth-keeping subtree behind it must contain; two disjoint subtrees that
//! must both contain one color cannot coexist in a colorful tree.

use tracing::debug;

use super::basic::finish;
use super::RuleKind;
use crate::arena::EdgeId;
use crate::bounds::UpperBounds;
use crate::graph::{ColorId, ColoredGraph};
use crate::stats::ReductionStats;

/// Why an edge was found useless.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Keep,
    KnownForced,
    UnknownForced,
    InsufficientPayoff,
}

/// Requires canonical order and an upper bound table valid for this graph.
pub fn calc_implied_edges(graph: &mut ColoredGraph, ub: &UpperBounds, stats: &mut ReductionStats) -> usize {
    let mut implied: Vec<Option<Vec<ColorId>>> = vec![None; graph.edge_capacity()];
    let mut doomed = Vec::new();

    for u in graph.vertices().rev() {
        for &e in graph.out_edges(u) {
            let (verdict, colors) = examine(graph, ub, &implied, e);
            match verdict {
                Verdict::Keep => implied[e.index()] = Some(colors),
                Verdict::KnownForced => stats.implied.known_forced += 1,
                Verdict::UnknownForced => stats.implied.unknown_forced += 1,
                Verdict::InsufficientPayoff => stats.implied.insufficient_payoff += 1,
            }
            if verdict != Verdict::Keep {
                doomed.push(e);
            }
        }
    }
    debug!(
        known_forced = stats.implied.known_forced,
        unknown_forced = stats.implied.unknown_forced,
        insufficient_payoff = stats.implied.insufficient_payoff,
        "implied edges"
    );
    finish(graph, RuleKind::ImpliedEdges, doomed, stats)
}

/// Decides one edge from the implied sets of the child edges of its target.
/// Children already condemned in this pass carry no implied set and are
/// ignored.
fn examine(
    graph: &ColoredGraph,
    ub: &UpperBounds,
    implied: &[Option<Vec<ColorId>>],
    e: EdgeId,
) -> (Verdict, Vec<ColorId>) {
    let loss = &graph[e];
    let v = loss.target;
    let own = vec![graph.color(v)];
    if loss.weight >= 0.0 {
        return (Verdict::Keep, own);
    }

    let children: Vec<(f64, &[ColorId])> = graph
        .out_edges(v)
        .iter()
        .filter_map(|&c| {
            let set = implied.get(c.index())?.as_deref()?;
            let child = &graph[c];
            Some(((child.weight + ub.get(child.target)).max(0.0), set))
        })
        .collect();
    let total: f64 = children.iter().map(|(p, _)| p).sum();
    let deficit = -loss.weight;

    // Forced children: without them the others cannot cover the deficit.
    let mut forced = own;
    let mut forced_payoff = 0.0;
    let mut candidates = Vec::new();
    for &(payoff, set) in &children {
        if total - payoff <= deficit {
            forced_payoff += payoff;
            match merge_disjoint(&forced, set) {
                Some(merged) => forced = merged,
                None => return (Verdict::KnownForced, Vec::new()),
            }
        } else {
            candidates.push((payoff, set));
        }
    }

    let missing = deficit - forced_payoff;
    if missing < 0.0 {
        return (Verdict::Keep, forced);
    }

    candidates.retain(|(_, set)| !intersects(&forced, set));
    let available: f64 = candidates.iter().map(|(p, _)| p).sum();
    if candidates.is_empty() || available <= missing {
        return (Verdict::InsufficientPayoff, Vec::new());
    }

    // Any selection that covers the deficit holds at least `k` candidates.
    candidates.sort_by(|a, b| b.0.total_cmp(&a.0));
    let mut k = 0;
    let mut covered = 0.0;
    for (payoff, _) in &candidates {
        if covered > missing {
            break;
        }
        covered += payoff;
        k += 1;
    }
    let n = candidates.len();

    let mut counts: Vec<(ColorId, usize)> = Vec::new();
    for (_, set) in &candidates {
        for &c in *set {
            match counts.binary_search_by_key(&c, |&(cc, _)| cc) {
                Ok(i) => counts[i].1 += 1,
                Err(i) => counts.insert(i, (c, 1)),
            }
        }
    }

    // A color carried by `m` candidates is missed only by selections drawn
    // from the other `n - m`.
    let mut also = Vec::new();
    for (c, m) in counts {
        if m + k >= n + 2 {
            return (Verdict::UnknownForced, Vec::new());
        }
        if m + k >= n + 1 {
            also.push(c);
        }
    }
    match merge_disjoint(&forced, &also) {
        Some(merged) => (Verdict::Keep, merged),
        None => (Verdict::UnknownForced, Vec::new()),
    }
}

/// Sorted union of two sorted sets, or `None` if they share an element.
fn merge_disjoint(a: &[ColorId], b: &[ColorId]) -> Option<Vec<ColorId>> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => {
                out.push(a[i]);
                i += 1;
            }
            std::cmp::Ordering::Greater => {
                out.push(b[j]);
                j += 1;
            }
            std::cmp::Ordering::Equal => return None,
        }
    }
    out.extend_from_slice(&a[i..]);
    out.extend_from_slice(&b[j..]);
    Some(out)
}

fn intersects(a: &[ColorId], b: &[ColorId]) -> bool {
    b.iter().any(|c| a.binary_search(c).is_ok())
}
