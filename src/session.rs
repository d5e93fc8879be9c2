//! One reduction session: the graph plus every table computed on it.
//!
//! Each step checks that the tables it reads were computed on the current
//! graph. Anchor and slide tables are tagged with the graph revision, which
//! moves on every deletion and renumbering; upper bounds are tagged with the
//! ordering revision, which only moves on renumbering, because deleting edges
//! never invalidates an upper bound. A step whose inputs are missing or stale
//! logs a warning and does nothing.

use tracing::{debug, instrument, warn};

use crate::bounds::anchor::has_unreachable_edges;
use crate::bounds::{
    sebastian_bound, tim_bound, AnchorBounds, PairAnchorBounds, SebastianMode, SlideBounds,
    UpperBounds,
};
use crate::canon::{Canonicalizer, ColorIntervals, Renumbering};
use crate::config::ReductionConfig;
use crate::error::Result;
use crate::graph::ColoredGraph;
use crate::reduce;
use crate::stats::ReductionStats;

/// A table and the revision it was computed at.
#[derive(Debug, Clone)]
struct Tagged<T> {
    revision: u64,
    table: T,
}

#[derive(Debug, Clone)]
struct AnchorTables {
    color: AnchorBounds,
    pair: PairAnchorBounds,
}

#[derive(Debug, Clone)]
pub struct ReductionSession {
    graph: ColoredGraph,
    config: ReductionConfig,
    mode: SebastianMode,
    /// Inverse of every renumbering applied so far, back to the input ids.
    renumbering: Option<Renumbering>,
    /// Present while the graph is in canonical order.
    intervals: Option<ColorIntervals>,
    ordering: u64,
    revision: u64,
    ub: Option<Tagged<UpperBounds>>,
    anchors: Option<Tagged<AnchorTables>>,
    slide: Option<Tagged<SlideBounds>>,
    stats: ReductionStats,
}

impl ReductionSession {
    pub fn new(graph: ColoredGraph, config: ReductionConfig) -> Self {
        Self {
            mode: config.sebastian_mode(),
            graph,
            config,
            renumbering: None,
            intervals: None,
            ordering: 0,
            revision: 0,
            ub: None,
            anchors: None,
            slide: None,
            stats: ReductionStats::new(),
        }
    }

    pub fn graph(&self) -> &ColoredGraph {
        &self.graph
    }

    pub fn config(&self) -> &ReductionConfig {
        &self.config
    }

    pub fn stats(&self) -> &ReductionStats {
        &self.stats
    }

    pub(crate) fn stats_mut(&mut self) -> &mut ReductionStats {
        &mut self.stats
    }

    /// Maps canonical ids back to the caller's ids, if the graph was
    /// renumbered and not restored.
    pub fn renumbering(&self) -> Option<&Renumbering> {
        self.renumbering.as_ref()
    }

    pub fn is_canonical(&self) -> bool {
        self.intervals.is_some()
    }

    /// Upper bounds, if they belong to the current vertex order.
    pub fn upper_bounds(&self) -> Option<&UpperBounds> {
        fresh(&self.ub, self.ordering)
    }

    pub fn sebastian_mode(&self) -> SebastianMode {
        self.mode
    }

    pub fn set_sebastian_mode(&mut self, mode: SebastianMode) {
        self.mode = mode;
    }

    /// Hands back the graph and the counters.
    pub fn finish(self) -> (ColoredGraph, ReductionStats) {
        (self.graph, self.stats)
    }

    /// Brings the graph into canonical order. Every table goes stale.
    #[instrument(skip_all, fields(vertices = self.graph.vertex_count(), edges = self.graph.edge_count()))]
    pub fn renumber(&mut self) -> Result<usize> {
        let canon = Canonicalizer::new(self.config.verify_invariants);
        let (renumbering, intervals) = canon.canonicalize(&mut self.graph)?;
        self.renumbering = Some(match self.renumbering.take() {
            Some(earlier) => earlier.then(&renumbering),
            None => renumbering,
        });
        self.intervals = Some(intervals);
        self.reordered();
        Ok(0)
    }

    /// Puts the caller's ids and colors back. Bound tables go stale.
    pub fn unrenumber(&mut self) -> Result<usize> {
        let Some(renumbering) = self.renumbering.take() else {
            debug!("graph was never renumbered");
            return Ok(0);
        };
        renumbering.restore(&mut self.graph)?;
        self.intervals = None;
        self.reordered();
        Ok(0)
    }

    fn reordered(&mut self) {
        self.ordering += 1;
        self.revision += 1;
    }

    /// Resets every upper bound to `+inf`.
    pub fn clear_upper_bounds(&mut self) -> Result<usize> {
        self.ub = Some(Tagged {
            revision: self.ordering,
            table: UpperBounds::unbounded(self.graph.vertex_count()),
        });
        Ok(0)
    }

    pub fn tim_upper_bounds(&mut self) -> Result<usize> {
        if !self.require_canonical("tim-ubs") {
            return Ok(0);
        }
        let ub = upper_for(&mut self.ub, self.ordering, self.graph.vertex_count());
        let summary = tim_bound(&self.graph, ub)?;
        ub.check_not_nan()?;
        self.stats.record_bound(&summary);
        Ok(0)
    }

    pub fn sebastian_upper_bounds(&mut self) -> Result<usize> {
        if !self.require_canonical("seb-ubs") {
            return Ok(0);
        }
        let ub = upper_for(&mut self.ub, self.ordering, self.graph.vertex_count());
        let summary = sebastian_bound(&self.graph, ub, self.mode)?;
        ub.check_not_nan()?;
        self.stats.record_bound(&summary);
        Ok(0)
    }

    /// Computes both anchor tables. Skipped while unreachable edges remain.
    pub fn anchor_lower_bounds(&mut self) -> Result<usize> {
        if !self.require_canonical("calc-anchor-lbs") {
            return Ok(0);
        }
        if has_unreachable_edges(&self.graph) {
            warn!("unreachable edges left; run reduce-unreach before calc-anchor-lbs");
            return Ok(0);
        }
        self.anchors = Some(Tagged {
            revision: self.revision,
            table: AnchorTables {
                color: AnchorBounds::compute(&self.graph),
                pair: PairAnchorBounds::compute(&self.graph),
            },
        });
        Ok(0)
    }

    /// Computes the slide table from the current anchor and upper bounds.
    #[instrument(skip_all, fields(vertices = self.graph.vertex_count()))]
    pub fn slide_lower_bounds(&mut self) -> Result<usize> {
        if !self.require_canonical("calc-slide-lbs") {
            return Ok(0);
        }
        if fresh(&self.anchors, self.revision).is_none() || self.upper_bounds().is_none() {
            warn!("anchor or upper bounds missing or stale; skipping calc-slide-lbs");
            return Ok(0);
        }
        self.graph.compact()?;
        let (Some(intervals), Some(anchors), Some(ub)) = (
            self.intervals.as_ref(),
            fresh(&self.anchors, self.revision),
            fresh(&self.ub, self.ordering),
        ) else {
            return Ok(0);
        };
        let slide = SlideBounds::compute(&self.graph, intervals, ub, &anchors.color);
        self.slide = Some(Tagged {
            revision: self.revision,
            table: slide,
        });
        Ok(0)
    }

    pub fn reduce_vub(&mut self) -> Result<usize> {
        let Some(ub) = fresh(&self.ub, self.ordering) else {
            warn!("upper bounds missing or stale; skipping reduce-vub");
            return Ok(0);
        };
        let deleted = reduce::reduce_vub(&mut self.graph, ub, &mut self.stats);
        Ok(self.deleted(deleted))
    }

    pub fn reduce_unreach(&mut self) -> Result<usize> {
        let deleted = reduce::reduce_unreach(&mut self.graph, &mut self.stats);
        Ok(self.deleted(deleted))
    }

    pub fn reduce_negpend(&mut self) -> Result<usize> {
        let deleted = reduce::reduce_negpend(&mut self.graph, &mut self.stats);
        Ok(self.deleted(deleted))
    }

    pub fn reduce_colsubtree_adv(&mut self) -> Result<usize> {
        if !self.require_canonical("reduce-colsubtree-adv") {
            return Ok(0);
        }
        let Some(anchors) = fresh(&self.anchors, self.revision) else {
            warn!("anchor bounds missing or stale; skipping reduce-colsubtree-adv");
            return Ok(0);
        };
        let deleted = reduce::reduce_colsubtree_adv(
            &mut self.graph,
            &anchors.color,
            &anchors.pair,
            self.mode,
            &mut self.stats,
        );
        Ok(self.deleted(deleted))
    }

    pub fn reduce_slide_strong(&mut self) -> Result<usize> {
        let Some(intervals) = self.intervals.as_ref() else {
            warn!("graph is not in canonical order; skipping reduce-slide-strong");
            return Ok(0);
        };
        let (Some(anchors), Some(slide)) = (
            fresh(&self.anchors, self.revision),
            fresh(&self.slide, self.revision),
        ) else {
            warn!("slide or anchor bounds missing or stale; skipping reduce-slide-strong");
            return Ok(0);
        };
        let deleted = reduce::reduce_slide_strong(
            &mut self.graph,
            intervals,
            &anchors.pair,
            slide,
            &mut self.stats,
        );
        Ok(self.deleted(deleted))
    }

    pub fn calc_implied_edges(&mut self) -> Result<usize> {
        if !self.require_canonical("calc-implied-edges") {
            return Ok(0);
        }
        let Some(ub) = fresh(&self.ub, self.ordering) else {
            warn!("upper bounds missing or stale; skipping calc-implied-edges");
            return Ok(0);
        };
        let deleted = reduce::calc_implied_edges(&mut self.graph, ub, &mut self.stats);
        Ok(self.deleted(deleted))
    }

    fn deleted(&mut self, deleted: usize) -> usize {
        if deleted > 0 {
            self.revision += 1;
        }
        deleted
    }

    fn require_canonical(&self, step: &str) -> bool {
        if self.intervals.is_none() {
            warn!(step, "graph is not in canonical order; run renumber first");
        }
        self.intervals.is_some()
    }
}

/// The upper bound table for `ordering`, starting from `+inf` if the stored
/// one belongs to an earlier order.
fn upper_for(
    slot: &mut Option<Tagged<UpperBounds>>,
    ordering: u64,
    vertices: usize,
) -> &mut UpperBounds {
    if slot.as_ref().is_some_and(|t| t.revision != ordering) {
        *slot = None;
    }
    &mut slot
        .get_or_insert_with(|| Tagged {
            revision: ordering,
            table: UpperBounds::unbounded(vertices),
        })
        .table
}

fn fresh<T>(tagged: &Option<Tagged<T>>, revision: u64) -> Option<&T> {
    tagged
        .as_ref()
        .filter(|t| t.revision == revision)
        .map(|t| &t.table)
}
