//! Reduction scripts.
//!
//! A script is a whitespace-separated list of steps. `N ( ... )` runs its
//! body `N` times and `* ( ... )` runs it until one pass deletes no edge.
//! Blocks nest:
//!
//! ```text
//! renumber tim-ubs reduce-vub * ( clear-ubs seb-ubs tim-ubs reduce-vub reduce-unreach )
//! ```

use std::fmt;
use std::str::FromStr;

use tracing::{debug, info};

use crate::bounds::SebastianMode;
use crate::error::{ReductionError, Result, ScriptError};
use crate::reduce::RuleKind;
use crate::session::ReductionSession;

/// One script command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    Renumber,
    Unrenumber,
    ClearUpperBounds,
    TimUpperBounds,
    SebastianUpperBounds,
    EnableStrengthening,
    DisableStrengthening,
    AnchorLowerBounds,
    SlideLowerBounds,
    Reduce(RuleKind),
}

impl Step {
    const TABLE: [Step; 9] = [
        Step::Renumber,
        Step::Unrenumber,
        Step::ClearUpperBounds,
        Step::TimUpperBounds,
        Step::SebastianUpperBounds,
        Step::EnableStrengthening,
        Step::DisableStrengthening,
        Step::AnchorLowerBounds,
        Step::SlideLowerBounds,
    ];

    pub fn command(self) -> &'static str {
        match self {
            Step::Renumber => "renumber",
            Step::Unrenumber => "unrenumber",
            Step::ClearUpperBounds => "clear-ubs",
            Step::TimUpperBounds => "tim-ubs",
            Step::SebastianUpperBounds => "seb-ubs",
            Step::EnableStrengthening => "enable-seb-strength",
            Step::DisableStrengthening => "disable-seb-strength",
            Step::AnchorLowerBounds => "calc-anchor-lbs",
            Step::SlideLowerBounds => "calc-slide-lbs",
            Step::Reduce(rule) => rule.command(),
        }
    }

    /// Runs the step; returns the number of edges it deleted.
    pub fn apply(self, session: &mut ReductionSession) -> Result<usize> {
        match self {
            Step::Renumber => session.renumber(),
            Step::Unrenumber => session.unrenumber(),
            Step::ClearUpperBounds => session.clear_upper_bounds(),
            Step::TimUpperBounds => session.tim_upper_bounds(),
            Step::SebastianUpperBounds => session.sebastian_upper_bounds(),
            Step::EnableStrengthening => {
                session.set_sebastian_mode(SebastianMode::Strengthened);
                Ok(0)
            }
            Step::DisableStrengthening => {
                session.set_sebastian_mode(SebastianMode::Plain);
                Ok(0)
            }
            Step::AnchorLowerBounds => session.anchor_lower_bounds(),
            Step::SlideLowerBounds => session.slide_lower_bounds(),
            Step::Reduce(RuleKind::Vub) => session.reduce_vub(),
            Step::Reduce(RuleKind::Unreach) => session.reduce_unreach(),
            Step::Reduce(RuleKind::Negpend) => session.reduce_negpend(),
            Step::Reduce(RuleKind::ColsubtreeAdvantage) => session.reduce_colsubtree_adv(),
            Step::Reduce(RuleKind::SlideStrong) => session.reduce_slide_strong(),
            Step::Reduce(RuleKind::ImpliedEdges) => session.calc_implied_edges(),
        }
    }
}

impl FromStr for Step {
    type Err = ScriptError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Step::TABLE
            .into_iter()
            .chain(RuleKind::ALL.into_iter().map(Step::Reduce))
            .find(|step| step.command() == s)
            .ok_or_else(|| ScriptError::UnknownStep(s.to_string()))
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.command())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptItem {
    Step(Step),
    Repeat { count: usize, body: Vec<ScriptItem> },
    Fixpoint(Vec<ScriptItem>),
}

/// A parsed reduction script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReductionScript {
    items: Vec<ScriptItem>,
}

/// Block being parsed.
enum Open {
    Top,
    Repeat(usize),
    Fixpoint,
}

impl ReductionScript {
    pub fn new(items: Vec<ScriptItem>) -> Self {
        Self { items }
    }

    /// The same reduction as [`ReductionController`](crate::ReductionController).
    pub fn default_pipeline() -> Self {
        use RuleKind::{Unreach, Vub};
        use Step::*;
        let step = ScriptItem::Step;
        Self::new(vec![
            step(Renumber),
            step(EnableStrengthening),
            step(TimUpperBounds),
            step(Reduce(Vub)),
            ScriptItem::Fixpoint(vec![
                step(ClearUpperBounds),
                step(SebastianUpperBounds),
                step(TimUpperBounds),
                step(Reduce(Vub)),
                step(Reduce(Unreach)),
            ]),
        ])
    }

    pub fn parse(text: &str) -> std::result::Result<Self, ScriptError> {
        let mut stack: Vec<(Open, Vec<ScriptItem>)> = vec![(Open::Top, Vec::new())];
        let mut pending: Option<(Open, &str)> = None;

        for token in tokenize(text) {
            if let Some((open, marker)) = pending.take() {
                if token != "(" {
                    return Err(ScriptError::MissingBlock(marker.to_string()));
                }
                stack.push((open, Vec::new()));
                continue;
            }
            match token {
                "(" => return Err(ScriptError::UnexpectedOpen),
                ")" => {
                    let (open, body) = match stack.pop() {
                        Some((Open::Top, _)) | None => return Err(ScriptError::UnexpectedClose),
                        Some(block) => block,
                    };
                    let item = match open {
                        Open::Repeat(count) => ScriptItem::Repeat { count, body },
                        _ => ScriptItem::Fixpoint(body),
                    };
                    if let Some((_, items)) = stack.last_mut() {
                        items.push(item);
                    }
                }
                "*" => pending = Some((Open::Fixpoint, token)),
                t if t.starts_with(|c: char| c.is_ascii_digit() || c == '-' || c == '+') => {
                    let count = t
                        .parse::<usize>()
                        .ok()
                        .filter(|&n| n > 0)
                        .ok_or_else(|| ScriptError::InvalidCount(t.to_string()))?;
                    pending = Some((Open::Repeat(count), token));
                }
                t => {
                    let step = t.parse::<Step>()?;
                    if let Some((_, items)) = stack.last_mut() {
                        items.push(ScriptItem::Step(step));
                    }
                }
            }
        }

        if let Some((_, marker)) = pending {
            return Err(ScriptError::MissingBlock(marker.to_string()));
        }
        match stack.pop() {
            Some((Open::Top, items)) if stack.is_empty() => Ok(Self::new(items)),
            _ => Err(ScriptError::UnclosedBlock),
        }
    }

    pub fn items(&self) -> &[ScriptItem] {
        &self.items
    }

    /// Runs the script on `session`. Returns the number of deleted edges.
    pub fn run(&self, session: &mut ReductionSession) -> Result<usize> {
        run_items(&self.items, session)
    }
}

fn run_items(items: &[ScriptItem], session: &mut ReductionSession) -> Result<usize> {
    let mut deleted = 0;
    for item in items {
        deleted += match item {
            ScriptItem::Step(step) => {
                let n = step.apply(session)?;
                debug!(%step, deleted = n, "script step");
                n
            }
            ScriptItem::Repeat { count, body } => {
                let mut total = 0;
                for _ in 0..*count {
                    total += run_items(body, session)?;
                }
                total
            }
            ScriptItem::Fixpoint(body) => run_fixpoint(body, session)?,
        };
    }
    Ok(deleted)
}

/// Bounded like the controller loop: a pass that deletes something shrinks
/// the graph, so more passes than edges means something is wrong.
fn run_fixpoint(body: &[ScriptItem], session: &mut ReductionSession) -> Result<usize> {
    let limit = session.config().iteration_limit(session.graph().edge_count());
    let mut total = 0;
    let mut passes = 0;
    loop {
        if passes >= limit {
            return Err(ReductionError::invariant(format!(
                "script block found no fixpoint after {passes} passes"
            )));
        }
        passes += 1;
        session.stats_mut().iterations += 1;
        let deleted = run_items(body, session)?;
        total += deleted;
        if deleted == 0 {
            break;
        }
    }
    info!(passes, deleted = total, "script block reached its fixpoint");
    Ok(total)
}

/// Words and single parentheses.
fn tokenize(text: &str) -> impl Iterator<Item = &str> {
    text.split_whitespace().flat_map(|word| {
        let mut parts = Vec::new();
        let mut start = 0;
        for (i, c) in word.char_indices() {
            if c == '(' || c == ')' {
                if start < i {
                    parts.push(&word[start..i]);
                }
                parts.push(&word[i..i + 1]);
                start = i + 1;
            }
        }
        if start < word.len() {
            parts.push(&word[start..]);
        }
        parts
    })
}

impl FromStr for ReductionScript {
    type Err = ScriptError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ReductionScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_items(f, &self.items)
    }
}

fn write_items(f: &mut fmt::Formatter<'_>, items: &[ScriptItem]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        match item {
            ScriptItem::Step(step) => write!(f, "{step}")?,
            ScriptItem::Repeat { count, body } => {
                write!(f, "{count} ( ")?;
                write_items(f, body)?;
                f.write_str(" )")?;
            }
            ScriptItem::Fixpoint(body) => {
                f.write_str("* ( ")?;
                write_items(f, body)?;
                f.write_str(" )")?;
            }
        }
    }
    Ok(())
}
