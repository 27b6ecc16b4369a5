//! Candidate-pool strategies, one per session mode.
//!
//! Every strategy sees the same [`PoolContext`] (the category-filtered,
//! validated clues plus the three engines' current outputs) and returns the
//! clues it would sample from, minus those already seen this session.

use std::collections::{BTreeSet, HashSet};

use crate::model::{Clue, ClueId, Mode, Tier};

/// Engine outputs and catalog contents a strategy may draw on.
#[derive(Debug, Clone, Copy)]
pub struct PoolContext<'a> {
    /// Validated clues matching the session's category filter.
    pub clues: &'a [Clue],
    /// The calibrator's current target tier.
    pub target_tier: Tier,
    pub weak_categories: &'a BTreeSet<String>,
    /// Clue ids the scheduler considers due.
    pub due: &'a BTreeSet<ClueId>,
}

/// The outcome of pool construction.
#[derive(Debug, Clone)]
pub struct Pool<'a> {
    /// The strategy that actually produced the pool (after fallbacks).
    pub strategy: Mode,
    /// The tier the pool was restricted to, for tiered strategies.
    pub tier: Option<Tier>,
    pub candidates: Vec<&'a Clue>,
}

impl<'a> Pool<'a> {
    fn new(strategy: Mode, tier: Option<Tier>, candidates: Vec<&'a Clue>) -> Self {
        Self {
            strategy,
            tier,
            candidates,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Build the candidate pool for `mode`, excluding `seen`.
pub fn candidate_pool<'a>(mode: Mode, ctx: &PoolContext<'a>, seen: &HashSet<ClueId>) -> Pool<'a> {
    match mode {
        Mode::Review => review_pool(ctx, seen),
        Mode::Adaptive => adaptive_pool(ctx, seen),
        Mode::Challenge => challenge_pool(ctx, seen),
        Mode::Practice => practice_pool(ctx, seen),
        Mode::Weakness => weakness_pool(ctx, seen),
    }
}

fn unseen<'a>(
    clues: impl Iterator<Item = &'a Clue>,
    seen: &HashSet<ClueId>,
) -> Vec<&'a Clue> {
    clues.filter(|c| !seen.contains(&c.id)).collect()
}

/// Due clues; the practice pool when nothing is due at all.
fn review_pool<'a>(ctx: &PoolContext<'a>, seen: &HashSet<ClueId>) -> Pool<'a> {
    let mut due = ctx.clues.iter().filter(|c| ctx.due.contains(&c.id)).peekable();
    if due.peek().is_none() {
        tracing::debug!("nothing due for review, using practice pool");
        return practice_pool(ctx, seen);
    }
    Pool::new(Mode::Review, None, unseen(due, seen))
}

/// Clues at the target tier, preferring categories that are not weak.
fn adaptive_pool<'a>(ctx: &PoolContext<'a>, seen: &HashSet<ClueId>) -> Pool<'a> {
    let Some(tier) = nearest_available_tier(ctx.clues, ctx.target_tier) else {
        return Pool::new(Mode::Adaptive, None, Vec::new());
    };
    let at_tier = unseen(ctx.clues.iter().filter(|c| c.tier == tier), seen);
    let (weak, strong): (Vec<&Clue>, Vec<&Clue>) = at_tier
        .into_iter()
        .partition(|c| ctx.weak_categories.contains(&c.category));

    let candidates = if strong.is_empty() { weak } else { strong };
    Pool::new(Mode::Adaptive, Some(tier), candidates)
}

/// Clues one tier above the target.
fn challenge_pool<'a>(ctx: &PoolContext<'a>, seen: &HashSet<ClueId>) -> Pool<'a> {
    let Some(tier) = nearest_available_tier(ctx.clues, ctx.target_tier.harder()) else {
        return Pool::new(Mode::Challenge, None, Vec::new());
    };
    let candidates = unseen(ctx.clues.iter().filter(|c| c.tier == tier), seen);
    Pool::new(Mode::Challenge, Some(tier), candidates)
}

/// Everything matching the category filter, any tier.
fn practice_pool<'a>(ctx: &PoolContext<'a>, seen: &HashSet<ClueId>) -> Pool<'a> {
    Pool::new(Mode::Practice, None, unseen(ctx.clues.iter(), seen))
}

/// Clues from weak categories; adaptive when there are none.
fn weakness_pool<'a>(ctx: &PoolContext<'a>, seen: &HashSet<ClueId>) -> Pool<'a> {
    let mut weak = ctx
        .clues
        .iter()
        .filter(|c| ctx.weak_categories.contains(&c.category))
        .peekable();
    if weak.peek().is_none() {
        tracing::debug!(
            weak_categories = ctx.weak_categories.len(),
            "no weak-category clues, using adaptive pool"
        );
        return adaptive_pool(ctx, seen);
    }
    Pool::new(Mode::Weakness, None, unseen(weak, seen))
}

/// The tier closest to `target` that has at least one clue.
/// Equal distances resolve toward the easier tier.
pub fn nearest_available_tier(clues: &[Clue], target: Tier) -> Option<Tier> {
    let available: BTreeSet<Tier> = clues.iter().map(|c| c.tier).collect();
    available
        .into_iter()
        .min_by_key(|tier| (tier.distance(target), *tier))
}
