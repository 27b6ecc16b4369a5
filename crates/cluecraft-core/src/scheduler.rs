//! SM-2 style spaced-repetition scheduler.
//!
//! Review state is created lazily the first time a clue is presented and is
//! only ever mutated here. Successful recalls grow the interval
//! (1 day, 6 days, then previous × ease); any lapse resets it to the
//! baseline without touching the ease factor.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::config::SchedulerConfig;
use crate::model::ClueId;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Per-(user, clue) review record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewState {
    pub last_seen_at: DateTime<Utc>,
    pub next_due_at: DateTime<Utc>,
    pub interval_days: f64,
    pub ease_factor: f64,
    pub repetition_count: u32,
    pub lapse_count: u32,
}

impl ReviewState {
    pub fn is_due(&self, as_of: DateTime<Utc>) -> bool {
        self.next_due_at <= as_of
    }
}

#[derive(Debug, Clone, Default)]
pub struct SpacedRepetitionScheduler {
    config: SchedulerConfig,
}

impl SpacedRepetitionScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self { config }
    }

    /// Review state for a clue presented for the first time at `now`.
    pub fn initial_state(&self, now: DateTime<Utc>) -> ReviewState {
        ReviewState {
            last_seen_at: now,
            next_due_at: now,
            interval_days: 0.0,
            ease_factor: self.config.initial_ease,
            repetition_count: 0,
            lapse_count: 0,
        }
    }

    /// Create review state for `clue_id` if it has none yet.
    ///
    /// Returns `true` when a new record was created.
    pub fn register_presentation(
        &self,
        reviews: &mut BTreeMap<ClueId, ReviewState>,
        clue_id: &str,
        now: DateTime<Utc>,
    ) -> bool {
        if reviews.contains_key(clue_id) {
            return false;
        }
        reviews.insert(clue_id.to_string(), self.initial_state(now));
        true
    }

    /// All clues whose next review is at or before `as_of`.
    pub fn due_clues(
        &self,
        reviews: &BTreeMap<ClueId, ReviewState>,
        as_of: DateTime<Utc>,
    ) -> BTreeSet<ClueId> {
        reviews
            .iter()
            .filter(|(_, state)| state.is_due(as_of))
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Apply one graded outcome and return the updated state.
    pub fn record_outcome<'a>(
        &self,
        reviews: &'a mut BTreeMap<ClueId, ReviewState>,
        clue_id: &str,
        correct: bool,
        quality: u8,
        at: DateTime<Utc>,
    ) -> &'a ReviewState {
        let state = reviews
            .entry(clue_id.to_string())
            .or_insert_with(|| self.initial_state(at));
        self.apply(state, correct, quality.min(5), at);

        tracing::debug!(
            clue_id,
            interval_days = state.interval_days,
            ease = state.ease_factor,
            repetitions = state.repetition_count,
            lapses = state.lapse_count,
            "review rescheduled"
        );
        state
    }

    fn apply(&self, state: &mut ReviewState, correct: bool, quality: u8, at: DateTime<Utc>) {
        if correct && quality >= self.config.passing_quality {
            state.repetition_count += 1;
            let q = (5 - quality) as f64;
            state.ease_factor = (state.ease_factor + (0.1 - q * (0.08 + q * 0.02)))
                .clamp(self.config.min_ease, self.config.max_ease);
            state.interval_days = match state.repetition_count {
                1 => self.config.first_interval_days,
                2 => self.config.second_interval_days,
                _ => state.interval_days * state.ease_factor,
            }
            .min(self.config.max_interval_days);
        } else {
            state.lapse_count += 1;
            state.repetition_count = 0;
            state.interval_days = self.config.lapse_interval_days;
        }

        state.last_seen_at = at;
        state.next_due_at = due_after(at, state.interval_days);
    }
}

/// `at` plus `interval_days`, saturating at the latest representable instant.
fn due_after(at: DateTime<Utc>, interval_days: f64) -> DateTime<Utc> {
    // `as` saturates, so a huge interval becomes i64::MAX milliseconds
    let millis = (interval_days * MILLIS_PER_DAY) as i64;
    Duration::try_milliseconds(millis)
        .and_then(|offset| at.checked_add_signed(offset))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
