//! Difficulty calibrator.
//!
//! Tracks a smoothed global accuracy per user and steps the target tier so
//! that accuracy stays inside the configured band. Tier changes are
//! rate-limited to avoid oscillating on short streaks.

use serde::{Deserialize, Serialize};

use crate::config::CalibratorConfig;
use crate::model::Tier;
use crate::statistics::ewma;

/// Per-user calibration record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationState {
    /// Exponentially-weighted accuracy over recent answers.
    pub global_accuracy: f64,
    /// Tier the next adaptive clue should be drawn from.
    pub current_tier: Tier,
    /// Outcomes recorded since the tier last moved (or since creation).
    #[serde(default)]
    pub outcomes_since_change: u32,
    /// Total outcomes ever recorded.
    #[serde(default)]
    pub total_outcomes: u64,
}

/// Direction of a tier adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierChange {
    Up,
    Down,
}

/// Stateless calibrator; the state lives in [`CalibrationState`].
#[derive(Debug, Clone, Default)]
pub struct DifficultyCalibrator {
    config: CalibratorConfig,
}

impl DifficultyCalibrator {
    pub fn new(config: CalibratorConfig) -> Self {
        Self { config }
    }

    /// Fresh state for a user who has never answered.
    pub fn initial_state(&self) -> CalibrationState {
        CalibrationState {
            global_accuracy: self.config.seed_accuracy.clamp(0.0, 1.0),
            current_tier: Tier::clamped(self.config.seed_tier as i64),
            outcomes_since_change: 0,
            total_outcomes: 0,
        }
    }

    /// Fold one outcome into the state, stepping the tier if the smoothed
    /// accuracy has left the band and the rate limit allows it.
    pub fn record_outcome(&self, state: &mut CalibrationState, correct: bool) -> Option<TierChange> {
        state.global_accuracy = ewma(state.global_accuracy, correct, self.config.alpha);
        state.total_outcomes += 1;
        state.outcomes_since_change = state.outcomes_since_change.saturating_add(1);

        if state.outcomes_since_change < self.config.min_outcomes_between_changes {
            return None;
        }

        let (next, change) = if state.global_accuracy > self.config.band_high {
            (state.current_tier.harder(), TierChange::Up)
        } else if state.global_accuracy < self.config.band_low {
            (state.current_tier.easier(), TierChange::Down)
        } else {
            return None;
        };

        if next == state.current_tier {
            // Pinned at a bound; keep the counter running so a reversal can act at once.
            return None;
        }

        tracing::info!(
            from = %state.current_tier,
            to = %next,
            accuracy = state.global_accuracy,
            "difficulty tier changed"
        );
        state.current_tier = next;
        state.outcomes_since_change = 0;
        Some(change)
    }

    pub fn current_target_tier(&self, state: &CalibrationState) -> Tier {
        state.current_tier
    }
}
