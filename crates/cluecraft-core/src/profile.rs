//! Per-user progress records, persisted by the progress store.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calibrator::CalibrationState;
use crate::model::{ClueId, Mode, UserId};
use crate::scheduler::ReviewState;
use crate::statistics::{ratio, AnswerTotals};
use crate::weakness::CategoryMastery;

/// Everything the engine knows about one user, keyed by user id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: UserId,
    pub calibration: CalibrationState,
    #[serde(default)]
    pub mastery: BTreeMap<String, CategoryMastery>,
    #[serde(default)]
    pub reviews: BTreeMap<ClueId, ReviewState>,
    #[serde(default)]
    pub totals: AnswerTotals,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    pub fn new(user_id: impl Into<UserId>, calibration: CalibrationState, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            calibration,
            mastery: BTreeMap::new(),
            reviews: BTreeMap::new(),
            totals: AnswerTotals::default(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Final aggregate stats of one play session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub user_id: UserId,
    pub mode: Mode,
    #[serde(default)]
    pub category_filter: Option<String>,
    pub turns: u32,
    pub answered: u32,
    pub correct: u32,
    pub total_response_ms: u64,
    pub categories_played: BTreeSet<String>,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

impl SessionSummary {
    pub fn accuracy(&self) -> f64 {
        ratio(self.correct as u64, self.answered as u64)
    }

    pub fn avg_response_secs(&self) -> f64 {
        ratio(self.total_response_ms, self.answered as u64) / 1000.0
    }
}
