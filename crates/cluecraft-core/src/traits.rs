//! Collaborator traits: clue catalog, answer verdicts, progress storage, clock.
//!
//! The catalog is an in-process leaf and stays synchronous. Verdicts and
//! storage may sit behind I/O, so they are async and implemented by the
//! `cluecraft-store` and `cluecraft-cli` crates.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::catalog::ClueRecord;
use crate::error::StoreError;
use crate::model::{AnswerEvent, Clue};
use crate::profile::{SessionSummary, UserProfile};

// ---------------------------------------------------------------------------
// Clue catalog
// ---------------------------------------------------------------------------

/// Read-only source of clue records.
///
/// Records are returned raw; the orchestrator validates them and skips
/// malformed ones with a warning.
pub trait ClueCatalog: Send + Sync {
    /// Records in `category` (normalized), or every record when `None`.
    fn records(&self, category: Option<&str>) -> Vec<ClueRecord>;

    /// A single record by id.
    fn record(&self, id: &str) -> Option<ClueRecord>;

    /// Category names with their record counts, largest first.
    fn categories(&self) -> Vec<(String, usize)>;
}

// ---------------------------------------------------------------------------
// Answer verdict service
// ---------------------------------------------------------------------------

/// Verdict on a free-text response.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Verdict {
    pub correct: bool,
    /// Optional matcher confidence in [0, 1].
    pub confidence: Option<f64>,
}

/// Turns a free-text response into a correct/incorrect verdict.
#[async_trait]
pub trait AnswerJudge: Send + Sync {
    async fn judge(&self, clue: &Clue, response: &str) -> anyhow::Result<Verdict>;
}

// ---------------------------------------------------------------------------
// Progress store
// ---------------------------------------------------------------------------

/// Durable keeping of per-user progress.
///
/// Each call is a complete, scoped operation: implementations acquire and
/// release any handle inside the call.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Human-readable backend name (e.g. "json").
    fn name(&self) -> &str;

    async fn load_profile(&self, user_id: &str) -> Result<Option<UserProfile>, StoreError>;

    /// Replace the stored profile (last write wins).
    async fn save_profile(&self, profile: &UserProfile) -> Result<(), StoreError>;

    async fn append_event(&self, event: &AnswerEvent) -> Result<(), StoreError>;

    /// Most recent events first, at most `limit`.
    async fn recent_events(&self, user_id: &str, limit: usize) -> Result<Vec<AnswerEvent>, StoreError>;

    async fn save_session(&self, summary: &SessionSummary) -> Result<(), StoreError>;

    /// Most recent session summaries first, at most `limit`.
    async fn recent_sessions(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<SessionSummary>, StoreError>;
}

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Source of "now" for scheduling decisions.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = to;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}
