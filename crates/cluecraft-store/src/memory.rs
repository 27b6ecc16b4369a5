//! In-memory progress store.
//!
//! Nothing survives the process. Useful for tests and throwaway sessions;
//! failures can be injected to exercise the orchestrator's error paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use cluecraft_core::error::StoreError;
use cluecraft_core::model::{AnswerEvent, UserId};
use cluecraft_core::profile::{SessionSummary, UserProfile};
use cluecraft_core::traits::ProgressStore;

#[derive(Debug, Default)]
pub struct MemoryStore {
    profiles: Mutex<HashMap<UserId, UserProfile>>,
    events: Mutex<HashMap<UserId, Vec<AnswerEvent>>>,
    sessions: Mutex<HashMap<UserId, Vec<SessionSummary>>>,
    /// Number of upcoming write calls that will fail.
    failing_writes: AtomicU32,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` write calls fail with `StoreError::Unavailable`.
    pub fn fail_next_writes(&self, count: u32) {
        self.failing_writes.store(count, Ordering::SeqCst);
    }

    /// Number of events recorded for a user.
    pub fn event_count(&self, user_id: &str) -> usize {
        lock(&self.events).get(user_id).map_or(0, Vec::len)
    }

    fn check_write(&self, operation: &str) -> Result<(), StoreError> {
        let injected = self
            .failing_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            tracing::debug!(operation, "injected store failure");
            return Err(StoreError::Unavailable(format!("injected failure in {operation}")));
        }
        Ok(())
    }
}

fn newest_first<T: Clone>(items: Option<&Vec<T>>, limit: usize) -> Vec<T> {
    items
        .map(|items| items.iter().rev().take(limit).cloned().collect())
        .unwrap_or_default()
}

#[async_trait]
impl ProgressStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn load_profile(&self, user_id: &str) -> Result<Option<UserProfile>, StoreError> {
        Ok(lock(&self.profiles).get(user_id).cloned())
    }

    async fn save_profile(&self, profile: &UserProfile) -> Result<(), StoreError> {
        self.check_write("save_profile")?;
        lock(&self.profiles).insert(profile.user_id.clone(), profile.clone());
        Ok(())
    }

    async fn append_event(&self, event: &AnswerEvent) -> Result<(), StoreError> {
        self.check_write("append_event")?;
        lock(&self.events)
            .entry(event.outcome.user_id.clone())
            .or_default()
            .push(event.clone());
        Ok(())
    }

    async fn recent_events(&self, user_id: &str, limit: usize) -> Result<Vec<AnswerEvent>, StoreError> {
        Ok(newest_first(lock(&self.events).get(user_id), limit))
    }

    async fn save_session(&self, summary: &SessionSummary) -> Result<(), StoreError> {
        self.check_write("save_session")?;
        lock(&self.sessions)
            .entry(summary.user_id.clone())
            .or_default()
            .push(summary.clone());
        Ok(())
    }

    async fn recent_sessions(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<SessionSummary>, StoreError> {
        Ok(newest_first(lock(&self.sessions).get(user_id), limit))
    }
}
