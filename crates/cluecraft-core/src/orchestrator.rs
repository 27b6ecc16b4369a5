//! Session orchestrator.
//!
//! Owns one play session at a time per caller: picks the next clue from the
//! mode's candidate pool and fans each answered clue out to the scheduler,
//! the weakness detector, the calibrator and the progress store.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use uuid::Uuid;

use crate::calibrator::{DifficultyCalibrator, TierChange};
use crate::catalog::{validate_record, CatalogWarning};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::insights::{self, Insights};
use crate::model::{
    AnswerEvent, Clue, ClueId, Mode, NextClue, OutcomeEvent, SessionConfig, Tier,
};
use crate::modes::{candidate_pool, PoolContext};
use crate::profile::{SessionSummary, UserProfile};
use crate::scheduler::SpacedRepetitionScheduler;
use crate::traits::{AnswerJudge, ClueCatalog, Clock, ProgressStore, SystemClock};
use crate::weakness::WeaknessDetector;

/// One user's play session. Single writer; never shared across tasks.
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    config: SessionConfig,
    profile: UserProfile,
    seen: HashSet<ClueId>,
    turns: u32,
    answered: u32,
    correct: u32,
    total_response_ms: u64,
    categories_played: BTreeSet<String>,
    started_at: DateTime<Utc>,
    rng: StdRng,
}

impl Session {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> &str {
        &self.profile.user_id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The user's profile as updated by this session so far.
    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    /// Clues presented this session (cleared per pool on exhaustion).
    pub fn seen(&self) -> &HashSet<ClueId> {
        &self.seen
    }

    /// Number of clues presented.
    pub fn turns(&self) -> u32 {
        self.turns
    }

    pub fn answered(&self) -> u32 {
        self.answered
    }

    pub fn correct(&self) -> u32 {
        self.correct
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
}

/// The result of [`Orchestrator::next_clue`].
#[derive(Debug, Clone)]
pub struct Selection {
    pub next: NextClue,
    /// The pool strategy that produced the clue, after fallbacks.
    pub strategy: Option<Mode>,
    /// Catalog records skipped while building the pool.
    pub warnings: Vec<CatalogWarning>,
}

/// What recording one answer changed.
#[derive(Debug, Clone)]
pub struct OutcomeReport {
    pub event: AnswerEvent,
    pub tier_change: Option<TierChange>,
    pub target_tier: Tier,
    pub global_accuracy: f64,
    /// Whether the clue's category is weak after this answer.
    pub category_weak: bool,
    pub next_review_at: DateTime<Utc>,
}

pub struct Orchestrator {
    catalog: Arc<dyn ClueCatalog>,
    store: Arc<dyn ProgressStore>,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
    calibrator: DifficultyCalibrator,
    scheduler: SpacedRepetitionScheduler,
    weakness: WeaknessDetector,
}

impl Orchestrator {
    pub fn new(
        catalog: Arc<dyn ClueCatalog>,
        store: Arc<dyn ProgressStore>,
        config: EngineConfig,
    ) -> Self {
        Self {
            catalog,
            store,
            clock: Arc::new(SystemClock),
            calibrator: DifficultyCalibrator::new(config.calibrator.clone()),
            scheduler: SpacedRepetitionScheduler::new(config.scheduler.clone()),
            weakness: WeaknessDetector::new(config.weakness.clone()),
            config,
        }
    }

    /// Replace the wall clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &dyn ProgressStore {
        self.store.as_ref()
    }

    /// Load the stored profile for `user_id`, or a fresh one.
    pub async fn load_profile(&self, user_id: &str) -> Result<UserProfile, EngineError> {
        self.config.validate()?;
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(EngineError::Configuration("user id is empty".into()));
        }
        let stored = self
            .store
            .load_profile(user_id)
            .await
            .map_err(|e| EngineError::persistence("load_profile", e))?;

        Ok(stored.unwrap_or_else(|| {
            tracing::debug!(user_id, "no stored profile, creating one");
            UserProfile::new(user_id, self.calibrator.initial_state(), self.clock.now())
        }))
    }

    /// Begin a session. `seed` makes clue sampling reproducible.
    pub async fn start_session(
        &self,
        user_id: &str,
        config: SessionConfig,
        seed: Option<u64>,
    ) -> Result<Session, EngineError> {
        let profile = self.load_profile(user_id).await?;
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let session = Session {
            id: Uuid::new_v4(),
            config,
            profile,
            seen: HashSet::new(),
            turns: 0,
            answered: 0,
            correct: 0,
            total_response_ms: 0,
            categories_played: BTreeSet::new(),
            started_at: self.clock.now(),
            rng,
        };

        tracing::info!(
            session_id = %session.id,
            user_id = %session.user_id(),
            mode = %session.config.mode,
            category = session.config.category_filter.as_deref().unwrap_or("*"),
            tier = %session.profile.calibration.current_tier,
            "session started"
        );
        Ok(session)
    }

    /// Pick the next clue for the session.
    ///
    /// When every candidate has been seen, the pool's clues are removed from
    /// the seen set and selection is retried once before reporting
    /// exhaustion.
    pub fn next_clue(&self, session: &mut Session) -> Selection {
        let now = self.clock.now();
        let (clues, warnings) = self.valid_clues(session.config.category_filter.as_deref());

        let weak = self.weakness.weak_categories(&session.profile.mastery);
        let due = self.scheduler.due_clues(&session.profile.reviews, now);
        let ctx = PoolContext {
            clues: &clues,
            target_tier: self.calibrator.current_target_tier(&session.profile.calibration),
            weak_categories: &weak,
            due: &due,
        };
        let mode = session.config.mode;

        let mut pool = candidate_pool(mode, &ctx, &session.seen);
        if pool.is_empty() {
            let full = candidate_pool(mode, &ctx, &HashSet::new());
            if full.is_empty() {
                tracing::debug!(session_id = %session.id, %mode, "no candidates in pool");
                return Selection {
                    next: NextClue::Exhausted,
                    strategy: None,
                    warnings,
                };
            }
            tracing::debug!(
                session_id = %session.id,
                %mode,
                recycled = full.candidates.len(),
                "pool exhausted, clearing seen clues"
            );
            for clue in &full.candidates {
                session.seen.remove(&clue.id);
            }
            pool = candidate_pool(mode, &ctx, &session.seen);
        }

        let Some(&clue) = pool.candidates.choose(&mut session.rng) else {
            return Selection {
                next: NextClue::Exhausted,
                strategy: None,
                warnings,
            };
        };

        tracing::debug!(
            session_id = %session.id,
            clue_id = %clue.id,
            tier = %clue.tier,
            strategy = %pool.strategy,
            candidates = pool.candidates.len(),
            "clue selected"
        );
        session.seen.insert(clue.id.clone());
        session.turns += 1;
        self.scheduler
            .register_presentation(&mut session.profile.reviews, &clue.id, now);

        Selection {
            next: NextClue::Clue(clue.clone()),
            strategy: Some(pool.strategy),
            warnings,
        }
    }

    fn valid_clues(&self, category: Option<&str>) -> (Vec<Clue>, Vec<CatalogWarning>) {
        let mut warnings = Vec::new();
        let clues = self
            .catalog
            .records(category)
            .iter()
            .filter_map(|record| match validate_record(record) {
                Ok(clue) => Some(clue),
                Err(warning) => {
                    tracing::warn!("skipping malformed clue record: {warning}");
                    warnings.push(warning);
                    None
                }
            })
            .collect();
        (clues, warnings)
    }

    /// SM-2 quality for an answer: 5 for a correct answer within the tier's
    /// expected time, 3 for a slower correct answer, 0 otherwise.
    pub fn response_quality(&self, correct: bool, response_time_ms: u64, tier: Tier) -> u8 {
        if !correct {
            return 0;
        }
        let quality = &self.config.quality;
        let expected = quality.base_expected_ms.saturating_add(
            quality
                .per_tier_ms
                .saturating_mul(u64::from(tier.get().saturating_sub(1))),
        );
        if response_time_ms <= expected {
            5
        } else {
            3
        }
    }

    fn resolve_clue(&self, clue_id: &str) -> Result<Clue, EngineError> {
        let record = self
            .catalog
            .record(clue_id)
            .ok_or_else(|| EngineError::UnknownClue(clue_id.to_string()))?;
        validate_record(&record).map_err(|w| EngineError::UnknownClue(w.to_string()))
    }

    /// Record a graded answer.
    ///
    /// Engine state in the session is always updated. If the store fails,
    /// every write is still attempted and the first failure is returned.
    pub async fn record_outcome(
        &self,
        session: &mut Session,
        clue_id: &str,
        correct: bool,
        response_time_ms: u64,
    ) -> Result<OutcomeReport, EngineError> {
        let clue = self.resolve_clue(clue_id)?;
        let now = self.clock.now();
        let quality = self.response_quality(correct, response_time_ms, clue.tier);
        let profile = &mut session.profile;

        let next_review_at = self
            .scheduler
            .record_outcome(&mut profile.reviews, &clue.id, correct, quality, now)
            .next_due_at;
        let mastery = self
            .weakness
            .record_outcome(&mut profile.mastery, &clue.category, correct);
        let category_weak = self.weakness.is_weak(mastery);
        let tier_change = self.calibrator.record_outcome(&mut profile.calibration, correct);
        profile.totals.record(correct, response_time_ms);
        profile.updated_at = now;

        session.answered += 1;
        session.correct += u32::from(correct);
        session.total_response_ms = session.total_response_ms.saturating_add(response_time_ms);
        session.categories_played.insert(clue.category.clone());

        let event = AnswerEvent {
            id: Uuid::new_v4(),
            session_id: session.id,
            outcome: OutcomeEvent {
                user_id: session.profile.user_id.clone(),
                clue_id: clue.id.clone(),
                category: clue.category.clone(),
                correct,
                response_time_ms,
            },
            tier: clue.tier,
            quality,
            answered_at: now,
        };

        let mut failures = Vec::new();
        if let Err(e) = self.store.append_event(&event).await {
            failures.push(EngineError::persistence("append_event", e));
        }
        if let Err(e) = self.store.save_profile(&session.profile).await {
            failures.push(EngineError::persistence("save_profile", e));
        }
        for failure in &failures {
            tracing::warn!(session_id = %session.id, "{failure}");
        }
        if let Some(first) = failures.into_iter().next() {
            return Err(first);
        }

        Ok(OutcomeReport {
            event,
            tier_change,
            target_tier: session.profile.calibration.current_tier,
            global_accuracy: session.profile.calibration.global_accuracy,
            category_weak,
            next_review_at,
        })
    }

    /// Grade a free-text response with `judge`, then record it.
    ///
    /// A verdict failure leaves the session untouched.
    pub async fn submit_answer(
        &self,
        session: &mut Session,
        clue_id: &str,
        response: &str,
        response_time_ms: u64,
        judge: &dyn AnswerJudge,
    ) -> Result<OutcomeReport, EngineError> {
        let clue = self.resolve_clue(clue_id)?;
        let verdict = judge
            .judge(&clue, response)
            .await
            .map_err(|e| EngineError::Verdict(format!("{e:#}")))?;
        self.record_outcome(session, &clue.id, verdict.correct, response_time_ms)
            .await
    }

    /// Close the session, persisting the profile and a summary.
    pub async fn end_session(&self, session: Session) -> Result<SessionSummary, EngineError> {
        let summary = SessionSummary {
            session_id: session.id,
            user_id: session.profile.user_id.clone(),
            mode: session.config.mode,
            category_filter: session.config.category_filter.clone(),
            turns: session.turns,
            answered: session.answered,
            correct: session.correct,
            total_response_ms: session.total_response_ms,
            categories_played: session.categories_played.clone(),
            started_at: session.started_at,
            ended_at: self.clock.now(),
        };

        let profile_result = self.store.save_profile(&session.profile).await;
        let summary_result = self.store.save_session(&summary).await;
        if let Err(e) = &profile_result {
            tracing::warn!(session_id = %summary.session_id, "failed to save profile: {e}");
        }
        profile_result.map_err(|e| EngineError::persistence("save_profile", e))?;
        summary_result.map_err(|e| EngineError::persistence("save_session", e))?;

        tracing::info!(
            session_id = %summary.session_id,
            user_id = %summary.user_id,
            answered = summary.answered,
            correct = summary.correct,
            accuracy = summary.accuracy(),
            "session ended"
        );
        Ok(summary)
    }

    /// Insights derived from an in-memory profile.
    pub fn insights_for(&self, profile: &UserProfile) -> Insights {
        let weak = self.weakness.weak_categories(&profile.mastery);
        let strengths = self.weakness.strong_categories(&profile.mastery);
        let due = self
            .scheduler
            .due_clues(&profile.reviews, self.clock.now())
            .len();
        insights::summarize(profile, &weak, strengths, due)
    }

    /// Insights for a stored user; a user with no profile gets seeded values.
    pub async fn get_insights(&self, user_id: &str) -> Result<Insights, EngineError> {
        let profile = self.load_profile(user_id).await?;
        Ok(self.insights_for(&profile))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ClueRecord, InMemoryCatalog};
    use crate::error::StoreError;
    use crate::traits::{ManualClock, Verdict};
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct TestStore {
        profiles: Mutex<HashMap<String, UserProfile>>,
        events: Mutex<Vec<AnswerEvent>>,
        sessions: Mutex<Vec<SessionSummary>>,
        failing: AtomicBool,
    }

    impl TestStore {
        fn check(&self) -> Result<(), StoreError> {
            if self.failing.load(Ordering::SeqCst) {
                Err(StoreError::Unavailable("injected".into()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl ProgressStore for TestStore {
        fn name(&self) -> &str {
            "test"
        }

        async fn load_profile(&self, user_id: &str) -> Result<Option<UserProfile>, StoreError> {
            self.check()?;
            Ok(self.profiles.lock().unwrap().get(user_id).cloned())
        }

        async fn save_profile(&self, profile: &UserProfile) -> Result<(), StoreError> {
            self.check()?;
            self.profiles
                .lock()
                .unwrap()
                .insert(profile.user_id.clone(), profile.clone());
            Ok(())
        }

        async fn append_event(&self, event: &AnswerEvent) -> Result<(), StoreError> {
            self.check()?;
            self.events.lock().unwrap().push(event.clone());
            Ok(())
        }

        async fn recent_events(&self, _: &str, _: usize) -> Result<Vec<AnswerEvent>, StoreError> {
            Ok(self.events.lock().unwrap().clone())
        }

        async fn save_session(&self, summary: &SessionSummary) -> Result<(), StoreError> {
            self.check()?;
            self.sessions.lock().unwrap().push(summary.clone());
            Ok(())
        }

        async fn recent_sessions(&self, _: &str, _: usize) -> Result<Vec<SessionSummary>, StoreError> {
            Ok(self.sessions.lock().unwrap().clone())
        }
    }

    struct FailingJudge;

    #[async_trait]
    impl AnswerJudge for FailingJudge {
        async fn judge(&self, _: &Clue, _: &str) -> anyhow::Result<Verdict> {
            anyhow::bail!("matcher offline")
        }
    }

    struct ExactJudge;

    #[async_trait]
    impl AnswerJudge for ExactJudge {
        async fn judge(&self, clue: &Clue, response: &str) -> anyhow::Result<Verdict> {
            Ok(Verdict {
                correct: clue.accepted_answers().any(|a| a.eq_ignore_ascii_case(response)),
                confidence: None,
            })
        }
    }

    fn record(id: &str, category: &str, tier: u8) -> ClueRecord {
        ClueRecord {
            id: Some(id.into()),
            category: Some(category.into()),
            prompt: Some(format!("prompt {id}")),
            answer: Some(format!("answer {id}")),
            difficulty_tier: Some(tier),
            ..Default::default()
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn setup(records: Vec<ClueRecord>) -> (Orchestrator, Arc<TestStore>, Arc<ManualClock>) {
        let store = Arc::new(TestStore::default());
        let clock = Arc::new(ManualClock::new(t0()));
        let orchestrator = Orchestrator::new(
            Arc::new(InMemoryCatalog::new(records)),
            store.clone(),
            EngineConfig::default(),
        )
        .with_clock(clock.clone());
        (orchestrator, store, clock)
    }

    fn mixed_catalog() -> Vec<ClueRecord> {
        let mut records = Vec::new();
        for tier in 1..=5u8 {
            for n in 0..4 {
                records.push(record(&format!("sci-{tier}-{n}"), "SCIENCE", tier));
                records.push(record(&format!("his-{tier}-{n}"), "HISTORY", tier));
            }
        }
        records
    }

    async fn open(orchestrator: &Orchestrator, mode: Mode, filter: Option<&str>) -> Session {
        orchestrator
            .start_session("alice", SessionConfig::new(mode, filter).unwrap(), Some(7))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn new_user_reaches_tier_four_on_fifth_correct_answer() {
        let (orchestrator, _, _) = setup(mixed_catalog());
        let mut session = open(&orchestrator, Mode::Adaptive, None).await;

        let mut tiers = Vec::new();
        for _ in 0..6 {
            let clue = orchestrator.next_clue(&mut session).next.clue().cloned().unwrap();
            tiers.push(clue.tier.get());
            let report = orchestrator
                .record_outcome(&mut session, &clue.id, true, 1_000)
                .await
                .unwrap();
            assert_eq!(report.event.quality, 5);
        }
        // Clues 1-5 are drawn at tier 3; the 5th answer raises the target.
        assert_eq!(tiers, vec![3, 3, 3, 3, 3, 4]);
        assert_eq!(session.profile().calibration.current_tier.get(), 4);
    }

    #[tokio::test]
    async fn no_repeats_until_pool_is_recycled() {
        let records = (0..5).map(|n| record(&format!("c{n}"), "ART", 2)).collect();
        let (orchestrator, _, _) = setup(records);
        let mut session = open(&orchestrator, Mode::Practice, None).await;

        let mut presented = HashSet::new();
        for _ in 0..5 {
            let clue = orchestrator.next_clue(&mut session).next.clue().cloned().unwrap();
            assert!(presented.insert(clue.id), "clue repeated before exhaustion");
        }
        assert_eq!(session.seen().len(), 5);

        let sixth = orchestrator.next_clue(&mut session);
        assert!(!sixth.next.is_exhausted());
        assert_eq!(session.seen().len(), 1);
        assert_eq!(session.turns(), 6);
    }

    #[tokio::test]
    async fn empty_filtered_catalog_is_exhausted() {
        let (orchestrator, _, _) = setup(mixed_catalog());
        let mut session = open(&orchestrator, Mode::Challenge, Some("opera")).await;
        let selection = orchestrator.next_clue(&mut session);
        assert!(selection.next.is_exhausted());
        assert_eq!(session.turns(), 0);
    }

    #[tokio::test]
    async fn category_filter_restricts_every_mode() {
        let (orchestrator, _, _) = setup(mixed_catalog());
        for mode in Mode::ALL {
            let mut session = open(&orchestrator, mode, Some(" history ")).await;
            for _ in 0..8 {
                let selection = orchestrator.next_clue(&mut session);
                assert_eq!(selection.next.clue().unwrap().category, "HISTORY", "{mode}");
            }
        }
    }

    #[tokio::test]
    async fn malformed_records_are_skipped_with_warnings() {
        let mut records = vec![record("good", "SCIENCE", 3)];
        records.push(ClueRecord {
            id: Some("no-prompt".into()),
            category: Some("SCIENCE".into()),
            answer: Some("x".into()),
            ..Default::default()
        });
        let (orchestrator, _, _) = setup(records);
        let mut session = open(&orchestrator, Mode::Practice, None).await;

        let selection = orchestrator.next_clue(&mut session);
        assert_eq!(selection.next.clue().unwrap().id, "good");
        assert_eq!(selection.warnings.len(), 1);
        assert_eq!(selection.warnings[0].clue_id.as_deref(), Some("no-prompt"));
    }

    #[tokio::test]
    async fn weakness_mode_targets_weak_science() {
        let (orchestrator, _, _) = setup(mixed_catalog());
        let mut session = open(&orchestrator, Mode::Weakness, None).await;

        for (n, correct) in [true, false, false, false].into_iter().enumerate() {
            orchestrator
                .record_outcome(&mut session, &format!("sci-2-{n}"), correct, 4_000)
                .await
                .unwrap();
        }
        let insights = orchestrator.insights_for(session.profile());
        assert_eq!(insights.weak_categories, vec!["SCIENCE"]);

        for _ in 0..5 {
            let selection = orchestrator.next_clue(&mut session);
            assert_eq!(selection.strategy, Some(Mode::Weakness));
            assert_eq!(selection.next.clue().unwrap().category, "SCIENCE");
        }
    }

    #[tokio::test]
    async fn review_mode_serves_due_clues() {
        let (orchestrator, _, clock) = setup(mixed_catalog());
        let mut session = open(&orchestrator, Mode::Review, None).await;
        orchestrator
            .record_outcome(&mut session, "his-1-0", true, 1_000)
            .await
            .unwrap();

        // Only the answered clue has review state; it is not due yet.
        let selection = orchestrator.next_clue(&mut session);
        assert_eq!(selection.strategy, Some(Mode::Practice));
        let practice_id = selection.next.clue().unwrap().id.clone();

        clock.advance(Duration::days(1));
        let selection = orchestrator.next_clue(&mut session);
        assert_eq!(selection.strategy, Some(Mode::Review));
        // The practice clue was presented and so is due at once, too.
        let id = selection.next.clue().unwrap().id.clone();
        assert!(id == "his-1-0" || id == practice_id, "unexpected {id}");
    }

    #[tokio::test]
    async fn record_outcome_persists_event_and_profile() {
        let (orchestrator, store, _) = setup(mixed_catalog());
        let mut session = open(&orchestrator, Mode::Practice, None).await;
        let report = orchestrator
            .record_outcome(&mut session, "sci-5-0", true, 30_000)
            .await
            .unwrap();

        assert_eq!(report.event.quality, 3);
        assert_eq!(report.event.outcome.category, "SCIENCE");
        assert_eq!(report.next_review_at, t0() + Duration::days(1));
        assert_eq!(store.events.lock().unwrap().len(), 1);
        let saved = store.profiles.lock().unwrap()["alice"].clone();
        assert_eq!(saved.totals.answered, 1);
        assert_eq!(saved.mastery["SCIENCE"].attempts, 1);
    }

    #[tokio::test]
    async fn store_failure_is_reported_but_state_advances() {
        let (orchestrator, store, _) = setup(mixed_catalog());
        let mut session = open(&orchestrator, Mode::Practice, None).await;
        store.failing.store(true, Ordering::SeqCst);

        let err = orchestrator
            .record_outcome(&mut session, "his-3-1", false, 2_000)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Persistence { operation: "append_event", .. }
        ));
        assert!(err.is_retryable());
        assert_eq!(session.profile().totals.answered, 1);
        assert_eq!(session.profile().mastery["HISTORY"].attempts, 1);
        assert_eq!(session.answered(), 1);
    }

    #[tokio::test]
    async fn verdict_failure_changes_nothing() {
        let (orchestrator, store, _) = setup(mixed_catalog());
        let mut session = open(&orchestrator, Mode::Practice, None).await;
        let before = session.profile().clone();

        let err = orchestrator
            .submit_answer(&mut session, "sci-1-0", "answer sci-1-0", 500, &FailingJudge)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Verdict(ref m) if m.contains("matcher offline")));
        assert_eq!(session.profile(), &before);
        assert_eq!(session.answered(), 0);
        assert!(store.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn submit_answer_uses_verdict() {
        let (orchestrator, _, _) = setup(mixed_catalog());
        let mut session = open(&orchestrator, Mode::Practice, None).await;
        let report = orchestrator
            .submit_answer(&mut session, "sci-1-0", "ANSWER SCI-1-0", 500, &ExactJudge)
            .await
            .unwrap();
        assert!(report.event.outcome.correct);
        let report = orchestrator
            .submit_answer(&mut session, "sci-1-1", "no idea", 500, &ExactJudge)
            .await
            .unwrap();
        assert!(!report.event.outcome.correct);
        assert_eq!(report.event.quality, 0);
    }

    #[tokio::test]
    async fn unknown_clue_is_rejected() {
        let (orchestrator, _, _) = setup(mixed_catalog());
        let mut session = open(&orchestrator, Mode::Practice, None).await;
        let err = orchestrator
            .record_outcome(&mut session, "nope", true, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::UnknownClue(_)));
        assert_eq!(session.answered(), 0);
    }

    #[tokio::test]
    async fn end_session_saves_summary_and_profile_is_reloaded() {
        let (orchestrator, store, clock) = setup(mixed_catalog());
        let mut session = open(&orchestrator, Mode::Practice, None).await;
        for (id, correct) in [("sci-1-0", true), ("his-2-0", false)] {
            orchestrator.next_clue(&mut session);
            orchestrator
                .record_outcome(&mut session, id, correct, 3_000)
                .await
                .unwrap();
        }
        clock.advance(Duration::minutes(5));
        let summary = orchestrator.end_session(session).await.unwrap();

        assert_eq!(summary.answered, 2);
        assert_eq!(summary.correct, 1);
        assert_eq!(summary.turns, 2);
        assert_eq!(summary.accuracy(), 0.5);
        assert_eq!(summary.avg_response_secs(), 3.0);
        assert_eq!(summary.ended_at - summary.started_at, Duration::minutes(5));
        assert_eq!(store.sessions.lock().unwrap().len(), 1);

        let resumed = orchestrator
            .start_session("alice", SessionConfig::new(Mode::Adaptive, None).unwrap(), None)
            .await
            .unwrap();
        assert_eq!(resumed.profile().totals.answered, 2);
    }

    #[tokio::test]
    async fn huge_response_times_saturate() {
        let (orchestrator, _, _) = setup(mixed_catalog());
        let mut session = open(&orchestrator, Mode::Practice, None).await;
        let report = orchestrator
            .record_outcome(&mut session, "sci-1-0", true, u64::MAX)
            .await
            .unwrap();
        assert_eq!(report.event.quality, 3);
        orchestrator
            .record_outcome(&mut session, "sci-1-1", true, 5)
            .await
            .unwrap();

        assert_eq!(session.profile().totals.total_response_ms, u64::MAX);
        let summary = orchestrator.end_session(session).await.unwrap();
        assert_eq!(summary.answered, 2);
        assert_eq!(summary.total_response_ms, u64::MAX);
    }

    #[tokio::test]
    async fn empty_user_id_is_a_configuration_error() {
        let (orchestrator, _, _) = setup(mixed_catalog());
        let err = orchestrator
            .start_session("  ", SessionConfig::new(Mode::Adaptive, None).unwrap(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Configuration(_)));
    }

    #[tokio::test]
    async fn invalid_engine_config_is_rejected_before_any_state() {
        let store = Arc::new(TestStore::default());
        let mut config = EngineConfig::default();
        config.scheduler.min_ease = 3.0;
        let orchestrator = Orchestrator::new(
            Arc::new(InMemoryCatalog::new(mixed_catalog())),
            store.clone(),
            config,
        );

        let err = orchestrator
            .start_session("alice", SessionConfig::new(Mode::Practice, None).unwrap(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Configuration(_)));
        assert!(matches!(
            orchestrator.get_insights("alice").await,
            Err(EngineError::Configuration(_))
        ));
        assert!(store.profiles.lock().unwrap().is_empty());
        assert!(store.events.lock().unwrap().is_empty());
    }

    #[test]
    fn quality_scales_expected_time_by_tier() {
        let (orchestrator, _, _) = setup(vec![]);
        let t1 = Tier::new(1).unwrap();
        let t5 = Tier::new(5).unwrap();
        assert_eq!(orchestrator.response_quality(true, 10_000, t1), 5);
        assert_eq!(orchestrator.response_quality(true, 10_001, t1), 3);
        assert_eq!(orchestrator.response_quality(true, 20_000, t5), 5);
        assert_eq!(orchestrator.response_quality(true, 20_001, t5), 3);
        assert_eq!(orchestrator.response_quality(false, 1, t1), 0);
    }
}
