use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::backend::ScoringBackend;
use crate::config::Config;
use crate::dto::backend_dto::{
    SaveProgressRequest, ScoredResult, StartAttemptRequest, SubmitAttemptRequest,
};
use crate::dto::session_dto::{QuestionView, SessionStatusView};
use crate::error::{Error, Result};
use crate::models::answer::{AnswerRecord, AnswerValue};
use crate::models::attempt::{Attempt, AttemptStatus, SubmitReason};
use crate::models::user::UserIdentity;
use crate::services::answer_tracker::AnswerTracker;
use crate::services::attempt_clock::AttemptClock;
use crate::services::question_timer::QuestionTimer;
use crate::services::submission_service::SubmissionCoordinator;
use crate::utils::time;

type SessionKey = (Uuid, String);

/// Entry point for taking assessments. Owns one live session per
/// (assessment, user) and hands out `AttemptSession` handles; everything
/// below the session handle is private to it.
pub struct AttemptService {
    backend: Arc<dyn ScoringBackend>,
    coordinator: Arc<SubmissionCoordinator>,
    sessions: Mutex<HashMap<SessionKey, Arc<AttemptSession>>>,
    save_progress_enabled: bool,
}

impl AttemptService {
    pub fn new(
        backend: Arc<dyn ScoringBackend>,
        coordinator: Arc<SubmissionCoordinator>,
        config: &Config,
    ) -> Self {
        Self {
            backend,
            coordinator,
            sessions: Mutex::new(HashMap::new()),
            save_progress_enabled: config.save_progress_enabled,
        }
    }

    /// Starts an attempt, or returns the live session when one is already in
    /// progress for this (assessment, user) - no second backend call is made
    /// in that case.
    pub async fn start(
        &self,
        assessment_id: Uuid,
        identity: &UserIdentity,
    ) -> Result<Arc<AttemptSession>> {
        let key = (assessment_id, identity.user_id.clone());

        if let Some(existing) = self.lookup(&key) {
            match existing.status() {
                AttemptStatus::InProgress => {
                    tracing::info!(
                        attempt_id = %existing.attempt_id(),
                        user_id = %identity.user_id,
                        "Attempt already in progress, returning existing session"
                    );
                    return Ok(existing);
                }
                // A submission is in flight; the caller should await its
                // result instead of opening a second attempt.
                AttemptStatus::Submitting => {
                    return Err(Error::AlreadyStarted(existing.attempt_id()));
                }
                // Terminal sessions are replaced by a fresh attempt below.
                _ => {}
            }
        }

        let started = self
            .backend
            .start_attempt(StartAttemptRequest {
                assessment_id,
                user_id: identity.user_id.clone(),
            })
            .await?;

        if started.questions.is_empty() {
            return Err(Error::CatalogUnavailable(format!(
                "assessment {} has no questions",
                assessment_id
            )));
        }

        tracing::info!(
            attempt_id = %started.attempt_id,
            user_id = %identity.user_id,
            duration_seconds = started.duration_seconds,
            total_questions = started.questions.len(),
            "Attempt started"
        );

        let session = AttemptSession::open(
            started.attempt_id,
            assessment_id,
            identity.user_id.clone(),
            started.duration_seconds,
            started.questions,
            self.backend.clone(),
            self.coordinator.clone(),
            self.save_progress_enabled,
        );

        self.lock_sessions().insert(key, session.clone());
        Ok(session)
    }

    pub fn session(&self, assessment_id: Uuid, user_id: &str) -> Option<Arc<AttemptSession>> {
        self.lookup(&(assessment_id, user_id.to_string()))
    }

    fn lookup(&self, key: &SessionKey) -> Option<Arc<AttemptSession>> {
        self.lock_sessions().get(key).cloned()
    }

    fn lock_sessions(&self) -> MutexGuard<'_, HashMap<SessionKey, Arc<AttemptSession>>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct SessionState {
    status: AttemptStatus,
    tracker: AnswerTracker,
    timer: QuestionTimer,
    pending_reason: Option<SubmitReason>,
    result: Option<ScoredResult>,
}

/// One learner taking one assessment. All mutable state is owned here; the
/// expiry task and the caller race only through `begin_submitting`, where the
/// first to move the status into Submitting wins and everyone else gets
/// `InvalidState`.
pub struct AttemptSession {
    attempt_id: Uuid,
    assessment_id: Uuid,
    user_id: String,
    duration_seconds: i64,
    started_at: DateTime<Utc>,
    backend: Arc<dyn ScoringBackend>,
    coordinator: Arc<SubmissionCoordinator>,
    save_progress_enabled: bool,
    state: Mutex<SessionState>,
    clock: AttemptClock,
}

impl std::fmt::Debug for AttemptSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttemptSession")
            .field("attempt_id", &self.attempt_id)
            .field("assessment_id", &self.assessment_id)
            .field("user_id", &self.user_id)
            .field("duration_seconds", &self.duration_seconds)
            .field("started_at", &self.started_at)
            .field("save_progress_enabled", &self.save_progress_enabled)
            .finish_non_exhaustive()
    }
}

impl AttemptSession {
    #[allow(clippy::too_many_arguments)]
    fn open(
        attempt_id: Uuid,
        assessment_id: Uuid,
        user_id: String,
        duration_seconds: i64,
        questions: Vec<crate::models::question::Question>,
        backend: Arc<dyn ScoringBackend>,
        coordinator: Arc<SubmissionCoordinator>,
        save_progress_enabled: bool,
    ) -> Arc<Self> {
        Arc::new_cyclic(|weak: &Weak<AttemptSession>| {
            let expire_ref = weak.clone();
            let clock = AttemptClock::start(duration_seconds, move || async move {
                if let Some(session) = expire_ref.upgrade() {
                    session.handle_expiry().await;
                }
            });

            AttemptSession {
                attempt_id,
                assessment_id,
                user_id,
                duration_seconds,
                started_at: time::now(),
                backend,
                coordinator,
                save_progress_enabled,
                state: Mutex::new(SessionState {
                    status: AttemptStatus::InProgress,
                    tracker: AnswerTracker::new(questions),
                    timer: QuestionTimer::new(duration_seconds),
                    pending_reason: None,
                    result: None,
                }),
                clock,
            }
        })
    }

    /// Records or replaces the answer for a question. InProgress only.
    pub fn answer(&self, question_id: i32, value: AnswerValue) -> Result<AnswerRecord> {
        let record = {
            let mut state = self.lock_state();
            if state.status != AttemptStatus::InProgress {
                return Err(Error::InvalidState(format!(
                    "cannot answer while attempt is {}",
                    state.status
                )));
            }
            let now = time::now();
            let spent = state.timer.accumulated_including_active(question_id, now);
            state.tracker.set_answer(question_id, value, spent)?
        };

        if self.save_progress_enabled {
            self.checkpoint(record.clone());
        }
        Ok(record)
    }

    /// Moves the per-question stopwatch onto `question_id`, folding the time
    /// spent on the previously active question into its total.
    pub fn navigate_to(&self, question_id: i32) -> Result<()> {
        let mut state = self.lock_state();
        if state.status != AttemptStatus::InProgress {
            return Err(Error::InvalidState(format!(
                "cannot navigate while attempt is {}",
                state.status
            )));
        }
        state.tracker.question(question_id)?;
        state.timer.enter_question(question_id, time::now());
        Ok(())
    }

    /// User-initiated submission. Without `allow_incomplete` this refuses
    /// with the advisory `Incomplete` error while unanswered questions
    /// remain; the caller decides whether to proceed with an override.
    pub async fn confirm_submit(&self, allow_incomplete: bool) -> Result<ScoredResult> {
        {
            let state = self.lock_state();
            if state.status != AttemptStatus::InProgress {
                return Err(Error::InvalidState(format!(
                    "cannot submit while attempt is {}",
                    state.status
                )));
            }
            if !allow_incomplete {
                let answered = state.tracker.answered_count();
                let total = state.tracker.total_questions();
                if answered < total {
                    return Err(Error::Incomplete { answered, total });
                }
            }
        }

        // The status is re-checked under the lock; expiry may have won the
        // transition between the check above and here.
        let request = self.begin_submitting(SubmitReason::UserConfirmed)?;
        self.deliver(request).await
    }

    /// Re-drives a submission whose retries were exhausted. The answer set
    /// has been frozen since the Submitting transition, so the retried
    /// payload carries exactly the answers the first delivery carried.
    pub async fn retry_submit(&self) -> Result<ScoredResult> {
        let request = {
            let state = self.lock_state();
            if state.status != AttemptStatus::Submitting {
                return Err(Error::InvalidState(format!(
                    "cannot retry submission while attempt is {}",
                    state.status
                )));
            }
            let reason = state
                .pending_reason
                .ok_or_else(|| Error::Internal("submitting without a recorded reason".into()))?;
            self.build_request(&state, reason)
        };
        self.deliver(request).await
    }

    /// External abandonment signal (e.g. navigation away without submit).
    /// Cancels the clock synchronously so no delayed expiry fires afterwards.
    pub fn abandon(&self) -> Result<()> {
        let mut state = self.lock_state();
        if state.status != AttemptStatus::InProgress {
            return Err(Error::InvalidState(format!(
                "cannot abandon while attempt is {}",
                state.status
            )));
        }
        self.clock.cancel();
        state.timer.finalize(time::now());
        state.status = AttemptStatus::Abandoned;
        tracing::info!(attempt_id = %self.attempt_id, "Attempt abandoned");
        Ok(())
    }

    async fn handle_expiry(&self) {
        tracing::warn!(
            attempt_id = %self.attempt_id,
            "Duration limit elapsed, submitting automatically"
        );
        // If a user-initiated submission already won the transition, the
        // guard refuses and there is nothing left to do here.
        if let Ok(request) = self.begin_submitting(SubmitReason::TimeExpired) {
            if let Err(err) = self.deliver(request).await {
                tracing::error!(
                    attempt_id = %self.attempt_id,
                    "Automatic submission after expiry failed: {}",
                    err
                );
            }
        }
    }

    /// The single-assignment guard: only the first caller ever moves the
    /// status from InProgress to Submitting. Freezes the answer set and the
    /// timers and builds the submission payload under the same lock.
    fn begin_submitting(&self, reason: SubmitReason) -> Result<SubmitAttemptRequest> {
        let mut state = self.lock_state();
        if state.status != AttemptStatus::InProgress {
            return Err(Error::InvalidState(format!(
                "attempt is {}",
                state.status
            )));
        }
        state.status = AttemptStatus::Submitting;
        state.pending_reason = Some(reason);
        // After this, a still-pending expiry callback is a guaranteed no-op.
        self.clock.cancel();
        state.timer.finalize(time::now());

        tracing::info!(
            attempt_id = %self.attempt_id,
            reason = ?reason,
            answered = state.tracker.answered_count(),
            total = state.tracker.total_questions(),
            "Entering submission"
        );
        Ok(self.build_request(&state, reason))
    }

    fn build_request(&self, state: &SessionState, reason: SubmitReason) -> SubmitAttemptRequest {
        let mut answers = state.tracker.payload_answers();
        for record in &mut answers {
            record.time_spent_seconds = state.timer.accumulated_seconds(record.question_id);
        }
        SubmitAttemptRequest {
            attempt_id: self.attempt_id,
            answers,
            reason,
            time_expired: reason == SubmitReason::TimeExpired,
            time_spent_seconds: time::clamped_elapsed_seconds(
                self.started_at,
                time::now(),
                self.duration_seconds,
            ),
        }
    }

    async fn deliver(&self, request: SubmitAttemptRequest) -> Result<ScoredResult> {
        // Failure leaves the attempt in Submitting with the answer set
        // intact; `retry_submit` re-drives it. A SubmissionConflict means
        // the other trigger's call is in flight and will settle the state.
        let result = self.coordinator.submit(request).await?;

        let mut state = self.lock_state();
        state.status = if result.time_expired {
            AttemptStatus::Expired
        } else {
            AttemptStatus::Completed
        };
        state.result = Some(result.clone());
        Ok(result)
    }

    fn checkpoint(&self, record: AnswerRecord) {
        let backend = self.backend.clone();
        let req = SaveProgressRequest {
            attempt_id: self.attempt_id,
            answer: record,
        };
        // Best-effort: never blocks the caller, failures are swallowed.
        tokio::spawn(async move {
            if let Err(err) = backend.save_progress(req).await {
                tracing::debug!("Progress checkpoint failed: {}", err);
            }
        });
    }

    pub fn attempt_id(&self) -> Uuid {
        self.attempt_id
    }

    pub fn assessment_id(&self) -> Uuid {
        self.assessment_id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn status(&self) -> AttemptStatus {
        self.lock_state().status
    }

    /// Seconds left on the attempt clock; 0 once the attempt has left
    /// InProgress through any path.
    pub fn remaining_seconds(&self) -> i64 {
        if self.status() == AttemptStatus::InProgress {
            self.clock.remaining_seconds()
        } else {
            0
        }
    }

    pub fn answered_count(&self) -> usize {
        self.lock_state().tracker.answered_count()
    }

    pub fn total_questions(&self) -> usize {
        self.lock_state().tracker.total_questions()
    }

    pub fn answer_for(&self, question_id: i32) -> Option<AnswerRecord> {
        self.lock_state().tracker.get_answer(question_id).cloned()
    }

    /// Redacted question list for the presentation layer.
    pub fn questions(&self) -> Vec<QuestionView> {
        self.lock_state()
            .tracker
            .questions()
            .iter()
            .map(QuestionView::from)
            .collect()
    }

    pub fn result(&self) -> Option<ScoredResult> {
        self.lock_state().result.clone()
    }

    /// Point-in-time snapshot of the whole attempt.
    pub fn attempt(&self) -> Attempt {
        let state = self.lock_state();
        let now = time::now();
        let mut answers = state.tracker.all_answers();
        for record in &mut answers {
            record.time_spent_seconds = state
                .timer
                .accumulated_including_active(record.question_id, now);
        }
        Attempt {
            id: self.attempt_id,
            assessment_id: self.assessment_id,
            user_id: self.user_id.clone(),
            status: state.status,
            started_at: self.started_at,
            duration_seconds: self.duration_seconds,
            answers,
            time_spent_seconds: time::clamped_elapsed_seconds(
                self.started_at,
                now,
                self.duration_seconds,
            ),
        }
    }

    pub fn status_view(&self) -> SessionStatusView {
        let state = self.lock_state();
        let remaining = if state.status == AttemptStatus::InProgress {
            self.clock.remaining_seconds()
        } else {
            0
        };
        SessionStatusView {
            attempt_id: self.attempt_id,
            status: state.status,
            remaining_seconds: remaining,
            questions_answered: state.tracker.answered_count(),
            total_questions: state.tracker.total_questions(),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
