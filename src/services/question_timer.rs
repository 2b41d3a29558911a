use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::utils::time::clamped_elapsed_seconds;

/// Per-question elapsed-time accumulator. At most one question is active at
/// a time; entering another question folds the running span into the previous
/// question's total first. Revisits accumulate additively.
pub struct QuestionTimer {
    duration_limit: i64,
    active: Option<ActiveQuestion>,
    accumulated: HashMap<i32, i64>,
}

struct ActiveQuestion {
    question_id: i32,
    entered_at: DateTime<Utc>,
}

impl QuestionTimer {
    pub fn new(duration_limit: i64) -> Self {
        Self {
            duration_limit: duration_limit.max(0),
            active: None,
            accumulated: HashMap::new(),
        }
    }

    pub fn enter_question(&mut self, question_id: i32, now: DateTime<Utc>) {
        if let Some(active) = self.active.take() {
            // Re-entering the active question keeps its running span.
            if active.question_id == question_id {
                self.active = Some(active);
                return;
            }
            self.fold(active, now);
        }
        self.active = Some(ActiveQuestion {
            question_id,
            entered_at: now,
        });
    }

    /// Closes the active span, if any, and returns the seconds it contributed.
    pub fn leave_question(&mut self, now: DateTime<Utc>) -> i64 {
        match self.active.take() {
            Some(active) => self.fold(active, now),
            None => 0,
        }
    }

    pub fn accumulated_seconds(&self, question_id: i32) -> i64 {
        self.accumulated.get(&question_id).copied().unwrap_or(0)
    }

    /// Total for a question including the still-open span, without closing it.
    pub fn accumulated_including_active(&self, question_id: i32, now: DateTime<Utc>) -> i64 {
        let mut total = self.accumulated_seconds(question_id);
        if let Some(ref active) = self.active {
            if active.question_id == question_id {
                let delta = clamped_elapsed_seconds(active.entered_at, now, self.duration_limit);
                total = (total + delta).min(self.duration_limit);
            }
        }
        total
    }

    /// Implicit leave before the tally is read at submission.
    pub fn finalize(&mut self, now: DateTime<Utc>) {
        let _ = self.leave_question(now);
    }

    pub fn active_question(&self) -> Option<i32> {
        self.active.as_ref().map(|a| a.question_id)
    }

    fn fold(&mut self, active: ActiveQuestion, now: DateTime<Utc>) -> i64 {
        let delta = clamped_elapsed_seconds(active.entered_at, now, self.duration_limit);
        let entry = self.accumulated.entry(active.question_id).or_insert(0);
        // No single question may exceed the attempt's duration limit.
        *entry = (*entry + delta).min(self.duration_limit);
        delta
    }
}
