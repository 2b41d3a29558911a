use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::answer::AnswerRecord;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attempt {
    pub id: Uuid,
    pub assessment_id: Uuid,
    pub user_id: String,
    pub status: AttemptStatus,
    pub started_at: DateTime<Utc>,
    pub duration_seconds: i64,
    pub answers: Vec<AnswerRecord>,
    pub time_spent_seconds: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    NotStarted,
    InProgress,
    Submitting,
    Completed,
    Expired,
    Abandoned,
}

impl AttemptStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            AttemptStatus::Completed | AttemptStatus::Expired | AttemptStatus::Abandoned
        )
    }

    /// Transitions are monotonic and one-directional; everything not listed
    /// here is rejected.
    pub fn can_transition_to(self, next: AttemptStatus) -> bool {
        use AttemptStatus::*;
        matches!(
            (self, next),
            (NotStarted, InProgress)
                | (InProgress, Submitting)
                | (InProgress, Abandoned)
                | (Submitting, Completed)
                | (Submitting, Expired)
        )
    }
}

impl std::fmt::Display for AttemptStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            AttemptStatus::NotStarted => "not_started",
            AttemptStatus::InProgress => "in_progress",
            AttemptStatus::Submitting => "submitting",
            AttemptStatus::Completed => "completed",
            AttemptStatus::Expired => "expired",
            AttemptStatus::Abandoned => "abandoned",
        };
        write!(f, "{}", label)
    }
}

/// What triggered the terminal submission. Forwarded to the backend so
/// reporting can tell a deliberate submit from a timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitReason {
    UserConfirmed,
    TimeExpired,
}
