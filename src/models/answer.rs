use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question_id: i32,
    pub selected_option_id: Option<i32>,
    pub free_text: Option<String>,
    pub time_spent_seconds: i64,
    pub answered_at: Option<DateTime<Utc>>,
}

impl AnswerRecord {
    /// Placeholder carried in the submission payload for questions the
    /// learner never answered, so the backend grades them as unanswered.
    pub fn unanswered(question_id: i32) -> Self {
        Self {
            question_id,
            selected_option_id: None,
            free_text: None,
            time_spent_seconds: 0,
            answered_at: None,
        }
    }

    pub fn is_answered(&self) -> bool {
        self.selected_option_id.is_some() || self.free_text.is_some()
    }
}

/// Answer input as collected by the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum AnswerValue {
    Choice(i32),
    Text(String),
}
