use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::attempt::AttemptStatus;
use crate::models::question::{Question, QuestionType};

/// Question as shown to the learner: no correct-answer markers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionView {
    pub id: i32,
    pub position: i32,
    pub question_type: QuestionType,
    pub text: String,
    pub points: i32,
    pub options: Vec<OptionView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionView {
    pub id: i32,
    pub text: String,
}

impl From<&Question> for QuestionView {
    fn from(q: &Question) -> Self {
        Self {
            id: q.id,
            position: q.position,
            question_type: q.question_type,
            text: q.text.clone(),
            points: q.points,
            options: q
                .options
                .iter()
                .map(|o| OptionView {
                    id: o.id,
                    text: o.text.clone(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionStatusView {
    pub attempt_id: Uuid,
    pub status: AttemptStatus,
    pub remaining_seconds: i64,
    pub questions_answered: usize,
    pub total_questions: usize,
}
