use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::answer::AnswerRecord;
use crate::models::attempt::SubmitReason;
use crate::models::question::Question;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartAttemptRequest {
    pub assessment_id: Uuid,
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartAttemptResponse {
    pub attempt_id: Uuid,
    pub duration_seconds: i64,
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SubmitAttemptRequest {
    pub attempt_id: Uuid,
    pub answers: Vec<AnswerRecord>,
    pub reason: SubmitReason,
    pub time_expired: bool,
    pub time_spent_seconds: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredResult {
    pub attempt_id: Uuid,
    pub score: Decimal,
    pub total_points: Decimal,
    pub percentage: Decimal,
    pub passed: bool,
    // The backend corroborates expiry against its own recorded start time;
    // the client-reported flag is advisory only.
    pub time_expired: bool,
    pub breakdown: Vec<QuestionResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionResult {
    pub question_id: i32,
    pub answered: bool,
    pub is_correct: bool,
    pub points_earned: i32,
    pub max_points: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SaveProgressRequest {
    pub attempt_id: Uuid,
    pub answer: AnswerRecord,
}
