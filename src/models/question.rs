use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: i32,
    #[serde(default)]
    pub position: i32,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub text: String,
    #[serde(default = "default_points")]
    pub points: i32,
    #[serde(default)]
    pub options: Vec<AnswerOption>,
}

fn default_points() -> i32 {
    1
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    SingleChoice,
    TrueFalse,
    OpenText,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerOption {
    pub id: i32,
    pub text: String,
    // Correct-answer markers arrive with the catalog snapshot but must never
    // leave the engine once the session is live.
    #[serde(default, skip_serializing)]
    pub is_correct: bool,
}

impl Question {
    pub fn has_option(&self, option_id: i32) -> bool {
        self.options.iter().any(|o| o.id == option_id)
    }

    pub fn expects_selection(&self) -> bool {
        matches!(
            self.question_type,
            QuestionType::SingleChoice | QuestionType::TrueFalse
        )
    }
}
