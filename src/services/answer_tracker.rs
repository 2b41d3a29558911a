use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::models::answer::{AnswerRecord, AnswerValue};
use crate::models::question::Question;
use crate::utils::time;

/// In-progress answer set for one attempt. Pure in-memory state: no time
/// awareness, no network. The question snapshot taken at attempt start is
/// the only set of ids this tracker will accept.
pub struct AnswerTracker {
    questions: Vec<Question>,
    index: HashMap<i32, usize>,
    answers: HashMap<i32, AnswerRecord>,
}

impl AnswerTracker {
    pub fn new(questions: Vec<Question>) -> Self {
        let index = questions
            .iter()
            .enumerate()
            .map(|(i, q)| (q.id, i))
            .collect();
        Self {
            questions,
            index,
            answers: HashMap::new(),
        }
    }

    /// Overwrites any prior record for the question; never appends duplicates.
    /// Rejects ids missing from the snapshot, forged option ids, and values
    /// that do not match the question type. Rejected calls do not mutate.
    pub fn set_answer(
        &mut self,
        question_id: i32,
        value: AnswerValue,
        time_spent_seconds: i64,
    ) -> Result<AnswerRecord> {
        let question = self.question(question_id)?;

        let record = match value {
            AnswerValue::Choice(option_id) => {
                if !question.expects_selection() {
                    return Err(Error::AnswerMismatch(question_id));
                }
                if !question.has_option(option_id) {
                    return Err(Error::UnknownOption {
                        question_id,
                        option_id,
                    });
                }
                AnswerRecord {
                    question_id,
                    selected_option_id: Some(option_id),
                    free_text: None,
                    time_spent_seconds,
                    answered_at: Some(time::now()),
                }
            }
            AnswerValue::Text(text) => {
                if question.expects_selection() {
                    return Err(Error::AnswerMismatch(question_id));
                }
                AnswerRecord {
                    question_id,
                    selected_option_id: None,
                    free_text: Some(text),
                    time_spent_seconds,
                    answered_at: Some(time::now()),
                }
            }
        };

        self.answers.insert(question_id, record.clone());
        Ok(record)
    }

    pub fn question(&self, question_id: i32) -> Result<&Question> {
        self.index
            .get(&question_id)
            .map(|&i| &self.questions[i])
            .ok_or(Error::UnknownQuestion(question_id))
    }

    pub fn get_answer(&self, question_id: i32) -> Option<&AnswerRecord> {
        self.answers.get(&question_id)
    }

    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Recorded answers in catalog order, not insertion order.
    pub fn all_answers(&self) -> Vec<AnswerRecord> {
        self.questions
            .iter()
            .filter_map(|q| self.answers.get(&q.id).cloned())
            .collect()
    }

    /// One record per catalog question, unanswered ones padded with
    /// placeholders. This is the shape the submission payload wants.
    pub fn payload_answers(&self) -> Vec<AnswerRecord> {
        self.questions
            .iter()
            .map(|q| {
                self.answers
                    .get(&q.id)
                    .cloned()
                    .unwrap_or_else(|| AnswerRecord::unanswered(q.id))
            })
            .collect()
    }

    pub fn unanswered_ids(&self) -> Vec<i32> {
        self.questions
            .iter()
            .filter(|q| !self.answers.contains_key(&q.id))
            .map(|q| q.id)
            .collect()
    }
}
