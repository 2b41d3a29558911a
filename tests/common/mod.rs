// Not every test binary exercises every helper here.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use assessment_engine::backend::ScoringBackend;
use assessment_engine::config::Config;
use assessment_engine::dto::backend_dto::{
    QuestionResult, SaveProgressRequest, ScoredResult, StartAttemptRequest, StartAttemptResponse,
    SubmitAttemptRequest,
};
use assessment_engine::error::{Error, Result};
use assessment_engine::models::question::{AnswerOption, Question, QuestionType};
use assessment_engine::models::user::UserIdentity;
use assessment_engine::AssessmentEngine;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("assessment_engine=debug")
        .try_init();
}

pub fn identity(user: &str) -> UserIdentity {
    UserIdentity::new(user, "token-for-tests")
}

fn option(id: i32, text: &str, is_correct: bool) -> AnswerOption {
    AnswerOption {
        id,
        text: text.to_string(),
        is_correct,
    }
}

fn choice(id: i32, position: i32, text: &str, correct_option: i32) -> Question {
    Question {
        id,
        position,
        question_type: QuestionType::SingleChoice,
        text: text.to_string(),
        points: 2,
        options: vec![
            option(1, "first", correct_option == 1),
            option(2, "second", correct_option == 2),
            option(3, "third", correct_option == 3),
        ],
    }
}

/// Five-question catalog: four single-choice, one open-text.
pub fn catalog() -> Vec<Question> {
    vec![
        choice(1, 1, "What does ownership move?", 2),
        choice(2, 2, "Which trait enables ?", 1),
        choice(3, 3, "What does Arc stand for?", 3),
        choice(4, 4, "Which pointer is atomic?", 2),
        Question {
            id: 5,
            position: 5,
            question_type: QuestionType::OpenText,
            text: "Explain borrowing".into(),
            points: 2,
            options: vec![],
        },
    ]
}

/// Programmable in-memory stand-in for the persistence/scoring backend.
/// Counts calls, records payloads, and grades submissions against the
/// catalog's correct-answer markers.
pub struct StubBackend {
    pub attempt_id: Uuid,
    pub duration_seconds: i64,
    pub questions: Vec<Question>,
    pub start_calls: AtomicUsize,
    pub submit_calls: AtomicUsize,
    pub submit_failures: Mutex<VecDeque<Error>>,
    pub submitted: Mutex<Vec<SubmitAttemptRequest>>,
    pub saved: Mutex<Vec<SaveProgressRequest>>,
    /// Makes the graded result claim expiry regardless of the client flag,
    /// like a backend corroborating the deadline on its own clock.
    pub force_expired: AtomicBool,
}

impl StubBackend {
    pub fn new(duration_seconds: i64) -> Arc<Self> {
        Arc::new(Self {
            attempt_id: Uuid::new_v4(),
            duration_seconds,
            questions: catalog(),
            start_calls: AtomicUsize::new(0),
            submit_calls: AtomicUsize::new(0),
            submit_failures: Mutex::new(VecDeque::new()),
            submitted: Mutex::new(Vec::new()),
            saved: Mutex::new(Vec::new()),
            force_expired: AtomicBool::new(false),
        })
    }

    pub fn fail_next_submits(&self, failures: Vec<Error>) {
        self.submit_failures.lock().unwrap().extend(failures);
    }

    pub fn start_count(&self) -> usize {
        self.start_calls.load(Ordering::SeqCst)
    }

    pub fn submit_count(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn last_submitted(&self) -> Option<SubmitAttemptRequest> {
        self.submitted.lock().unwrap().last().cloned()
    }

    fn grade(&self, req: &SubmitAttemptRequest) -> ScoredResult {
        let mut earned = 0i32;
        let mut total = 0i32;
        let mut breakdown = Vec::new();

        for q in &self.questions {
            total += q.points;
            let answer = req.answers.iter().find(|a| a.question_id == q.id);
            let answered = answer.map(|a| a.is_answered()).unwrap_or(false);
            let is_correct = answer
                .and_then(|a| a.selected_option_id)
                .map(|oid| q.options.iter().any(|o| o.id == oid && o.is_correct))
                .unwrap_or(false);
            if is_correct {
                earned += q.points;
            }
            breakdown.push(QuestionResult {
                question_id: q.id,
                answered,
                is_correct,
                points_earned: if is_correct { q.points } else { 0 },
                max_points: q.points,
            });
        }

        let percentage = if total > 0 {
            Decimal::from(earned * 100) / Decimal::from(total)
        } else {
            Decimal::ZERO
        };

        ScoredResult {
            attempt_id: req.attempt_id,
            score: Decimal::from(earned),
            total_points: Decimal::from(total),
            percentage,
            passed: percentage >= Decimal::from(60),
            time_expired: req.time_expired || self.force_expired.load(Ordering::SeqCst),
            breakdown,
        }
    }
}

#[async_trait]
impl ScoringBackend for StubBackend {
    async fn start_attempt(&self, _req: StartAttemptRequest) -> Result<StartAttemptResponse> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        Ok(StartAttemptResponse {
            attempt_id: self.attempt_id,
            duration_seconds: self.duration_seconds,
            questions: self.questions.clone(),
        })
    }

    async fn submit_attempt(&self, req: SubmitAttemptRequest) -> Result<ScoredResult> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.submit_failures.lock().unwrap().pop_front() {
            return Err(err);
        }
        let result = self.grade(&req);
        self.submitted.lock().unwrap().push(req);
        Ok(result)
    }

    async fn save_progress(&self, req: SaveProgressRequest) -> Result<()> {
        self.saved.lock().unwrap().push(req);
        Ok(())
    }
}

pub fn engine(stub: Arc<StubBackend>) -> AssessmentEngine {
    let mut config = Config::for_backend("http://127.0.0.1:0");
    config.submit_backoff_ms = 10;
    config.save_progress_enabled = false;
    AssessmentEngine::new(stub, &config)
}

pub fn engine_with_config(stub: Arc<StubBackend>, config: &Config) -> AssessmentEngine {
    AssessmentEngine::new(stub, config)
}

/// Gives spawned tasks (the attempt clock, checkpoints) a chance to run.
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}
