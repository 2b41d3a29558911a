use uuid::Uuid;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Attempt {0} is already in progress")]
    AlreadyStarted(Uuid),

    #[error("Unknown question id: {0}")]
    UnknownQuestion(i32),

    #[error("Unknown option {option_id} for question {question_id}")]
    UnknownOption { question_id: i32, option_id: i32 },

    #[error("Answer value does not match the type of question {0}")]
    AnswerMismatch(i32),

    #[error("Only {answered} of {total} questions answered")]
    Incomplete { answered: usize, total: usize },

    #[error("Submission already issued for attempt {0}")]
    SubmissionConflict(Uuid),

    #[error("Catalog unavailable: {0}")]
    CatalogUnavailable(String),

    #[error("Backend rejected request: {0}")]
    BackendRejected(String),

    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Only transient backend failures are worth another submission attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::BackendUnavailable(_))
    }

    /// Advisory errors leave the attempt untouched; the caller decides whether to proceed.
    pub fn is_advisory(&self) -> bool {
        matches!(self, Error::Incomplete { .. })
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() {
            Error::BackendUnavailable(err.to_string())
        } else {
            Error::BackendRejected(err.to_string())
        }
    }
}
