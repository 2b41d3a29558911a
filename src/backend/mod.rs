use async_trait::async_trait;

use crate::dto::backend_dto::{
    SaveProgressRequest, ScoredResult, StartAttemptRequest, StartAttemptResponse,
    SubmitAttemptRequest,
};
use crate::error::Result;

pub mod http;

/// Persistence/scoring backend boundary. The engine calls it at exactly three
/// points: attempt start, terminal submission, and the best-effort progress
/// checkpoint. Everything already committed behind this trait is the system
/// of record.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ScoringBackend: Send + Sync {
    /// Idempotent per (assessment, user) while an attempt is in progress.
    async fn start_attempt(&self, req: StartAttemptRequest) -> Result<StartAttemptResponse>;

    /// The terminal call. Issued at most once per attempt id by the engine.
    async fn submit_attempt(&self, req: SubmitAttemptRequest) -> Result<ScoredResult>;

    /// Non-authoritative checkpoint; callers swallow failures.
    async fn save_progress(&self, req: SaveProgressRequest) -> Result<()>;
}
