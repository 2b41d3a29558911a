use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use rand::Rng;
use uuid::Uuid;

use crate::backend::ScoringBackend;
use crate::dto::backend_dto::{ScoredResult, SubmitAttemptRequest};
use crate::error::{Error, Result};

/// Serializes the terminal submission per attempt id. Whichever trigger gets
/// here first (user confirm or expiry) acquires the gate; everyone else
/// observes `SubmissionConflict` and should await the winner's result.
pub struct SubmissionCoordinator {
    backend: Arc<dyn ScoringBackend>,
    gates: Mutex<HashSet<Uuid>>,
    max_attempts: u32,
    backoff_base_ms: u64,
}

impl SubmissionCoordinator {
    pub fn new(backend: Arc<dyn ScoringBackend>, max_attempts: u32, backoff_base_ms: u64) -> Self {
        Self {
            backend,
            gates: Mutex::new(HashSet::new()),
            max_attempts: max_attempts.max(1),
            backoff_base_ms: backoff_base_ms.max(1),
        }
    }

    /// At-most-once delivery of the scored submission. A settled attempt
    /// keeps its gate entry forever; on total failure the gate is released
    /// so a manual retry can re-acquire it. The answer set itself stays with
    /// the session and is never dropped here.
    pub async fn submit(&self, req: SubmitAttemptRequest) -> Result<ScoredResult> {
        let attempt_id = req.attempt_id;
        self.acquire(attempt_id)?;

        let outcome = self.deliver(req).await;
        if outcome.is_err() {
            self.release(attempt_id);
        }
        outcome
    }

    fn acquire(&self, attempt_id: Uuid) -> Result<()> {
        if !self.lock_gates().insert(attempt_id) {
            return Err(Error::SubmissionConflict(attempt_id));
        }
        Ok(())
    }

    fn release(&self, attempt_id: Uuid) {
        self.lock_gates().remove(&attempt_id);
    }

    async fn deliver(&self, req: SubmitAttemptRequest) -> Result<ScoredResult> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.backend.submit_attempt(req.clone()).await {
                Ok(result) => {
                    tracing::info!(
                        attempt_id = %req.attempt_id,
                        reason = ?req.reason,
                        passed = result.passed,
                        "Attempt submitted"
                    );
                    return Ok(result);
                }
                Err(err) if err.is_retryable() && attempt < self.max_attempts => {
                    let delay = self.backoff_delay(attempt);
                    tracing::warn!(
                        attempt_id = %req.attempt_id,
                        try_number = attempt,
                        "Submission failed, retrying in {:?}: {}",
                        delay,
                        err
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => {
                    tracing::error!(
                        attempt_id = %req.attempt_id,
                        try_number = attempt,
                        "Submission failed permanently: {}",
                        err
                    );
                    return Err(err);
                }
            }
        }
    }

    // Exponential schedule with jitter, capped at one minute.
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let exp = self
            .backoff_base_ms
            .saturating_mul(1u64 << (attempt - 1).min(6))
            .min(60_000);
        let jitter = rand::thread_rng().gen_range(0..=self.backoff_base_ms / 2);
        Duration::from_millis(exp + jitter)
    }

    fn lock_gates(&self) -> std::sync::MutexGuard<'_, HashSet<Uuid>> {
        self.gates.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
