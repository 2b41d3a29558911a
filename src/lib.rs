pub mod backend;
pub mod config;
pub mod dto;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

use std::sync::Arc;

use crate::backend::http::HttpScoringBackend;
use crate::backend::ScoringBackend;
use crate::config::Config;
use crate::models::user::UserIdentity;
use crate::services::attempt_service::AttemptService;
use crate::services::submission_service::SubmissionCoordinator;

pub struct AssessmentEngine {
    pub attempt_service: AttemptService,
}

impl AssessmentEngine {
    pub fn new(backend: Arc<dyn ScoringBackend>, config: &Config) -> Self {
        let coordinator = Arc::new(SubmissionCoordinator::new(
            backend.clone(),
            config.submit_max_retries,
            config.submit_backoff_ms,
        ));
        let attempt_service = AttemptService::new(backend, coordinator, config);

        Self { attempt_service }
    }

    /// Engine wired to the HTTP backend configured through the environment.
    pub fn from_env(identity: &UserIdentity) -> crate::error::Result<Self> {
        let config = Config::from_env()?;
        let backend = Arc::new(HttpScoringBackend::new(&config, identity)?);
        Ok(Self::new(backend, &config))
    }
}
