use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use url::Url;
use validator::Validate;

use crate::backend::ScoringBackend;
use crate::config::Config;
use crate::dto::backend_dto::{
    SaveProgressRequest, ScoredResult, StartAttemptRequest, StartAttemptResponse,
    SubmitAttemptRequest,
};
use crate::error::{Error, Result};
use crate::models::user::UserIdentity;

pub struct HttpScoringBackend {
    client: Client,
    base_url: Url,
    auth_token: String,
}

impl HttpScoringBackend {
    pub fn new(config: &Config, identity: &UserIdentity) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;
        let base_url = Url::parse(&config.backend_base_url)
            .map_err(|e| Error::Config(format!("Invalid backend base URL: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            auth_token: identity.auth_token.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::Config(format!("Invalid endpoint {}: {}", path, e)))
    }

    async fn rejection(resp: Response) -> Error {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        if status.is_server_error() {
            Error::BackendUnavailable(format!("{}: {}", status, body))
        } else {
            Error::BackendRejected(format!("{}: {}", status, body))
        }
    }
}

#[async_trait]
impl ScoringBackend for HttpScoringBackend {
    async fn start_attempt(&self, req: StartAttemptRequest) -> Result<StartAttemptResponse> {
        let url = self.endpoint(&format!("api/assessments/{}/attempts", req.assessment_id))?;
        let resp = self
            .client
            .post(url)
            .bearer_auth(&self.auth_token)
            .json(&req)
            .send()
            .await
            .map_err(|e| Error::BackendUnavailable(format!("start_attempt: {}", e)))?;

        match resp.status() {
            StatusCode::NOT_FOUND => Err(Error::CatalogUnavailable(format!(
                "assessment {} not found",
                req.assessment_id
            ))),
            status if status.is_success() => {
                let parsed: StartAttemptResponse = resp.json().await?;
                if parsed.questions.is_empty() {
                    return Err(Error::CatalogUnavailable(format!(
                        "assessment {} returned an empty question set",
                        req.assessment_id
                    )));
                }
                Ok(parsed)
            }
            _ => Err(Self::rejection(resp).await),
        }
    }

    async fn submit_attempt(&self, req: SubmitAttemptRequest) -> Result<ScoredResult> {
        req.validate()?;
        let url = self.endpoint(&format!("api/attempts/{}/submit", req.attempt_id))?;
        let resp = self
            .client
            .post(url)
            .bearer_auth(&self.auth_token)
            .json(&req)
            .send()
            .await
            .map_err(|e| Error::BackendUnavailable(format!("submit_attempt: {}", e)))?;

        match resp.status() {
            // The backend already holds a scored result for this attempt.
            StatusCode::CONFLICT => Err(Error::SubmissionConflict(req.attempt_id)),
            status if status.is_success() => Ok(resp.json().await?),
            _ => Err(Self::rejection(resp).await),
        }
    }

    async fn save_progress(&self, req: SaveProgressRequest) -> Result<()> {
        req.validate()?;
        let url = self.endpoint(&format!("api/attempts/{}/progress", req.attempt_id))?;
        let resp = self
            .client
            .post(url)
            .bearer_auth(&self.auth_token)
            .json(&req)
            .send()
            .await
            .map_err(|e| Error::BackendUnavailable(format!("save_progress: {}", e)))?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(Self::rejection(resp).await)
        }
    }
}
