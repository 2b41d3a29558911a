use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub backend_base_url: String,
    pub request_timeout_secs: u64,
    pub submit_max_retries: u32,
    pub submit_backoff_ms: u64,
    pub save_progress_enabled: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            backend_base_url: get_env("ASSESSMENT_BACKEND_URL")?,
            request_timeout_secs: get_env_parse_or("ASSESSMENT_REQUEST_TIMEOUT_SECS", 30)?,
            submit_max_retries: get_env_parse_or("ASSESSMENT_SUBMIT_MAX_RETRIES", 3)?,
            submit_backoff_ms: get_env_parse_or("ASSESSMENT_SUBMIT_BACKOFF_MS", 500)?,
            save_progress_enabled: get_env_parse_or("ASSESSMENT_SAVE_PROGRESS", true)?,
        })
    }

    pub fn for_backend(base_url: impl Into<String>) -> Self {
        Self {
            backend_base_url: base_url.into(),
            request_timeout_secs: 30,
            submit_max_retries: 3,
            submit_backoff_ms: 500,
            save_progress_enabled: true,
        }
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}
