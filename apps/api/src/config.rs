use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4";
const DEFAULT_FORMAT_MAX_TOKENS: u32 = 500;
const DEFAULT_MAX_UPLOAD_MB: usize = 200;
const DEFAULT_SESSION_IDLE_MINUTES: u64 = 60;

/// Application configuration loaded from environment variables.
/// The API key is optional here: a missing key only surfaces when notes are formatted.
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    pub format_max_tokens: u32,
    /// Request body cap for document uploads.
    pub max_upload_bytes: usize,
    /// Sessions left untouched this long are discarded.
    pub session_idle: Duration,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Builds the config from any variable source. Blank values count as unset.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let max_upload_mb = match var("MAX_UPLOAD_MB") {
            Some(raw) => raw
                .parse::<usize>()
                .context("MAX_UPLOAD_MB must be a whole number of megabytes")?,
            None => DEFAULT_MAX_UPLOAD_MB,
        };
        let session_idle_minutes = match var("SESSION_IDLE_MINUTES") {
            Some(raw) => raw
                .parse::<u64>()
                .context("SESSION_IDLE_MINUTES must be a whole number of minutes")?,
            None => DEFAULT_SESSION_IDLE_MINUTES,
        };

        Ok(Config {
            openai_api_key: var("OPENAI_API_KEY"),
            openai_base_url: var("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            openai_model: var("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            format_max_tokens: match var("FORMAT_MAX_TOKENS") {
                Some(raw) => raw
                    .parse::<u32>()
                    .context("FORMAT_MAX_TOKENS must be a positive integer")?,
                None => DEFAULT_FORMAT_MAX_TOKENS,
            },
            max_upload_bytes: max_upload_mb
                .checked_mul(1024 * 1024)
                .context("MAX_UPLOAD_MB is too large")?,
            session_idle: session_idle_minutes
                .checked_mul(60)
                .map(Duration::from_secs)
                .context("SESSION_IDLE_MINUTES is too large")?,
            port: var("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: var("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}
