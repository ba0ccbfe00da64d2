//! LLM client: the single point of entry for chat-completion calls.
//!
//! No other module may call the OpenAI API directly. Callers go through the
//! `ChatCompletion` trait so the remote service can be replaced in tests.
//!
//! One call per request: no retry, no streaming, no client-side timeout.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;

#[cfg(test)]
pub mod mock;

/// Coarse failure classes exposed to API clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Authentication,
    Quota,
    Network,
    MalformedResponse,
    Service,
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("no API key configured (set OPENAI_API_KEY)")]
    MissingApiKey,

    #[error("authentication failed (status {status}): {message}")]
    Authentication { status: u16, message: String },

    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("LLM returned empty content")]
    EmptyContent,
}

impl LlmError {
    pub fn kind(&self) -> FailureKind {
        match self {
            LlmError::MissingApiKey | LlmError::Authentication { .. } => {
                FailureKind::Authentication
            }
            LlmError::QuotaExceeded(_) | LlmError::RateLimited(_) => FailureKind::Quota,
            LlmError::Timeout(_) | LlmError::Network(_) => FailureKind::Network,
            LlmError::Malformed(_) | LlmError::EmptyContent => FailureKind::MalformedResponse,
            LlmError::Api { .. } => FailureKind::Service,
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout(e.to_string())
        } else if e.is_decode() {
            LlmError::Malformed(e.to_string())
        } else {
            LlmError::Network(e.to_string())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl ChatCompletionResponse {
    /// Extracts the message content of the first choice.
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiError {
    error: OpenAiErrorBody,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorBody {
    message: String,
    code: Option<String>,
}

/// A chat-completion backend: an ordered list of role-tagged messages in,
/// generated text out.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError>;
}

/// Wraps the OpenAI Chat Completions API.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: Option<String>,
    endpoint: String,
    model: String,
    max_tokens: u32,
}

impl LlmClient {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: Client::builder()
                .build()
                .context("Failed to build HTTP client")?,
            api_key: config.openai_api_key.clone(),
            endpoint: format!(
                "{}/chat/completions",
                config.openai_base_url.trim_end_matches('/')
            ),
            model: config.openai_model.clone(),
            max_tokens: config.format_max_tokens,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Makes one call to the chat-completion endpoint, returning the full response object.
    pub async fn call(&self, messages: &[ChatMessage]) -> Result<ChatCompletionResponse, LlmError> {
        let api_key = self.api_key.as_deref().ok_or(LlmError::MissingApiKey)?;

        let request_body = ChatCompletionRequest {
            model: &self.model,
            messages,
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("LLM API returned {}: {}", status, body);
            return Err(classify_failure(status, &body));
        }

        let completion: ChatCompletionResponse = response.json().await?;

        if let Some(usage) = &completion.usage {
            debug!(
                "LLM call succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        Ok(completion)
    }
}

#[async_trait]
impl ChatCompletion for LlmClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        let response = self.call(messages).await?;
        response
            .text()
            .map(str::to_string)
            .ok_or(LlmError::EmptyContent)
    }
}

/// Maps a non-success status and its body onto an `LlmError`.
fn classify_failure(status: StatusCode, body: &str) -> LlmError {
    let parsed = serde_json::from_str::<OpenAiError>(body).ok();
    let code = parsed.as_ref().and_then(|e| e.error.code.clone());
    let message = parsed
        .map(|e| e.error.message)
        .unwrap_or_else(|| body.to_string());

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LlmError::Authentication {
            status: status.as_u16(),
            message,
        },
        StatusCode::TOO_MANY_REQUESTS if code.as_deref() == Some("insufficient_quota") => {
            LlmError::QuotaExceeded(message)
        }
        StatusCode::TOO_MANY_REQUESTS => LlmError::RateLimited(message),
        _ => LlmError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::State,
        http::{HeaderMap, StatusCode},
        routing::post,
        Json, Router,
    };
    use serde_json::{json, Value};

    use super::*;

    #[derive(Clone)]
    struct Stub {
        status: StatusCode,
        body: String,
        seen: Arc<Mutex<Option<(Option<String>, Value)>>>,
    }

    async fn stub_handler(
        State(stub): State<Stub>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> (StatusCode, String) {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        *stub.seen.lock().unwrap() = Some((auth, body));
        (stub.status, stub.body.clone())
    }

    async fn spawn_stub(status: StatusCode, body: &str) -> (String, Stub) {
        let stub = Stub {
            status,
            body: body.to_string(),
            seen: Arc::new(Mutex::new(None)),
        };
        let app = Router::new()
            .route("/v1/chat/completions", post(stub_handler))
            .with_state(stub.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}/v1/"), stub)
    }

    fn client_for(base_url: &str, api_key: Option<&str>) -> LlmClient {
        let config = Config {
            openai_api_key: api_key.map(String::from),
            openai_base_url: base_url.to_string(),
            openai_model: "gpt-4".to_string(),
            format_max_tokens: 500,
            max_upload_bytes: 1024,
            session_idle: std::time::Duration::from_secs(60),
            port: 0,
            rust_log: "info".to_string(),
        };
        LlmClient::new(&config).unwrap()
    }

    fn messages() -> Vec<ChatMessage> {
        vec![ChatMessage::system("sys"), ChatMessage::user("hello")]
    }

    #[tokio::test]
    async fn test_success_returns_first_choice_and_sends_request_shape() {
        let body = json!({
            "choices": [{"message": {"role": "assistant", "content": "  Tidy notes.\n"}}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 3}
        })
        .to_string();
        let (base, stub) = spawn_stub(StatusCode::OK, &body).await;

        let text = client_for(&base, Some("sk-test"))
            .complete(&messages())
            .await
            .unwrap();
        assert_eq!(text, "  Tidy notes.\n");

        let (auth, sent) = stub.seen.lock().unwrap().clone().unwrap();
        assert_eq!(auth.as_deref(), Some("Bearer sk-test"));
        assert_eq!(sent["model"], "gpt-4");
        assert_eq!(sent["max_tokens"], 500);
        assert_eq!(sent["messages"][0]["role"], "system");
        assert_eq!(sent["messages"][1]["role"], "user");
        assert_eq!(sent["messages"][1]["content"], "hello");
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_before_sending() {
        let (base, stub) = spawn_stub(StatusCode::OK, "{}").await;
        let err = client_for(&base, None)
            .complete(&messages())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::MissingApiKey));
        assert_eq!(err.kind(), FailureKind::Authentication);
        assert!(stub.seen.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unauthorized_is_authentication_failure() {
        let body = json!({"error": {"message": "Incorrect API key provided", "code": "invalid_api_key"}})
            .to_string();
        let (base, _) = spawn_stub(StatusCode::UNAUTHORIZED, &body).await;
        let err = client_for(&base, Some("bad"))
            .complete(&messages())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::Authentication);
        assert!(err.to_string().contains("Incorrect API key provided"));
    }

    #[tokio::test]
    async fn test_insufficient_quota_is_quota_failure() {
        let body = json!({"error": {"message": "You exceeded your current quota", "code": "insufficient_quota"}})
            .to_string();
        let (base, _) = spawn_stub(StatusCode::TOO_MANY_REQUESTS, &body).await;
        let err = client_for(&base, Some("sk"))
            .complete(&messages())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::QuotaExceeded(_)));
        assert_eq!(err.kind(), FailureKind::Quota);
    }

    #[tokio::test]
    async fn test_plain_429_is_rate_limited() {
        let (base, _) = spawn_stub(StatusCode::TOO_MANY_REQUESTS, "slow down").await;
        let err = client_for(&base, Some("sk"))
            .complete(&messages())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::RateLimited(ref m) if m == "slow down"));
    }

    #[tokio::test]
    async fn test_server_error_is_service_failure() {
        let body = json!({"error": {"message": "The server had an error"}}).to_string();
        let (base, _) = spawn_stub(StatusCode::INTERNAL_SERVER_ERROR, &body).await;
        let err = client_for(&base, Some("sk"))
            .complete(&messages())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Api { status: 500, .. }));
        assert_eq!(err.kind(), FailureKind::Service);
    }

    #[tokio::test]
    async fn test_garbage_body_is_malformed() {
        let (base, _) = spawn_stub(StatusCode::OK, "<html>not json</html>").await;
        let err = client_for(&base, Some("sk"))
            .complete(&messages())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::MalformedResponse);
    }

    #[tokio::test]
    async fn test_no_choices_is_empty_content() {
        let (base, _) = spawn_stub(StatusCode::OK, r#"{"choices": []}"#).await;
        let err = client_for(&base, Some("sk"))
            .complete(&messages())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::EmptyContent));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_failure() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client_for(&format!("http://{addr}/v1"), Some("sk"))
            .complete(&messages())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::Network);
    }
}
