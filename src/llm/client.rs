//! Core backend client types and trait definitions

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde_json::Value;

/// Stateless text-generation backend - each call is independent
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send the compiled prompt as a single user message, return the generated text
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;

    /// Provider name this client talks to
    fn name(&self) -> &str;

    /// Model identifier used for requests
    fn model(&self) -> &str;
}

/// Connection settings shared by the HTTP backends
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub api_key_env: String,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
}

impl BackendConfig {
    /// Read the API key from the configured environment variable
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env).ok().filter(|k| !k.is_empty())
    }
}

/// Errors that can occur during backend calls
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Missing API key: environment variable {env_var} not set")]
    MissingApiKey { env_var: String },
}

impl LlmError {
    /// Whether a caller-side retry could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::RateLimited { .. } => true,
            LlmError::ApiError { status, .. } => *status >= 500,
            LlmError::Network(_) => true,
            LlmError::InvalidResponse(_) => false,
            LlmError::MissingApiKey { .. } => false,
        }
    }
}

/// Build an HTTP client with the backend's timeout
pub(crate) fn http_client(config: &BackendConfig) -> Result<reqwest::Client, LlmError> {
    Ok(reqwest::Client::builder().timeout(config.timeout).build()?)
}

/// Send a JSON request and map HTTP-level failures onto [`LlmError`]
pub(crate) async fn send_json(request: RequestBuilder) -> Result<Value, LlmError> {
    let response = request.send().await.map_err(network)?;
    let status = response.status();

    if status.as_u16() == 429 {
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(60);
        return Err(LlmError::RateLimited {
            retry_after: Duration::from_secs(retry_after),
        });
    }

    if !status.is_success() {
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(LlmError::ApiError {
            status: status.as_u16(),
            message,
        });
    }

    response.json().await.map_err(network)
}

/// Drop the request URL so query strings never reach error text or logs
fn network(err: reqwest::Error) -> LlmError {
    LlmError::Network(err.without_url())
}

/// In-memory backend for tests: records prompts and returns a canned reply
#[derive(Debug)]
pub struct MockLlmClient {
    name: String,
    reply: Result<String, String>,
    delay: Option<Duration>,
    calls: Mutex<Vec<String>>,
}

impl Default for MockLlmClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self::replying("mock response")
    }

    pub fn replying(reply: impl Into<String>) -> Self {
        Self {
            name: "mock".to_string(),
            reply: Ok(reply.into()),
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A client whose every call fails with an API error carrying `message`
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            reply: Err(message.into()),
            ..Self::new()
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Prompts received so far, in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(prompt.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.reply.clone().map_err(|message| LlmError::ApiError { status: 500, message })
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        "mock-model"
    }
}
