//! OpenAI chat completions client

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

use super::client::{BackendConfig, LlmClient, LlmError, http_client, send_json};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com";

/// OpenAI API client
pub struct OpenAiClient {
    client: Client,
    api_key: Option<String>,
    config: BackendConfig,
}

impl OpenAiClient {
    /// Create a client reading its key from `config.api_key_env`
    ///
    /// A missing key is not an error here; calls fail with `MissingApiKey`.
    pub fn new(config: BackendConfig) -> Result<Self, LlmError> {
        let api_key = config.api_key();
        Self::build(api_key, config)
    }

    pub fn with_api_key(api_key: impl Into<String>, config: BackendConfig) -> Result<Self, LlmError> {
        Self::build(Some(api_key.into()), config)
    }

    fn build(api_key: Option<String>, config: BackendConfig) -> Result<Self, LlmError> {
        Ok(Self {
            client: http_client(&config)?,
            api_key,
            config,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    fn build_request(&self, prompt: &str) -> Value {
        json!({
            "model": self.config.model,
            "messages": [{"role": "user", "content": prompt}],
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature
        })
    }

    fn parse_response(body: &Value) -> Result<String, LlmError> {
        body["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| LlmError::InvalidResponse("missing choices[0].message.content".to_string()))
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let api_key = self.api_key.as_ref().ok_or_else(|| LlmError::MissingApiKey {
            env_var: self.config.api_key_env.clone(),
        })?;

        let request = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&self.build_request(prompt));
        let body = send_json(request).await?;
        Self::parse_response(&body)
    }

    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("model", &self.config.model)
            .field("base_url", &self.config.base_url)
            .finish()
    }
}
