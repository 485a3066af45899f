//! Anthropic API client implementation
//!
//! This module implements the LlmClient trait for the Anthropic messages API.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

use super::client::{BackendConfig, LlmClient, LlmError, http_client, send_json};

pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";

/// Anthropic API version
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic API client
pub struct AnthropicClient {
    client: Client,
    api_key: Option<String>,
    config: BackendConfig,
}

impl AnthropicClient {
    /// Create a new Anthropic client
    ///
    /// Reads the key from `config.api_key_env`; a missing key surfaces on first call
    pub fn new(config: BackendConfig) -> Result<Self, LlmError> {
        let api_key = config.api_key();
        Self::build(api_key, config)
    }

    /// Create a client with an explicit API key
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
        format!("{}/v1/messages", self.config.base_url.trim_end_matches('/'))
    }

    /// Build the request body for the Anthropic API
    fn build_request(&self, prompt: &str) -> Value {
        json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "messages": [{"role": "user", "content": prompt}]
        })
    }

    /// Join every text block of the response
    fn parse_response(body: &Value) -> Result<String, LlmError> {
        let blocks = body["content"]
            .as_array()
            .ok_or_else(|| LlmError::InvalidResponse("missing content array".to_string()))?;

        let texts: Vec<&str> = blocks
            .iter()
            .filter(|block| block["type"] == "text")
            .filter_map(|block| block["text"].as_str())
            .collect();

        if texts.is_empty() {
            return Err(LlmError::InvalidResponse("no text blocks in response".to_string()));
        }
        Ok(texts.join("\n"))
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let api_key = self.api_key.as_ref().ok_or_else(|| LlmError::MissingApiKey {
            env_var: self.config.api_key_env.clone(),
        })?;

        let request = self
            .client
            .post(self.endpoint())
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&self.build_request(prompt));
        let body = send_json(request).await?;
        Self::parse_response(&body)
    }

    fn name(&self) -> &str {
        "anthropic"
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

impl std::fmt::Debug for AnthropicClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicClient")
            .field("model", &self.config.model)
            .field("max_tokens", &self.config.max_tokens)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;
    use std::time::Duration;

    fn config(base_url: &str) -> BackendConfig {
        BackendConfig {
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
            base_url: base_url.to_string(),
            model: "claude-3-sonnet-20240229".to_string(),
            max_tokens: 1000,
            temperature: 0.1,
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_build_request() {
        let client = AnthropicClient::with_api_key("k", config(ANTHROPIC_BASE_URL)).unwrap();
        let body = client.build_request("Hello");
        assert_eq!(body["model"], "claude-3-sonnet-20240229");
        assert_eq!(body["max_tokens"], 1000);
        assert_eq!(body["messages"][0]["content"], "Hello");
    }

    #[test]
    fn test_parse_response_joins_text_blocks() {
        let body = json!({
            "content": [
                {"type": "text", "text": "Part one"},
                {"type": "tool_use", "id": "t1", "name": "x", "input": {}},
                {"type": "text", "text": "Part two"}
            ]
        });
        assert_eq!(AnthropicClient::parse_response(&body).unwrap(), "Part one\nPart two");
    }

    #[test]
    fn test_parse_response_without_text() {
        let err = AnthropicClient::parse_response(&json!({"content": []})).unwrap_err();
        assert!(matches!(err, LlmError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_complete_against_mock_server() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/messages")
            .match_header("x-api-key", "test-key")
            .match_header("anthropic-version", ANTHROPIC_VERSION)
            .with_status(200)
            .with_body(r#"{"content":[{"type":"text","text":"Looks good"}],"stop_reason":"end_turn"}"#)
            .create_async()
            .await;

        let client = AnthropicClient::with_api_key("test-key", config(&server.url())).unwrap();
        let text = client.complete("Review this").await.unwrap();

        mock.assert_async().await;
        assert_eq!(text, "Looks good");
    }

    #[test]
    fn test_debug_hides_key() {
        let client = AnthropicClient::with_api_key("secret-key", config(ANTHROPIC_BASE_URL)).unwrap();
        let debug = format!("{:?}", client);
        assert!(debug.contains("claude-3-sonnet"));
        assert!(!debug.contains("secret-key"));
    }
}
