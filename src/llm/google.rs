//! Google Gemini client (generateContent)

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

use super::client::{BackendConfig, LlmClient, LlmError, http_client, send_json};

pub const GOOGLE_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Gemini API client
pub struct GoogleClient {
    client: Client,
    api_key: Option<String>,
    config: BackendConfig,
}

impl GoogleClient {
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
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    fn build_request(&self, prompt: &str) -> Value {
        json!({
            "contents": [{"role": "user", "parts": [{"text": prompt}]}],
            "generationConfig": {
                "maxOutputTokens": self.config.max_tokens,
                "temperature": self.config.temperature
            }
        })
    }

    fn parse_response(body: &Value) -> Result<String, LlmError> {
        let parts = body["candidates"][0]["content"]["parts"]
            .as_array()
            .ok_or_else(|| LlmError::InvalidResponse("missing candidates[0].content.parts".to_string()))?;

        Ok(parts.iter().filter_map(|part| part["text"].as_str()).collect())
    }
}

#[async_trait]
impl LlmClient for GoogleClient {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let api_key = self.api_key.as_ref().ok_or_else(|| LlmError::MissingApiKey {
            env_var: self.config.api_key_env.clone(),
        })?;

        let request = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&self.build_request(prompt));
        let body = send_json(request).await?;
        Self::parse_response(&body)
    }

    fn name(&self) -> &str {
        "google"
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

impl std::fmt::Debug for GoogleClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleClient").field("model", &self.config.model).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;
    use std::time::Duration;

    fn config(base_url: &str) -> BackendConfig {
        BackendConfig {
            api_key_env: "GOOGLE_API_KEY".to_string(),
            base_url: base_url.to_string(),
            model: "gemini-pro".to_string(),
            max_tokens: 1000,
            temperature: 0.1,
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_endpoint_includes_model() {
        let client = GoogleClient::with_api_key("k", config(GOOGLE_BASE_URL)).unwrap();
        assert_eq!(
            client.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-pro:generateContent"
        );
    }

    #[test]
    fn test_parse_response_concatenates_parts() {
        let body = json!({"candidates": [{"content": {"parts": [{"text": "Hel"}, {"text": "lo"}]}}]});
        assert_eq!(GoogleClient::parse_response(&body).unwrap(), "Hello");
    }

    #[test]
    fn test_parse_response_blocked() {
        let body = json!({"promptFeedback": {"blockReason": "SAFETY"}});
        assert!(matches!(
            GoogleClient::parse_response(&body),
            Err(LlmError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_complete_against_mock_server() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1beta/models/gemini-pro:generateContent")
            .match_header("x-goog-api-key", "test-key")
            .with_status(200)
            .with_body(r#"{"candidates":[{"content":{"parts":[{"text":"Gemini says hi"}]}}]}"#)
            .create_async()
            .await;

        let client = GoogleClient::with_api_key("test-key", config(&server.url())).unwrap();
        let text = client.complete("Hi").await.unwrap();

        mock.assert_async().await;
        assert_eq!(text, "Gemini says hi");
    }

    #[tokio::test]
    async fn test_network_error_hides_api_key() {
        let mut cfg = config("http://127.0.0.1:1");
        cfg.timeout = Duration::from_secs(2);
        let client = GoogleClient::with_api_key("SUPERSECRET123", cfg).unwrap();

        let err = client.complete("Hi").await.unwrap_err();
        assert!(matches!(err, LlmError::Network(_)));
        assert!(!err.to_string().contains("SUPERSECRET123"));
        assert!(!format!("{:?}", err).contains("SUPERSECRET123"));
    }
}
