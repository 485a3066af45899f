//! Provider Router - map a provider name onto a backend client
//!
//! The set of providers is a closed enum. Each variant maps to exactly one
//! backend instance held by [`ProviderRouter`]; unknown names are rejected.

use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{PromptError, Result};
use crate::llm::{AnthropicClient, BackendConfig, GoogleClient, LlmClient, LlmError, OpenAiClient};

/// Registered text-generation providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAi,
    Anthropic,
    Google,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::OpenAi, Provider::Anthropic, Provider::Google];

    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Anthropic => "anthropic",
            Provider::Google => "google",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Provider {
    type Err = PromptError;

    /// Case-insensitive; the error carries the name exactly as given
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAi),
            "anthropic" => Ok(Provider::Anthropic),
            "google" => Ok(Provider::Google),
            _ => Err(PromptError::UnsupportedProvider(s.to_string())),
        }
    }
}

/// One backend per provider
#[derive(Clone)]
pub struct ProviderRouter {
    openai: Arc<dyn LlmClient>,
    anthropic: Arc<dyn LlmClient>,
    google: Arc<dyn LlmClient>,
}

impl ProviderRouter {
    pub fn new(openai: Arc<dyn LlmClient>, anthropic: Arc<dyn LlmClient>, google: Arc<dyn LlmClient>) -> Self {
        Self {
            openai,
            anthropic,
            google,
        }
    }

    /// Build the HTTP backends from their connection settings
    pub fn from_configs(
        openai: BackendConfig,
        anthropic: BackendConfig,
        google: BackendConfig,
    ) -> std::result::Result<Self, LlmError> {
        Ok(Self::new(
            Arc::new(OpenAiClient::new(openai)?),
            Arc::new(AnthropicClient::new(anthropic)?),
            Arc::new(GoogleClient::new(google)?),
        ))
    }

    /// Backend registered for `provider`
    pub fn backend(&self, provider: Provider) -> Arc<dyn LlmClient> {
        match provider {
            Provider::OpenAi => Arc::clone(&self.openai),
            Provider::Anthropic => Arc::clone(&self.anthropic),
            Provider::Google => Arc::clone(&self.google),
        }
    }

    /// Resolve a caller-supplied provider name; no health checks are made
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn LlmClient>> {
        let provider: Provider = name.parse()?;
        Ok(self.backend(provider))
    }
}

impl std::fmt::Debug for ProviderRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRouter")
            .field("openai", &self.openai.model())
            .field("anthropic", &self.anthropic.model())
            .field("google", &self.google.model())
            .finish()
    }
}
