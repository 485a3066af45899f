use eyre::{Context, Result};
use promptstudio::Provider;
use promptstudio::llm::{ANTHROPIC_BASE_URL, BackendConfig, GOOGLE_BASE_URL, OPENAI_BASE_URL};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    pub log_level: Option<String>,
    pub prompts_dir: PathBuf,
    pub default_provider: String,
    pub llm: LlmConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LlmConfig {
    pub timeout_ms: u64,
    pub openai: ProviderConfig,
    pub anthropic: ProviderConfig,
    pub google: ProviderConfig,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 60_000,
            openai: ProviderConfig::new("OPENAI_API_KEY", OPENAI_BASE_URL, "gpt-4"),
            anthropic: ProviderConfig::new("ANTHROPIC_API_KEY", ANTHROPIC_BASE_URL, "claude-3-sonnet-20240229"),
            google: ProviderConfig::new("GOOGLE_API_KEY", GOOGLE_BASE_URL, "gemini-pro"),
        }
    }
}

impl LlmConfig {
    /// A partially written provider section keeps the built-in key env, URL and model
    fn fill_blanks(&mut self) {
        let defaults = Self::default();
        for (section, fallback) in [
            (&mut self.openai, defaults.openai),
            (&mut self.anthropic, defaults.anthropic),
            (&mut self.google, defaults.google),
        ] {
            if section.api_key_env.is_empty() {
                section.api_key_env = fallback.api_key_env;
            }
            if section.base_url.is_empty() {
                section.base_url = fallback.base_url;
            }
            if section.model.is_empty() {
                section.model = fallback.model;
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ProviderConfig {
    pub api_key_env: String,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl ProviderConfig {
    fn new(api_key_env: &str, base_url: &str, model: &str) -> Self {
        Self {
            api_key_env: api_key_env.to_string(),
            base_url: base_url.to_string(),
            model: model.to_string(),
            ..Default::default()
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key_env: String::new(),
            base_url: String::new(),
            model: String::new(),
            max_tokens: 1000,
            temperature: 0.1,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            prompts_dir: PathBuf::from("prompt-templates"),
            default_provider: Provider::OpenAi.to_string(),
            llm: LlmConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        let project_name = env!("CARGO_PKG_NAME");

        // Try project config: ./<project>.yml
        let project_config = PathBuf::from(format!("{}.yml", project_name));
        if project_config.exists() {
            match Self::load_from_file(&project_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", project_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/<project>/<project>.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let mut config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        config.llm.fill_blanks();
        config.validate()?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.llm.timeout_ms == 0 {
            eyre::bail!("llm.timeout-ms must be > 0");
        }
        for provider in Provider::ALL {
            if self.provider(provider).max_tokens == 0 {
                eyre::bail!("llm.{}.max-tokens must be > 0", provider);
            }
        }
        self.default_provider
            .parse::<Provider>()
            .map_err(|e| eyre::eyre!("default-provider: {}", e))?;
        Ok(())
    }

    pub fn provider(&self, provider: Provider) -> &ProviderConfig {
        match provider {
            Provider::OpenAi => &self.llm.openai,
            Provider::Anthropic => &self.llm.anthropic,
            Provider::Google => &self.llm.google,
        }
    }

    /// Connection settings for one backend
    pub fn backend_config(&self, provider: Provider) -> BackendConfig {
        let p = self.provider(provider);
        BackendConfig {
            api_key_env: p.api_key_env.clone(),
            base_url: p.base_url.clone(),
            model: p.model.clone(),
            max_tokens: p.max_tokens,
            temperature: p.temperature,
            timeout: Duration::from_millis(self.llm.timeout_ms),
        }
    }
}
