use config::{Config as ConfigLoader, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use worldview_graph::{GraphConfig, LLMConfig};
use worldview_llm::{ProviderConfig, ProviderType};
use worldview_persist::StoreConfig;

const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub llm: LlmConfig,
    pub agent: AgentConfig,
    #[serde(default)]
    pub store: StoreConfig,
    pub logging: LoggingConfig,

    // Secrets (from ENV only)
    #[serde(default)]
    pub openai_api_key: String,
    #[serde(default)]
    pub azure_openai_api_key: String,
    #[serde(default)]
    pub mongodb_uri: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout() -> u64 {
    300
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub enabled: bool,
    pub origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: ProviderType,
    pub model: String,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    /// OpenAI-compatible endpoint override
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub azure_endpoint: Option<String>,
    #[serde(default)]
    pub azure_api_version: Option<String>,
}

impl From<LlmConfig> for LLMConfig {
    fn from(config: LlmConfig) -> Self {
        Self {
            model: config.model,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    pub turn_timeout_secs: u64,
    pub channel_capacity: usize,
    #[serde(default)]
    pub update_interval_ms: u64,
    pub keep_alive_secs: u64,
    #[serde(default)]
    pub system_prompt_path: Option<PathBuf>,
    #[serde(default)]
    pub user_prompt_path: Option<PathBuf>,
}

impl AgentConfig {
    pub fn graph_config(&self) -> GraphConfig {
        GraphConfig::new()
            .with_timeout(Duration::from_secs(self.turn_timeout_secs))
            .with_channel_capacity(self.channel_capacity)
            .with_update_interval(Duration::from_millis(self.update_interval_ms))
    }

    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs.max(1))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. built-in defaults, then config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set)
    /// 3. WORLDVIEW__SECTION__KEY environment variables
    /// 4. MODEL / TEMPERATURE shorthands
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let builder = ConfigLoader::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("WORLDVIEW")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        let mut cfg: Config = builder.build()?.try_deserialize()?;

        if let Ok(model) = std::env::var("MODEL") {
            if !model.trim().is_empty() {
                cfg.llm.model = model;
            }
        }
        if let Ok(temperature) = std::env::var("TEMPERATURE") {
            cfg.llm.temperature = Some(temperature.trim().parse().map_err(|_| {
                ConfigError::Message(format!("TEMPERATURE is not a number: {}", temperature))
            })?);
        }

        // Secrets from ENV (not in TOML)
        cfg.openai_api_key = std::env::var("OPENAI_API_KEY").unwrap_or_default();
        cfg.azure_openai_api_key = std::env::var("AZURE_OPENAI_API_KEY").unwrap_or_default();
        cfg.mongodb_uri = std::env::var("MONGODB_URI").ok();

        Ok(cfg)
    }

    /// Built-in defaults only
    pub fn defaults() -> Result<Self, ConfigError> {
        ConfigLoader::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    /// Provider settings for the chat client; fails when the key is missing
    pub fn provider(&self) -> Result<ProviderConfig, ConfigError> {
        match self.llm.provider {
            ProviderType::OpenAI => {
                if self.openai_api_key.is_empty() {
                    return Err(ConfigError::Message(
                        "OPENAI_API_KEY environment variable is required".to_string(),
                    ));
                }
                let mut provider = ProviderConfig::openai(self.openai_api_key.clone());
                if let (Some(base_url), worldview_llm::config::ProviderDetails::OpenAI(openai)) =
                    (&self.llm.base_url, &mut provider.details)
                {
                    openai.base_url = Some(base_url.clone());
                }
                Ok(provider)
            }
            ProviderType::AzureOpenAI => {
                if self.azure_openai_api_key.is_empty() {
                    return Err(ConfigError::Message(
                        "AZURE_OPENAI_API_KEY environment variable is required".to_string(),
                    ));
                }
                let endpoint = self.llm.azure_endpoint.clone().ok_or_else(|| {
                    ConfigError::Message("llm.azure_endpoint is required for azure_openai".to_string())
                })?;
                let api_version = self
                    .llm
                    .azure_api_version
                    .clone()
                    .unwrap_or_else(|| "2024-08-01-preview".to_string());
                Ok(ProviderConfig::azure_openai(
                    self.azure_openai_api_key.clone(),
                    endpoint,
                    api_version,
                ))
            }
        }
    }
}
