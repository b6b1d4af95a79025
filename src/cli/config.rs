//! Configuration management for Chabunhae
//!
//! Provides TOML-based configuration with defaults and validation.
//! Location: ~/.chabunhae/config.toml, overlaid by environment variables.
//! The API key is only ever taken from the environment.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::{RagError, Result};

pub const ENV_ENDPOINT: &str = "AZURE_OPENAI_ENDPOINT";
pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_API_VERSION: &str = "AZURE_OPENAI_API_VERSION";
pub const ENV_EMBEDDING_DEPLOYMENT: &str = "AZURE_OPENAI_EMBEDDING_DEPLOYMENT";
pub const ENV_CHAT_DEPLOYMENT: &str = "AZURE_OPENAI_CHAT_DEPLOYMENT";
pub const ENV_STORE: &str = "CHABUNHAE_STORE";

/// Complete configuration for Chabunhae
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub azure: AzureConfig,
    pub retrieval: RetrievalConfig,
    pub store: StoreConfig,
    pub crawl: CrawlConfig,
    pub logging: LoggingConfig,
}

/// Azure OpenAI connection shared by the embedding and chat deployments
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AzureConfig {
    pub endpoint: String,
    #[serde(skip)]
    pub api_key: Option<String>,
    pub api_version: String,
    pub embedding_deployment: String,
    pub chat_deployment: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub timeout_secs: u64,
}

/// Retrieval parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
    pub embed_batch_size: usize,
}

/// Record file location
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: PathBuf,
}

/// Accident page crawl settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    pub base_url: String,
    pub chart_type: u32,
    pub first_page: u32,
    pub last_page: u32,
    pub max_sub_pages: u32,
    pub delay_ms: u64,
    pub timeout_secs: u64,
    pub accept_invalid_certs: bool,
}

/// Log output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for AzureConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: None,
            api_version: "2024-02-01".to_string(),
            embedding_deployment: "text-embedding-3-small".to_string(),
            chat_deployment: "gpt-4o-mini".to_string(),
            temperature: 0.3,
            max_tokens: None,
            timeout_secs: 60,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 4,
            embed_batch_size: 16,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("accident_data_a.json"),
        }
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            base_url: "https://accident.knia.or.kr/myaccident-content".to_string(),
            chart_type: 1,
            first_page: 1,
            last_page: 61,
            max_sub_pages: 100,
            delay_ms: 1000,
            timeout_secs: 30,
            accept_invalid_certs: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file or defaults, then apply environment overrides
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let mut config = if let Some(config_path) = path {
            Self::load_from_file(&config_path)?
        } else {
            Self::load_default()?
        };

        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| RagError::Config(format!("Failed to read config: {}", e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| RagError::Config(format!("Failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Load default configuration from standard location or use built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Some(config_path) = Self::default_path() {
            if config_path.exists() {
                return Self::load_from_file(&config_path);
            }
        }

        Ok(Config::default())
    }

    /// Standard config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".chabunhae").join("config.toml"))
    }

    /// Overlay values from the environment. Blank variables are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(endpoint) = get(ENV_ENDPOINT) {
            self.azure.endpoint = endpoint;
        }
        if let Some(key) = get(ENV_API_KEY) {
            self.azure.api_key = Some(key);
        }
        if let Some(version) = get(ENV_API_VERSION) {
            self.azure.api_version = version;
        }
        if let Some(deployment) = get(ENV_EMBEDDING_DEPLOYMENT) {
            self.azure.embedding_deployment = deployment;
        }
        if let Some(deployment) = get(ENV_CHAT_DEPLOYMENT) {
            self.azure.chat_deployment = deployment;
        }
        if let Some(store) = get(ENV_STORE) {
            self.store.path = PathBuf::from(store);
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.retrieval.top_k == 0 {
            return Err(RagError::Config(
                "retrieval.top_k must be greater than 0".to_string(),
            ));
        }

        if self.retrieval.embed_batch_size == 0 {
            return Err(RagError::Config(
                "retrieval.embed_batch_size must be greater than 0".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.azure.temperature) {
            return Err(RagError::Config(
                "azure.temperature must be between 0.0 and 2.0".to_string(),
            ));
        }

        if self.crawl.first_page == 0 || self.crawl.first_page > self.crawl.last_page {
            return Err(RagError::Config(format!(
                "Invalid crawl page range: {}..={}",
                self.crawl.first_page, self.crawl.last_page
            )));
        }

        match self.logging.level.to_lowercase().as_str() {
            "error" | "warn" | "info" | "debug" | "trace" => {}
            _ => {
                return Err(RagError::Config(format!(
                    "Invalid log level: {}",
                    self.logging.level
                )))
            }
        }

        Ok(())
    }

    /// Check that the settings needed to reach the hosted models are present
    pub fn require_credentials(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.azure.api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
            missing.push(ENV_API_KEY);
        }
        if self.azure.endpoint.trim().is_empty() {
            missing.push(ENV_ENDPOINT);
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(RagError::Config(format!(
                "Missing required environment variables: {}",
                missing.join(", ")
            )))
        }
    }

    /// TOML rendering with the API key masked
    pub fn to_display_string(&self) -> Result<String> {
        let mut rendered = toml::to_string_pretty(self)
            .map_err(|e| RagError::Config(format!("Failed to serialize config: {}", e)))?;
        let key_state = match &self.azure.api_key {
            Some(_) => "set",
            None => "not set",
        };
        rendered.push_str(&format!("\n# {}: {}\n", ENV_API_KEY, key_state));
        Ok(rendered)
    }
}
