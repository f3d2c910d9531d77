use anyhow::{Context, Result, anyhow};
use log::{LevelFilter, warn};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use url::Url;

use crate::prompts::PromptTemplate;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Environment variable overriding the remote proxy base URL
pub const API_BASE_URL_ENV: &str = "AISYLUM_API_BASE_URL";

/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// Remote proxy settings
    #[serde(default)]
    pub proxy: ProxyConfig,

    /// On-device model settings
    #[serde(default)]
    pub local_model: LocalModelConfig,

    /// Conversational defaults
    #[serde(default)]
    pub chat: ChatConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Remote proxy configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProxyConfig {
    /// Base URL the `/api/...` endpoints live under
    #[serde(default = "default_proxy_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_proxy_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            base_url: default_proxy_base_url(),
            timeout_secs: default_proxy_timeout_secs(),
        }
    }
}

/// Local model (Ollama) configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LocalModelConfig {
    /// Whether on-device capabilities are served by the local model
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Service endpoint URL
    #[serde(default = "default_ollama_endpoint")]
    pub endpoint: String,

    /// Model name (e.g., "llama3.2:3b")
    #[serde(default = "default_ollama_model")]
    pub model: String,

    /// Request timeout in seconds
    #[serde(default = "default_local_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LocalModelConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: default_ollama_endpoint(),
            model: default_ollama_model(),
            timeout_secs: default_local_timeout_secs(),
        }
    }
}

/// Chat configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChatConfig {
    /// System prompt of new conversations
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

fn default_proxy_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_proxy_timeout_secs() -> u64 {
    60
}

fn default_ollama_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3.2:3b".to_string()
}

fn default_local_timeout_secs() -> u64 {
    120
}

fn default_system_prompt() -> String {
    PromptTemplate::ASSISTANT.to_string()
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load the configuration at `path`, writing the defaults there when it does not exist
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            let file = File::open(path)
                .with_context(|| format!("Failed to open config file: {}", path.display()))?;
            let reader = BufReader::new(file);
            return serde_json::from_reader(reader)
                .with_context(|| format!("Failed to parse config file: {}", path.display()));
        }

        warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Config::default();
        config.save(path)?;
        Ok(config)
    }

    /// Write the configuration as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let config_json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write config to file: {}", path.display()))
    }

    /// Apply `AISYLUM_API_BASE_URL` when it is set and non-empty
    pub fn apply_env_overrides(&mut self) {
        if let Ok(base_url) = std::env::var(API_BASE_URL_ENV) {
            self.apply_base_url_override(&base_url);
        }
    }

    pub(crate) fn apply_base_url_override(&mut self, base_url: &str) {
        let base_url = base_url.trim();
        if !base_url.is_empty() {
            self.proxy.base_url = base_url.to_string();
        }
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        validate_http_url("proxy.base_url", &self.proxy.base_url)?;
        if self.proxy.timeout_secs == 0 {
            return Err(anyhow!("proxy.timeout_secs must be greater than zero"));
        }

        if self.local_model.enabled {
            validate_http_url("local_model.endpoint", &self.local_model.endpoint)?;
            if self.local_model.model.trim().is_empty() {
                return Err(anyhow!("local_model.model is required when the local model is enabled"));
            }
            if self.local_model.timeout_secs == 0 {
                return Err(anyhow!("local_model.timeout_secs must be greater than zero"));
            }
        }

        if self.chat.system_prompt.trim().is_empty() {
            return Err(anyhow!("chat.system_prompt must not be empty"));
        }

        Ok(())
    }
}

fn validate_http_url(field: &str, value: &str) -> Result<()> {
    let url = Url::parse(value).with_context(|| format!("{} is not a valid URL: {}", field, value))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(anyhow!("{} must use http or https, got {}", field, scheme)),
    }
}
