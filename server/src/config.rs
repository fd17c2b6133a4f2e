//! Application configuration storage
//!
//! Handles persistent storage of model-service settings and sandbox knobs.
//! The API key may come from the environment instead of the file, so the
//! file can be committed to dotfiles without leaking credentials.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

use crate::constants::{defaults, env_keys};

/// Sandbox evaluation knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxConfig {
    /// Watchdog timeout for evaluating a unit, in milliseconds.
    #[serde(default = "default_eval_timeout")]
    pub eval_timeout_ms: u64,
}

fn default_eval_timeout() -> u64 {
    defaults::EVAL_TIMEOUT_MS
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self { eval_timeout_ms: default_eval_timeout() }
    }
}

/// Full application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the model service. Environment variables win over this.
    pub api_key: Option<String>,
    /// OpenAI-compatible base URL of the model service.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model used for simple component requests.
    #[serde(default = "default_simple_model")]
    pub simple_model: String,
    /// Model used for full-application requests.
    #[serde(default = "default_complex_model")]
    pub complex_model: String,
    /// Address the HTTP facade binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default)]
    pub sandbox: SandboxConfig,
}

fn default_base_url() -> String {
    defaults::BASE_URL.to_string()
}

fn default_simple_model() -> String {
    defaults::SIMPLE_MODEL.to_string()
}

fn default_complex_model() -> String {
    defaults::COMPLEX_MODEL.to_string()
}

fn default_bind_addr() -> String {
    defaults::BIND_ADDR.to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            simple_model: default_simple_model(),
            complex_model: default_complex_model(),
            bind_addr: default_bind_addr(),
            sandbox: SandboxConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `<dir>/config.json`, falling back to defaults
    /// when the file does not exist.
    pub async fn load(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join("config.json");

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&config_path).await.map_err(ConfigError::Io)?;
        serde_json::from_str(&contents).map_err(ConfigError::Parse)
    }

    /// Save configuration to `<dir>/config.json`.
    pub async fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        fs::create_dir_all(config_dir).await.map_err(ConfigError::Io)?;

        let config_path = config_dir.join("config.json");
        let contents = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;

        fs::write(&config_path, contents).await.map_err(ConfigError::Io)?;
        log::info!("configuration saved to {:?}", config_path);
        Ok(())
    }

    /// The effective API key: environment first, then the config file.
    pub fn effective_api_key(&self) -> Option<String> {
        std::env::var(env_keys::API_KEY)
            .or_else(|_| std::env::var(env_keys::API_KEY_FALLBACK))
            .ok()
            .or_else(|| self.api_key.clone())
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(serde_json::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(serde_json::Error),
}
