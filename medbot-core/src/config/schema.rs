//! Configuration schema definitions

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Root configuration for medbot
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Remote chat server
    #[serde(default)]
    pub server: ServerConfig,
    /// Identifier storage
    #[serde(default)]
    pub storage: StorageConfig,
    /// Transcript rendering
    #[serde(default)]
    pub ui: UiConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Remote chat server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Scheme, host and port of the chat server
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Path of the chat endpoint
    #[serde(default = "default_chat_path")]
    pub chat_path: String,
    /// Path of the health endpoint
    #[serde(default = "default_health_path")]
    pub health_path: String,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_chat_path() -> String {
    "/chat".to_string()
}

fn default_health_path() -> String {
    "/health".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            chat_path: default_chat_path(),
            health_path: default_health_path(),
        }
    }
}

impl ServerConfig {
    /// Full URL of the chat endpoint
    pub fn chat_url(&self) -> String {
        join_url(&self.base_url, &self.chat_path)
    }

    /// Full URL of the health endpoint
    pub fn health_url(&self) -> String {
        join_url(&self.base_url, &self.health_path)
    }

    /// Full URL of the condition catalogue
    pub fn conditions_url(&self) -> String {
        join_url(&self.base_url, "/conditions")
    }

    /// Full URL of the remedies for one condition
    pub fn remedies_url(&self, condition_id: i64) -> String {
        join_url(&self.base_url, &format!("/remedies/{}", condition_id))
    }

    /// Full URL of the feedback endpoint
    pub fn feedback_url(&self) -> String {
        join_url(&self.base_url, "/feedback")
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

/// Identifier storage configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// Storage file; defaults to `storage.json` inside the config directory
    #[serde(default)]
    pub path: Option<String>,
}

impl StorageConfig {
    /// Resolve the storage file against the config directory
    pub fn resolve_path(&self, config_dir: &std::path::Path) -> PathBuf {
        match &self.path {
            Some(path) if !path.trim().is_empty() => expand_tilde(path),
            _ => config_dir.join("storage.json"),
        }
    }
}

/// Transcript rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UiConfig {
    /// Strip markup from bot replies instead of interpreting line-break tags
    #[serde(default)]
    pub sanitize_bot_markup: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (text, json)
    #[serde(default = "default_log_format")]
    pub format: String,
    /// Directory for log files
    #[serde(default = "default_log_dir")]
    pub dir: String,
    /// Module-specific overrides
    #[serde(default)]
    pub overrides: HashMap<String, String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_log_dir() -> String {
    "~/.medbot/logs".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            dir: default_log_dir(),
            overrides: HashMap::new(),
        }
    }
}

/// Expand a leading `~/` to the home directory
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
