//! Configuration management for vigil.
//!
//! Loads settings from /etc/vigil/config.toml or uses defaults, then
//! applies the environment overrides the service has always honored
//! (OLLAMA_URL, OLLAMA_MODEL, STRESS_THRESHOLD, LOG_LEVEL). All values
//! are read once at startup.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use tracing::{info, warn};

/// Config file path
pub const CONFIG_PATH: &str = "/etc/vigil/config.toml";

/// Default config file path for fallback
pub const DEFAULT_CONFIG_PATH: &str = "/var/lib/vigil/config.toml";

/// Generation service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Ollama generate endpoint
    #[serde(default = "default_generate_url")]
    pub url: String,

    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// Request deadline in seconds; the orchestrator imposes no other
    /// timeout on the generation call
    #[serde(default = "default_generate_timeout")]
    pub timeout_secs: u64,
}

fn default_generate_url() -> String {
    crate::llm::DEFAULT_GENERATE_URL.to_string()
}

fn default_model() -> String {
    crate::llm::DEFAULT_MODEL.to_string()
}

fn default_generate_timeout() -> u64 {
    120
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            url: default_generate_url(),
            model: default_model(),
            timeout_secs: default_generate_timeout(),
        }
    }
}

/// Alerting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertConfig {
    /// Stress-score cutoff at or above which an alert is written
    #[serde(default = "default_threshold")]
    pub stress_threshold: f64,
}

fn default_threshold() -> f64 {
    50.0
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            stress_threshold: default_threshold(),
        }
    }
}

/// Daemon configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Listen address for the HTTP server
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// SQLite database path
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Log verbosity (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_listen_addr() -> String {
    // Localhost only by default
    "127.0.0.1:7810".to_string()
}

fn default_db_path() -> String {
    "/var/lib/vigil/vigil.db".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            db_path: default_db_path(),
            log_level: default_log_level(),
        }
    }
}

/// Full service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub daemon: DaemonConfig,

    #[serde(default)]
    pub generation: GenerationConfig,

    #[serde(default)]
    pub alert: AlertConfig,
}

impl Config {
    /// Load config from file (or defaults), then apply env overrides.
    pub fn load() -> Self {
        let mut config = Self::load_from_path(CONFIG_PATH)
            .or_else(|_| Self::load_from_path(DEFAULT_CONFIG_PATH))
            .unwrap_or_else(|e| {
                warn!("Config not found, using defaults: {}", e);
                Config::default()
            });
        config.apply_env_overrides();
        config
    }

    /// Load config from specific path
    fn load_from_path(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!("Loaded config from {}", path);
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("OLLAMA_URL") {
            self.generation.url = url;
        }
        if let Ok(model) = std::env::var("OLLAMA_MODEL") {
            self.generation.model = model;
        }
        if let Ok(threshold) = std::env::var("STRESS_THRESHOLD") {
            match threshold.parse::<f64>() {
                Ok(value) => self.alert.stress_threshold = value,
                Err(_) => warn!("Ignoring non-numeric STRESS_THRESHOLD: {}", threshold),
            }
        }
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            self.daemon.log_level = level.to_lowercase();
        }
        if let Ok(path) = std::env::var("VIGIL_DB_PATH") {
            self.daemon.db_path = path;
        }
        if let Ok(addr) = std::env::var("VIGIL_ADDR") {
            self.daemon.listen_addr = addr;
        }
    }
}
