//! Configuration management
//!
//! Everything here is read once at startup and never mutated afterwards.
//! Values come from `config.toml` (optional) with `HUB_FILES__*`
//! environment overrides layered on top.

use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

const CONFIG_FILE: &str = "config";
const ENV_PREFIX: &str = "HUB_FILES";

/// Complete service configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub server: NetworkConfig,
    pub files: FilesConfig,
    pub hub: HubConfig,
}

/// Listener settings
#[derive(Debug, Deserialize, Clone)]
pub struct NetworkConfig {
    pub bind_address: String,
    pub port: u16,
}

/// File tool settings
#[derive(Debug, Deserialize, Clone)]
pub struct FilesConfig {
    /// Root every relative path is confined to
    pub base_directory: String,

    /// Upper bound applied to caller-supplied tree depths
    pub max_tree_depth: usize,

    /// Maximum entries returned by one search
    pub max_search_results: usize,

    /// Maximum line numbers reported per file by content search
    pub max_line_matches: usize,
}

/// Connection settings for the home-automation hub
#[derive(Debug, Deserialize, Clone)]
pub struct HubConfig {
    pub url: Option<String>,
    pub token: Option<String>,
    pub request_timeout_secs: u64,
}

impl ServerConfig {
    /// Load configuration from config.toml with environment overrides
    pub fn load() -> Result<Self, config::ConfigError> {
        let settings = Self::builder()?
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        let config: ServerConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults only, with the given base directory. Used by tests and
    /// embedders that build their own configuration.
    pub fn with_base_directory(
        base_directory: impl Into<PathBuf>,
    ) -> Result<Self, config::ConfigError> {
        let base = base_directory.into();
        let settings = Self::builder()?
            .set_override("files.base_directory", base.to_string_lossy().to_string())?
            .build()?;

        let config: ServerConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn builder()
    -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError> {
        Config::builder()
            .set_default("server.bind_address", "127.0.0.1")?
            .set_default("server.port", 8099_i64)?
            .set_default("files.base_directory", "/config")?
            .set_default("files.max_tree_depth", 10_i64)?
            .set_default("files.max_search_results", 500_i64)?
            .set_default("files.max_line_matches", 10_i64)?
            .set_default("hub.request_timeout_secs", 30_i64)
    }

    /// Validation for all configuration values
    fn validate(&self) -> Result<(), config::ConfigError> {
        if self.server.port == 0 {
            return Err(config::ConfigError::Message("server.port cannot be 0".into()));
        }

        if self.files.base_directory.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "files.base_directory cannot be empty".into(),
            ));
        }

        if self.files.max_tree_depth == 0
            || self.files.max_search_results == 0
            || self.files.max_line_matches == 0
        {
            return Err(config::ConfigError::Message(
                "files limits must be greater than 0".into(),
            ));
        }

        if self.hub.request_timeout_secs == 0 {
            return Err(config::ConfigError::Message(
                "hub.request_timeout_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }
}

impl NetworkConfig {
    /// Bind address and port as a socket address string
    pub fn socket(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

impl FilesConfig {
    pub fn base_directory_path(&self) -> PathBuf {
        PathBuf::from(&self.base_directory)
    }
}

impl HubConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
