// Configuration management for hiedb

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File name looked up in a project directory
pub const CONFIG_FILE: &str = ".hiedb.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub names: NamesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NamesConfig {
    /// Modules pre-allocated in a fresh name cache
    pub initial_capacity: usize,
}

impl Default for NamesConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 256,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a directory, falling back to defaults
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Self {
        let config_path = dir.as_ref().join(CONFIG_FILE);

        match Self::from_file(&config_path) {
            Ok(config) => {
                tracing::info!("Loaded configuration from {}", config_path.display());
                config
            }
            Err(e) => {
                tracing::debug!("Could not load config from {}: {:#}", config_path.display(), e);
                tracing::info!("Using default configuration");
                Self::default()
            }
        }
    }

    /// A fresh name cache sized by `[names]`
    pub fn name_cache(&self) -> crate::names::SharedNameCache {
        crate::names::SharedNameCache::new(crate::names::NameCache::with_capacity(
            self.names.initial_capacity,
        ))
    }

    /// Validate configuration values
    pub fn validate(&self) -> anyhow::Result<()> {
        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(anyhow::anyhow!("Invalid log level: {}", self.logging.level));
        }
        let valid_formats = ["compact", "pretty", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(anyhow::anyhow!("Invalid log format: {}", self.logging.format));
        }

        if self.names.initial_capacity == 0 {
            return Err(anyhow::anyhow!("Name cache capacity must be greater than 0"));
        }

        Ok(())
    }
}
