//! Configuration management for the accweb profile manager.
//!
//! This module handles loading, validation, and overriding of the TOML
//! configuration file, the `ACCWEB_CONFIG_PATH` environment variable, and
//! command-line arguments.

use anyhow::Result;
use profile_registry::{DocumentStore, SlotMode};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

use crate::cli::Args;

/// Environment variable naming the profile root directory.
pub const ROOT_ENV_VAR: &str = "ACCWEB_CONFIG_PATH";

/// Application configuration loaded from TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Profile storage settings
    pub profiles: ProfileSettings,
    /// Logging configuration settings
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Where profiles live and which documents each must carry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileSettings {
    /// Directory holding one sub-directory per profile
    pub root: String,
    /// Deployment mode: "basic" (configuration, settings, event) or
    /// "extended" (all seven documents)
    #[serde(default)]
    pub mode: SlotMode,
}

/// Logging system configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level filter (trace, debug, info, warn, error)
    pub level: String,
    /// Whether to output logs in JSON format
    #[serde(default)]
    pub json_format: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            profiles: ProfileSettings {
                root: "config".to_string(),
                mode: SlotMode::Extended,
            },
            logging: LoggingSettings::default(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file.
    ///
    /// If the file doesn't exist, creates a default configuration file at the
    /// specified path and returns the default configuration.
    pub async fn load_from_file(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = tokio::fs::read_to_string(path).await?;
            match toml::from_str::<AppConfig>(&content) {
                Ok(config) => Ok(config),
                Err(e) => {
                    warn!("Failed to parse config file {}: {}", path.display(), e);
                    Err(e.into())
                }
            }
        } else {
            let default_config = AppConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)?;
            tokio::fs::write(path, toml_content).await?;
            info!("Created default configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    /// Applies the environment root and command-line overrides, in that
    /// order, so flags win over the environment and both win over the file.
    pub fn apply_overrides(&mut self, env_root: Option<String>, args: &Args) {
        if let Some(root) = env_root.filter(|root| !root.is_empty()) {
            self.profiles.root = root;
        }

        if let Some(root) = &args.root {
            self.profiles.root = root.to_string_lossy().to_string();
        }

        if let Some(mode) = args.mode {
            self.profiles.mode = mode;
        }

        if let Some(level) = &args.log_level {
            self.logging.level = level.clone();
        }

        if args.json_logs {
            self.logging.json_format = true;
        }
    }

    /// Document store over the configured root.
    pub fn document_store(&self) -> DocumentStore {
        DocumentStore::new(&self.profiles.root)
    }

    /// Validates the configuration for consistency and correctness.
    pub fn validate(&self) -> Result<(), String> {
        if self.profiles.root.trim().is_empty() {
            return Err("Profile root directory cannot be empty".to_string());
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(format!(
                "Invalid log level: {}. Must be one of: {valid_levels:?}",
                &self.logging.level
            ));
        }

        Ok(())
    }
}
