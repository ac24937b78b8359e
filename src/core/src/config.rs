use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{LayerkitError, Result};

/// Environment variable naming an alternate configuration file.
pub const CONFIG_ENV: &str = "LAYERKIT_CONFIG";

/// layerkit configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerkitConfig {
    /// Registry that bare image names are pulled from
    pub registry_url: String,

    /// External image tools
    pub toolchain: ToolchainConfig,

    /// Name of the directory holding image control data (metadata.yaml)
    pub control_data_dir: String,

    /// Log level
    pub log_level: LogLevel,
}

impl Default for LayerkitConfig {
    fn default() -> Self {
        Self {
            registry_url: "public.ecr.aws/ubuntu".to_string(),
            toolchain: ToolchainConfig::default(),
            control_data_dir: ".rock".to_string(),
            log_level: LogLevel::Warn,
        }
    }
}

impl LayerkitConfig {
    /// Load configuration from `$LAYERKIT_CONFIG`, `~/.layerkit/config.yaml`,
    /// or fall back to defaults.
    ///
    /// A missing file yields the defaults; a file that exists but cannot be
    /// parsed is an error.
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific YAML file.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            LayerkitError::ConfigError(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        serde_yaml::from_str(&content).map_err(|e| {
            LayerkitError::ConfigError(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Path of the configuration file that `load` reads.
    pub fn default_path() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Some(PathBuf::from(path));
        }
        dirs::home_dir().map(|h| h.join(".layerkit").join("config.yaml"))
    }
}

/// Program names (or paths) of the external image tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
    /// Image copy/inspect tool
    pub skopeo: String,

    /// OCI layout manipulation tool
    pub umoci: String,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            skopeo: "skopeo".to_string(),
            umoci: "umoci".to_string(),
        }
    }
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}
