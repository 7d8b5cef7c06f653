//! Global Configuration (~/.causeway/config.toml)
//!
//! Handles user-level configuration stored in `~/.causeway/config.toml`.

use crate::bridge::OverrunPolicy;
use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Global user configuration from ~/.causeway/config.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct GlobalConfig {
    /// Default settings applied when the project config is silent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,
}

/// Default settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DefaultsConfig {
    /// Default overrun policy for read listeners
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overrun: Option<OverrunPolicy>,

    /// Default wrapped-object registry capacity
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy_capacity: Option<usize>,
}

impl GlobalConfig {
    /// Load global configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|error| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error,
        })
    }

    /// Path of the global config file (~/.causeway/config.toml)
    pub fn global_config_path() -> ConfigResult<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDirectory)?;
        Ok(home.join(".causeway").join("config.toml"))
    }
}
