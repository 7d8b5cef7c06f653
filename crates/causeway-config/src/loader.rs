//! Configuration Loader
//!
//! Handles loading and merging configuration from multiple sources with proper
//! precedence.

use crate::bridge::{BridgeConfig, OverrunPolicy};
use crate::global::GlobalConfig;
use crate::{ConfigError, ConfigResult};
use std::env;
use std::path::{Path, PathBuf};

/// Default wrapped-object registry capacity
pub const DEFAULT_PROXY_CAPACITY: usize = 4096;

/// Configuration loader
///
/// Loads configuration from multiple sources and merges them with proper
/// precedence:
/// 1. Global config (~/.causeway/config.toml) - lowest priority
/// 2. Project config (./causeway.toml) - overrides global
/// 3. Environment variables (CAUSEWAY_*) - highest priority
pub struct ConfigLoader {
    /// Cached global config path
    global_config_path: Option<PathBuf>,
}

/// Merged configuration result
#[derive(Debug, Clone)]
pub struct Config {
    /// Project configuration
    pub bridge: BridgeConfig,

    /// Global configuration
    pub global: GlobalConfig,

    /// Project root directory (where causeway.toml was found)
    pub project_root: Option<PathBuf>,
}

/// Resolved settings handed to the bridge runtime.
///
/// Collapses the config hierarchy into the two knobs the bridge consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    /// Policy when a read listener claims more bytes than delivered
    pub overrun: OverrunPolicy,
    /// Maximum number of live wrapped objects
    pub proxy_capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            overrun: OverrunPolicy::default(),
            proxy_capacity: DEFAULT_PROXY_CAPACITY,
        }
    }
}

impl Config {
    /// True if a causeway.toml was found
    pub fn is_project(&self) -> bool {
        self.project_root.is_some()
    }

    /// Resolve the effective settings (project > global > built-in default)
    pub fn settings(&self) -> Settings {
        let defaults = self.global.defaults.as_ref();

        let overrun = self
            .bridge
            .dispatch
            .as_ref()
            .and_then(|d| d.overrun)
            .or_else(|| defaults.and_then(|d| d.overrun))
            .unwrap_or_default();

        let proxy_capacity = self
            .bridge
            .registry
            .as_ref()
            .and_then(|r| r.proxy_capacity)
            .or_else(|| defaults.and_then(|d| d.proxy_capacity))
            .unwrap_or(DEFAULT_PROXY_CAPACITY);

        Settings {
            overrun,
            proxy_capacity,
        }
    }
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self {
            global_config_path: None,
        }
    }

    /// Load configuration starting from the given directory
    ///
    /// Walks up the directory tree to find causeway.toml, then loads and merges
    /// global config if it exists.
    pub fn load_from_directory(&mut self, start_dir: &Path) -> ConfigResult<Config> {
        let (project_root, bridge_config) = self.find_project_config(start_dir)?;
        let global_config = self.load_global_config().unwrap_or_default();
        let bridge_config = apply_env_overrides(bridge_config)?;

        Ok(Config {
            bridge: bridge_config,
            global: global_config,
            project_root,
        })
    }

    /// Load configuration from a specific project config file
    pub fn load_from_file(&mut self, config_path: &Path) -> ConfigResult<Config> {
        let bridge_config = BridgeConfig::load_from_file(config_path)?;
        let global_config = self.load_global_config().unwrap_or_default();
        let bridge_config = apply_env_overrides(bridge_config)?;

        let project_root = config_path.parent().map(|p| p.to_path_buf());

        Ok(Config {
            bridge: bridge_config,
            global: global_config,
            project_root,
        })
    }

    /// Find project configuration by walking up the directory tree
    ///
    /// Returns (project_root, bridge_config) or defaults if no causeway.toml
    /// exists anywhere above `start_dir`.
    fn find_project_config(
        &self,
        start_dir: &Path,
    ) -> ConfigResult<(Option<PathBuf>, BridgeConfig)> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join("causeway.toml");

            if config_path.exists() {
                let bridge_config = BridgeConfig::load_from_file(&config_path)?;
                return Ok((Some(current), bridge_config));
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Ok((None, BridgeConfig::default())),
            }
        }
    }

    /// Load global configuration from ~/.causeway/config.toml
    fn load_global_config(&mut self) -> ConfigResult<GlobalConfig> {
        if self.global_config_path.is_none() {
            self.global_config_path = Some(GlobalConfig::global_config_path()?);
        }

        let path = self.global_config_path.as_ref().unwrap();

        // Global config is optional
        if !path.exists() {
            return Ok(GlobalConfig::default());
        }

        GlobalConfig::load_from_file(path)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply CAUSEWAY_* environment variable overrides to a project config
fn apply_env_overrides(mut config: BridgeConfig) -> ConfigResult<BridgeConfig> {
    if let Ok(value) = env::var("CAUSEWAY_OVERRUN") {
        let policy = match value.as_str() {
            "clamp" => OverrunPolicy::Clamp,
            "zero" => OverrunPolicy::Zero,
            other => {
                return Err(ConfigError::InvalidValue {
                    field: "CAUSEWAY_OVERRUN".to_string(),
                    reason: format!("expected 'clamp' or 'zero', got '{other}'"),
                })
            }
        };
        config.dispatch.get_or_insert_with(Default::default).overrun = Some(policy);
    }

    if let Ok(value) = env::var("CAUSEWAY_PROXY_CAPACITY") {
        let capacity: usize = value.parse().map_err(|_| ConfigError::InvalidValue {
            field: "CAUSEWAY_PROXY_CAPACITY".to_string(),
            reason: format!("expected an unsigned integer, got '{value}'"),
        })?;
        config
            .registry
            .get_or_insert_with(Default::default)
            .proxy_capacity = Some(capacity);
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.overrun, OverrunPolicy::Clamp);
        assert_eq!(settings.proxy_capacity, DEFAULT_PROXY_CAPACITY);
    }

    #[test]
    fn test_settings_project_overrides_global() {
        let config = Config {
            bridge: BridgeConfig {
                dispatch: Some(crate::bridge::DispatchConfig {
                    overrun: Some(OverrunPolicy::Zero),
                }),
                registry: None,
            },
            global: GlobalConfig {
                defaults: Some(crate::global::DefaultsConfig {
                    overrun: Some(OverrunPolicy::Clamp),
                    proxy_capacity: Some(99),
                }),
            },
            project_root: None,
        };

        let settings = config.settings();
        assert_eq!(settings.overrun, OverrunPolicy::Zero);
        assert_eq!(settings.proxy_capacity, 99);
    }
}
