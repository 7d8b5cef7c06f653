//! Project Configuration (causeway.toml)
//!
//! Handles project-level bridge configuration stored in `causeway.toml` at the
//! project root.

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Project configuration from causeway.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct BridgeConfig {
    /// Dispatch behavior
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dispatch: Option<DispatchConfig>,

    /// Wrapped-object registry limits
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry: Option<RegistryConfig>,
}

/// Dispatch behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct DispatchConfig {
    /// Policy when a read listener claims more bytes than were delivered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overrun: Option<OverrunPolicy>,
}

/// Wrapped-object registry configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct RegistryConfig {
    /// Maximum number of live wrapped objects (default: 4096)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy_capacity: Option<usize>,
}

/// What to report to the engine when a read listener claims it consumed more
/// bytes than the event delivered. Either way the bridge raises a typed error;
/// the policy only governs the count handed back.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OverrunPolicy {
    /// Report the delivered length (claim clamped down)
    #[default]
    Clamp,
    /// Report zero bytes consumed
    Zero,
}

impl BridgeConfig {
    /// Load project configuration from a file
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
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[dispatch]
overrun = "zero"

[registry]
proxy_capacity = 128
"#;
        let config: BridgeConfig = toml::from_str(toml).unwrap();
        assert_eq!(
            config.dispatch.unwrap().overrun,
            Some(OverrunPolicy::Zero)
        );
        assert_eq!(config.registry.unwrap().proxy_capacity, Some(128));
    }

    #[test]
    fn test_parse_empty_config() {
        let config: BridgeConfig = toml::from_str("").unwrap();
        assert_eq!(config, BridgeConfig::default());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let toml = r#"
[dispatch]
overrun = "clamp"
retries = 3
"#;
        let result: Result<BridgeConfig, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_overrun_policy_default_is_clamp() {
        assert_eq!(OverrunPolicy::default(), OverrunPolicy::Clamp);
    }
}
