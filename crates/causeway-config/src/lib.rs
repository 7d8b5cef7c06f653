//! Causeway Configuration System
//!
//! Provides configuration management for hosts embedding the causeway bridge:
//! - Project configuration (causeway.toml)
//! - Global user configuration (~/.causeway/config.toml)
//! - Configuration precedence and merging
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded and merged in the following order (later overrides earlier):
//! 1. Global config (~/.causeway/config.toml)
//! 2. Project config (./causeway.toml)
//! 3. Environment variables (CAUSEWAY_*)
//!
//! # Example
//!
//! ```no_run
//! use causeway_config::ConfigLoader;
//! use std::path::Path;
//!
//! let mut loader = ConfigLoader::new();
//! let config = loader.load_from_directory(Path::new(".")).unwrap();
//! let settings = config.settings();
//! ```

pub mod bridge;
pub mod global;
pub mod loader;

use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax in {file}: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Could not determine home directory")]
    NoHomeDirectory,
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

pub use bridge::{BridgeConfig, DispatchConfig, OverrunPolicy, RegistryConfig};
pub use global::GlobalConfig;
pub use loader::{Config, ConfigLoader, Settings};
