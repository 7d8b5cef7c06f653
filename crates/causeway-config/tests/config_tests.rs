//! Configuration loading and precedence tests

use causeway_config::{ConfigLoader, OverrunPolicy};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serial_test::serial;
use std::env;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn create_config_file(dir: &Path, content: &str) -> std::path::PathBuf {
    let config_path = dir.join("causeway.toml");
    fs::write(&config_path, content).unwrap();
    config_path
}

// ============================================================================
// Config Loading Tests
// ============================================================================

#[test]
#[serial]
fn test_load_project_config_basic() {
    let temp_dir = TempDir::new().unwrap();
    let content = r#"
[dispatch]
overrun = "zero"
"#;
    create_config_file(temp_dir.path(), content);

    let mut loader = ConfigLoader::new();
    let config = loader.load_from_directory(temp_dir.path()).unwrap();

    assert!(config.is_project());
    assert_eq!(config.settings().overrun, OverrunPolicy::Zero);
}

#[test]
#[serial]
fn test_load_when_no_config_exists() {
    let temp_dir = TempDir::new().unwrap();

    let mut loader = ConfigLoader::new();
    let config = loader.load_from_directory(temp_dir.path()).unwrap();

    assert!(!config.is_project());
    assert_eq!(config.settings(), causeway_config::Settings::default());
}

#[test]
#[serial]
fn test_load_from_subdirectory_finds_parent() {
    let temp_dir = TempDir::new().unwrap();
    let content = r#"
[registry]
proxy_capacity = 32
"#;
    create_config_file(temp_dir.path(), content);

    let sub = temp_dir.path().join("sub1").join("sub2");
    fs::create_dir_all(&sub).unwrap();

    let mut loader = ConfigLoader::new();
    let config = loader.load_from_directory(&sub).unwrap();

    assert!(config.is_project());
    assert_eq!(config.settings().proxy_capacity, 32);
}

#[test]
#[serial]
fn test_load_from_file_directly() {
    let temp_dir = TempDir::new().unwrap();
    let path = create_config_file(
        temp_dir.path(),
        r#"
[dispatch]
overrun = "clamp"

[registry]
proxy_capacity = 8
"#,
    );

    let mut loader = ConfigLoader::new();
    let config = loader.load_from_file(&path).unwrap();

    let settings = config.settings();
    assert_eq!(settings.overrun, OverrunPolicy::Clamp);
    assert_eq!(settings.proxy_capacity, 8);
}

#[test]
#[serial]
fn test_invalid_toml_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    create_config_file(temp_dir.path(), "[dispatch\noverrun = ");

    let mut loader = ConfigLoader::new();
    let result = loader.load_from_directory(temp_dir.path());

    assert!(result.is_err());
}

// ============================================================================
// Environment Override Tests
// ============================================================================

#[rstest]
#[case("clamp", OverrunPolicy::Clamp)]
#[case("zero", OverrunPolicy::Zero)]
#[serial]
fn test_env_accepts_each_policy(#[case] raw: &str, #[case] expected: OverrunPolicy) {
    let temp_dir = TempDir::new().unwrap();

    env::set_var("CAUSEWAY_OVERRUN", raw);
    let mut loader = ConfigLoader::new();
    let result = loader.load_from_directory(temp_dir.path());
    env::remove_var("CAUSEWAY_OVERRUN");

    assert_eq!(result.unwrap().settings().overrun, expected);
}

#[test]
#[serial]
fn test_env_overrides_project_config() {
    let temp_dir = TempDir::new().unwrap();
    create_config_file(
        temp_dir.path(),
        r#"
[dispatch]
overrun = "clamp"
"#,
    );

    env::set_var("CAUSEWAY_OVERRUN", "zero");
    let mut loader = ConfigLoader::new();
    let result = loader.load_from_directory(temp_dir.path());
    env::remove_var("CAUSEWAY_OVERRUN");

    assert_eq!(result.unwrap().settings().overrun, OverrunPolicy::Zero);
}

#[test]
#[serial]
fn test_env_proxy_capacity_override() {
    let temp_dir = TempDir::new().unwrap();

    env::set_var("CAUSEWAY_PROXY_CAPACITY", "16");
    let mut loader = ConfigLoader::new();
    let result = loader.load_from_directory(temp_dir.path());
    env::remove_var("CAUSEWAY_PROXY_CAPACITY");

    assert_eq!(result.unwrap().settings().proxy_capacity, 16);
}

#[test]
#[serial]
fn test_invalid_env_value_is_rejected() {
    let temp_dir = TempDir::new().unwrap();

    env::set_var("CAUSEWAY_OVERRUN", "truncate");
    let mut loader = ConfigLoader::new();
    let result = loader.load_from_directory(temp_dir.path());
    env::remove_var("CAUSEWAY_OVERRUN");

    assert!(result.is_err());
}

#[test]
#[serial]
fn test_invalid_env_capacity_is_rejected() {
    let temp_dir = TempDir::new().unwrap();

    env::set_var("CAUSEWAY_PROXY_CAPACITY", "lots");
    let mut loader = ConfigLoader::new();
    let result = loader.load_from_directory(temp_dir.path());
    env::remove_var("CAUSEWAY_PROXY_CAPACITY");

    assert!(result.is_err());
}
