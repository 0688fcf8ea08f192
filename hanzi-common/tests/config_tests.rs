//! Tests for configuration loading and root folder resolution
//!
//! Tests that manipulate HANZI_ROOT_FOLDER are marked with #[serial] so they
//! do not race on the process environment.

use hanzi_common::config::{default_root_folder, resolve_root_folder, TomlConfig};
use serial_test::serial;
use std::env;
use std::path::PathBuf;

const ENV_VAR: &str = "HANZI_TEST_ROOT_FOLDER";

#[test]
#[serial]
fn test_cli_argument_wins() {
    env::set_var(ENV_VAR, "/tmp/from-env");
    let toml = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/from-toml")),
        ..Default::default()
    };

    let resolved = resolve_root_folder(Some("/tmp/from-cli"), ENV_VAR, Some(&toml));
    assert_eq!(resolved, PathBuf::from("/tmp/from-cli"));

    env::remove_var(ENV_VAR);
}

#[test]
#[serial]
fn test_env_var_beats_toml() {
    env::set_var(ENV_VAR, "/tmp/from-env");
    let toml = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/from-toml")),
        ..Default::default()
    };

    let resolved = resolve_root_folder(None, ENV_VAR, Some(&toml));
    assert_eq!(resolved, PathBuf::from("/tmp/from-env"));

    env::remove_var(ENV_VAR);
}

#[test]
#[serial]
fn test_toml_used_without_cli_or_env() {
    env::remove_var(ENV_VAR);
    let toml = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/from-toml")),
        ..Default::default()
    };

    let resolved = resolve_root_folder(None, ENV_VAR, Some(&toml));
    assert_eq!(resolved, PathBuf::from("/tmp/from-toml"));
}

#[test]
#[serial]
fn test_falls_back_to_platform_default() {
    env::remove_var(ENV_VAR);
    let resolved = resolve_root_folder(None, ENV_VAR, None);
    assert_eq!(resolved, default_root_folder());
    assert!(!resolved.as_os_str().is_empty());
}

#[test]
fn test_toml_parsing() {
    let config = TomlConfig::from_toml_str(
        r#"
        root_folder = "/srv/hanzi"
        port = 5830
        recognizer_url = "http://127.0.0.1:9000"
        "#,
    )
    .unwrap();

    assert_eq!(config.root_folder, Some(PathBuf::from("/srv/hanzi")));
    assert_eq!(config.port, Some(5830));
    assert_eq!(config.recognizer_url.as_deref(), Some("http://127.0.0.1:9000"));
}

#[test]
fn test_toml_missing_keys_are_none() {
    let config = TomlConfig::from_toml_str("port = 6000").unwrap();
    assert_eq!(config.root_folder, None);
    assert_eq!(config.port, Some(6000));
}

#[test]
fn test_invalid_toml_is_config_error() {
    let result = TomlConfig::from_toml_str("port = [not valid");
    assert!(matches!(result, Err(hanzi_common::Error::Config(_))));
}
