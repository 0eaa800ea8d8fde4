//! Bootstrap configuration tests
//!
//! Covers TOML loading, telemetry directory priority and atomic writes.

use erm_common::config::{
    load_toml_config, resolve_telemetry_dir, write_atomic, TomlConfig, TELEMETRY_DIR_ENV,
};
use serial_test::serial;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[test]
fn test_missing_config_file_yields_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let config = load_toml_config(&temp_dir.path().join("absent.toml")).unwrap();

    assert!(config.database_path.is_none());
    assert!(config.telemetry_dir.is_none());
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_load_full_config() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("erm.toml");
    std::fs::write(
        &path,
        r#"
database_path = "/var/lib/erm/erm.db"
telemetry_dir = "/var/lib/erm/telemetry"

[logging]
level = "debug"
"#,
    )
    .unwrap();

    let config = load_toml_config(&path).unwrap();
    assert_eq!(config.database_path, Some(PathBuf::from("/var/lib/erm/erm.db")));
    assert_eq!(config.telemetry_dir, Some(PathBuf::from("/var/lib/erm/telemetry")));
    assert_eq!(config.logging.level, "debug");
    assert!(config.logging.file.is_none());
}

#[test]
fn test_malformed_config_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("broken.toml");
    std::fs::write(&path, "telemetry_dir = [unterminated").unwrap();

    assert!(load_toml_config(&path).is_err());
}

#[test]
#[serial]
fn test_cli_argument_wins_over_environment() {
    std::env::set_var(TELEMETRY_DIR_ENV, "/from/env");
    let config = TomlConfig {
        telemetry_dir: Some(PathBuf::from("/from/toml")),
        ..Default::default()
    };

    let resolved = resolve_telemetry_dir(Some(Path::new("/from/cli")), &config);
    std::env::remove_var(TELEMETRY_DIR_ENV);

    assert_eq!(resolved, PathBuf::from("/from/cli"));
}

#[test]
#[serial]
fn test_environment_wins_over_toml() {
    std::env::set_var(TELEMETRY_DIR_ENV, "/from/env");
    let config = TomlConfig {
        telemetry_dir: Some(PathBuf::from("/from/toml")),
        ..Default::default()
    };

    let resolved = resolve_telemetry_dir(None, &config);
    std::env::remove_var(TELEMETRY_DIR_ENV);

    assert_eq!(resolved, PathBuf::from("/from/env"));
}

#[test]
#[serial]
fn test_toml_used_without_cli_or_environment() {
    std::env::remove_var(TELEMETRY_DIR_ENV);
    let config = TomlConfig {
        telemetry_dir: Some(PathBuf::from("/from/toml")),
        ..Default::default()
    };

    assert_eq!(resolve_telemetry_dir(None, &config), PathBuf::from("/from/toml"));
}

#[test]
fn test_atomic_write_replaces_content_and_cleans_temp() {
    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("nested").join("summary.json");

    write_atomic(&target, b"{\"v\":1}").unwrap();
    write_atomic(&target, b"{\"v\":2}").unwrap();

    assert_eq!(std::fs::read_to_string(&target).unwrap(), "{\"v\":2}");
    assert!(!temp_dir.path().join("nested").join("summary.json.tmp").exists());
}

#[test]
fn test_atomic_write_rejects_path_without_file_name() {
    let result = write_atomic(Path::new("/"), b"{}");
    assert!(matches!(result, Err(erm_common::Error::InvalidInput(_))));
}
