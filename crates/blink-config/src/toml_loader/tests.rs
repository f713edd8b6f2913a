//! Tests for TOML config loading and default file creation.

use super::*;
use std::path::Path;

#[test]
fn load_from_nonexistent_returns_file_not_found() {
    let result = load_from_path(Path::new("/tmp/nonexistent_blink_config.toml"));
    let err = result.unwrap_err();
    assert!(matches!(err, blink_common::ConfigError::FileNotFound(_)));
}

#[test]
fn load_valid_partial_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[window]
title = "blink_example"
width = 1024

[core]
submit_timeout_ms = 2000
"#,
    )
    .unwrap();

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.window.title, "blink_example");
    assert_eq!(config.window.width, 1024);
    assert_eq!(config.runtime.submit_timeout_ms, 2000);
    // Defaults preserved
    assert_eq!(config.window.height, 800);
    assert_eq!(config.engine.cookie_file, "cookie.dat");
}

#[test]
fn load_invalid_toml_returns_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "this is not valid toml {{{").unwrap();

    let err = load_from_path(&path).unwrap_err();
    assert!(matches!(err, blink_common::ConfigError::ParseError(_)));
}

#[test]
fn load_config_with_invalid_values_keeps_parsed_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[core]\nsubmit_timeout_ms = 0\n").unwrap();

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.runtime.submit_timeout_ms, 0);
}

#[test]
fn write_and_load_default_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blink").join("config.toml");

    write_default_config(&path).unwrap();
    assert!(path.exists());

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.window.title, "blink");
    assert_eq!(config.runtime.thread_name, "blink-ui");
}

#[test]
fn existing_config_is_not_overwritten() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[window]\ntitle = \"mine\"\n").unwrap();

    write_default_config(&path).unwrap();
    assert_eq!(load_from_path(&path).unwrap().window.title, "mine");
}

#[test]
fn default_config_toml_is_valid() {
    let config = parse(&template::default_config_toml()).unwrap();
    assert_eq!(config.engine.cookie_file, "cookie.dat");
    assert!(crate::validation::validate(&config).is_ok());
}

#[test]
fn empty_file_is_all_defaults() {
    let config = parse("").unwrap();
    assert_eq!(config.window.title, "blink");
    assert!(config.filesystems.is_empty());
}
