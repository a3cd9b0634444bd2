//! Configuration loading tests
//!
//! Covers:
//! - Missing default config file → warning + compiled defaults
//! - Explicit config path must exist
//! - Full and partial TOML documents
//!
//! Note: Uses serial_test to prevent ENV variable race conditions.
//! Tests that manipulate XDG_CONFIG_HOME are marked with #[serial].

use dfd_common::config::{load_toml_config, TomlConfig};
use dfd_common::Error;
use serial_test::serial;
use std::fs;

#[test]
fn test_explicit_missing_path_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.toml");

    let err = load_toml_config(Some(&missing)).unwrap_err();
    assert!(matches!(err, Error::Config(_)), "got {:?}", err);
}

#[test]
fn test_explicit_path_full_document() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
[logging]
level = "debug"

[server]
host = "0.0.0.0"
port = 6000

[engine]
kind = "remote"
endpoint = "http://engine.local/analyze"
api_key = "secret"
timeout_secs = 20

[workflow]
recording_seconds = 8
auto_analyze_recordings = false
max_upload_bytes = 1048576

[events]
capacity = 250
"#,
    )
    .unwrap();

    let config = load_toml_config(Some(&path)).unwrap();
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.server.host.as_deref(), Some("0.0.0.0"));
    assert_eq!(config.server.port, Some(6000));
    assert_eq!(config.engine.kind.as_deref(), Some("remote"));
    assert_eq!(
        config.engine.endpoint.as_deref(),
        Some("http://engine.local/analyze")
    );
    assert_eq!(config.engine.api_key.as_deref(), Some("secret"));
    assert_eq!(config.engine.timeout_secs, Some(20));
    assert_eq!(config.engine.simulated_latency_ms, None);
    assert_eq!(config.workflow.recording_seconds, Some(8));
    assert_eq!(config.workflow.auto_analyze_recordings, Some(false));
    assert_eq!(config.workflow.max_upload_bytes, Some(1_048_576));
    assert_eq!(config.events.capacity, Some(250));
}

#[test]
fn test_explicit_path_malformed_document() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[workflow]\nrecording_seconds = \"five\"\n").unwrap();

    let err = load_toml_config(Some(&path)).unwrap_err();
    assert!(matches!(err, Error::ConfigParse(_)), "got {:?}", err);
}

#[cfg(target_os = "linux")]
#[test]
#[serial]
fn test_missing_default_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let previous = std::env::var_os("XDG_CONFIG_HOME");
    std::env::set_var("XDG_CONFIG_HOME", dir.path());

    let config = load_toml_config(None).unwrap();
    assert_eq!(config, TomlConfig::default());

    match previous {
        Some(value) => std::env::set_var("XDG_CONFIG_HOME", value),
        None => std::env::remove_var("XDG_CONFIG_HOME"),
    }
}

#[cfg(target_os = "linux")]
#[test]
#[serial]
fn test_default_file_is_discovered() {
    let dir = tempfile::tempdir().unwrap();
    let previous = std::env::var_os("XDG_CONFIG_HOME");
    std::env::set_var("XDG_CONFIG_HOME", dir.path());

    let dfd_dir = dir.path().join("dfd");
    fs::create_dir_all(&dfd_dir).unwrap();
    fs::write(dfd_dir.join("config.toml"), "[server]\nport = 7100\n").unwrap();

    let config = load_toml_config(None).unwrap();
    assert_eq!(config.server.port, Some(7100));

    match previous {
        Some(value) => std::env::set_var("XDG_CONFIG_HOME", value),
        None => std::env::remove_var("XDG_CONFIG_HOME"),
    }
}
