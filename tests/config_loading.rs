// tests/config_loading.rs

use std::io::Write;

use tempfile::NamedTempFile;

use podrun::config::{ConfigFile, load_and_validate, load_or_default};
use podrun::errors::PodrunError;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn partial_file_keeps_defaults_for_missing_keys() {
    let file = write_config(
        r#"
[runtime]
image = "registry.local/java-runtime:17"
ports = [8080]

[discovery]
ready_timeout_ms = 120000

[cluster]
namespace = "team-a"
adopt_existing = false
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();
    let defaults = ConfigFile::default();

    assert_eq!(cfg.runtime.image, "registry.local/java-runtime:17");
    assert_eq!(cfg.runtime.ports, vec![8080]);
    assert_eq!(cfg.runtime.mount_path, defaults.runtime.mount_path);
    assert_eq!(cfg.discovery.probe_timeout_ms, 10_000);
    assert_eq!(cfg.discovery.ready_timeout_ms, Some(120_000));
    assert_eq!(cfg.tasks.full_suffix, "/.udo/bin/full-build-and-run.sh");
    assert_eq!(cfg.cluster.namespace.as_deref(), Some("team-a"));
    assert!(!cfg.cluster.adopt_existing);
    assert_eq!(cfg.cluster.claim_selector, "app=idp");
}

#[test]
fn invalid_values_are_config_errors() {
    let file = write_config(
        r#"
[cluster]
namespace = "Team_A"
"#,
    );

    match load_and_validate(file.path()) {
        Err(PodrunError::ConfigError(msg)) => assert!(msg.contains("namespace"), "{msg}"),
        Err(e) => panic!("Expected ConfigError, got: {e:?}"),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn malformed_toml_is_a_toml_error() {
    let file = write_config("[runtime\nimage = 1");
    assert!(matches!(
        load_and_validate(file.path()),
        Err(PodrunError::TomlError(_))
    ));
}

#[test]
fn missing_implicit_config_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = load_or_default(dir.path().join("Podrun.toml"), false).unwrap();
    assert_eq!(cfg.runtime.container_name, "runtime");
    assert_eq!(cfg.discovery.ready_timeout_ms, None);
}

#[test]
fn missing_explicit_config_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_or_default(dir.path().join("custom.toml"), true).unwrap_err();
    assert!(matches!(err, PodrunError::ConfigError(_)));
    assert!(err.to_string().contains("custom.toml"));
}
