use fhub_kernel::config::{ConfigError, load_config};
use serde::Deserialize;
use std::fs;

#[derive(Debug, Deserialize)]
struct TestConfig {
    name: String,
    server: ServerSection,
}

#[derive(Debug, Deserialize)]
struct ServerSection {
    port: u16,
}

#[test]
fn loads_layered_toml() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("app.toml");
    fs::write(&path, "name = \"funnelhub\"\n\n[server]\nport = 4460\n").expect("write config");

    let config: TestConfig = load_config(Some(dir.path().join("app"))).expect("load");

    assert_eq!(config.name, "funnelhub");
    assert_eq!(config.server.port, 4460);
}

#[test]
fn missing_file_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");

    let result = load_config::<TestConfig>(Some(dir.path().join("does-not-exist")));
    assert!(matches!(result, Err(ConfigError::Config { .. })));
}

#[test]
fn type_mismatch_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("app.toml");
    fs::write(&path, "name = \"funnelhub\"\n\n[server]\nport = \"not a number\"\n")
        .expect("write config");

    let result = load_config::<TestConfig>(Some(dir.path().join("app")));
    assert!(result.is_err());
}
