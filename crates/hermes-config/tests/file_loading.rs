//! Loading configuration files from disk.

use std::io::Write;

use hermes_config::{ConfigError, ConfigLoader, LogFormat};
use tempfile::{Builder, NamedTempFile};

fn file_with(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn loads_toml_file() {
    let file = file_with(
        ".toml",
        r#"
        [service]
        raise_exceptions = true

        [logging]
        level = "hermes_server=debug,warn"
        format = "pretty"
        service_name = "haberdasher"
        "#,
    );

    let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();

    assert!(config.service.raise_exceptions);
    assert_eq!(config.logging.level, "hermes_server=debug,warn");
    assert_eq!(config.logging.format, LogFormat::Pretty);
    assert_eq!(config.logging.service_name, "haberdasher");
}

#[test]
fn loads_json_file() {
    let file = file_with(".json", r#"{"service": {"raise_exceptions": true}}"#);

    let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();

    assert!(config.service.raise_exceptions);
    assert_eq!(config.logging.format, LogFormat::Json);
}

#[test]
fn rejects_unknown_fields() {
    let file = file_with(".toml", "[service]\nraise_exception = true\n");

    let result = ConfigLoader::new().with_file(file.path());
    assert!(matches!(result, Err(ConfigError::TomlError(_))));
}

#[test]
fn rejects_unknown_extension() {
    let file = file_with(".yaml", "service: {}\n");

    let result = ConfigLoader::new().with_file(file.path());
    assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
}

#[test]
fn file_with_invalid_level_fails_validation() {
    let file = file_with(".toml", "[logging]\nlevel = \"hermes_server=loud\"\n");

    let loader = ConfigLoader::new().with_file(file.path()).unwrap();
    assert!(matches!(loader.load(), Err(ConfigError::InvalidValue { .. })));
}

#[test]
fn dotenv_file_feeds_env_overrides() {
    let file = file_with(
        ".env",
        "HERMES_DOTENV_IT__LOGGING__FORMAT=compact\nHERMES_DOTENV_IT__SERVICE__RAISE_EXCEPTIONS=on\n",
    );

    let config = ConfigLoader::new()
        .with_dotenv_file(file.path())
        .unwrap()
        .with_env_prefix("HERMES_DOTENV_IT")
        .load()
        .unwrap();

    assert_eq!(config.logging.format, LogFormat::Compact);
    assert!(config.service.raise_exceptions);
}

#[test]
fn missing_dotenv_file_is_an_error() {
    let result = ConfigLoader::new().with_dotenv_file("/definitely/not/here.env");
    assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
}
