//! Tests for the layered configuration.

use redraft_rate_limit::{ProviderLimits, RedraftConfig};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

fn write_toml(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_bundled_defaults() {
    let config = RedraftConfig::load().unwrap();
    assert!(config.providers.contains_key("gemini"));
    assert!(config.providers.contains_key("aistudio"));
    assert!(config.providers.contains_key("openai"));
    assert_eq!(config.defaults.output_suffix, "_rewritten");
}

#[test]
fn test_from_file_fills_missing_fields() {
    let file = write_toml(
        r#"
[providers.gemini]
rpm = 5
"#,
    );
    let config = RedraftConfig::from_file(file.path()).unwrap();
    let gemini = config.provider_limits("gemini");
    assert_eq!(gemini.rpm, 5);
    assert_eq!(gemini.tpm, 800_000);
    assert_eq!(gemini.retry_attempts, 3);
    assert_eq!(config.defaults.provider, "gemini");
    assert_eq!(config.defaults.projects_dir, PathBuf::from("projects"));
}

#[test]
fn test_explicit_file_overrides_bundled() {
    let file = write_toml(
        r#"
[defaults]
model = "gemini-1.5-pro"
max_chapters_per_run = 4

[providers.openai]
retry_attempts = 1
retry_delay = 0.5
"#,
    );
    let config = RedraftConfig::load_with(Some(file.path())).unwrap();
    assert_eq!(config.defaults.model, "gemini-1.5-pro");
    assert_eq!(config.defaults.max_chapters_per_run, 4);

    let openai = config.provider_limits("openai");
    assert_eq!(openai.retry_attempts, 1);
    assert_eq!(*openai.retry_policy().retry_delay(), Duration::from_millis(500));
    // untouched bundled values survive the merge
    assert_eq!(openai.api_key_env.as_deref(), Some("OPENAI_API_KEY"));
}

#[test]
fn test_missing_explicit_file_is_an_error() {
    let result = RedraftConfig::load_with(Some(std::path::Path::new(
        "/definitely/not/here/redraft.toml",
    )));
    assert!(result.is_err());
}

#[test]
fn test_unknown_provider_gets_default_limits() {
    let config = RedraftConfig::default();
    assert_eq!(config.provider_limits("mistral"), ProviderLimits::default());
}
