//! Config loading and validation through files on disk

use std::io::Write;
use tempfile::NamedTempFile;
use triproute::config::Config;
use triproute::error::AppError;

const BASE: &str = r#"
[server]
host = "0.0.0.0"
port = 8000

[models.fast]
name = "gemini_25_flash"
model = "gemini-2.5-flash"
base_url = "https://generativelanguage.googleapis.com/v1beta/openai"
max_tokens = 4096

[models.strong]
name = "gemini_25_pro"
model = "gemini-2.5-pro"
base_url = "https://generativelanguage.googleapis.com/v1beta/openai"
max_tokens = 8192

[models.cheap]
name = "gemini_20_flash"
model = "gemini-2.0-flash"
base_url = "https://generativelanguage.googleapis.com/v1beta/openai"
max_tokens = 4096
"#;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("should create temp file");
    file.write_all(content.as_bytes())
        .expect("should write config");
    file
}

#[test]
fn test_minimal_config_uses_defaults() {
    let file = write_config(BASE);
    let config = Config::from_file(file.path()).unwrap();

    assert_eq!(config.server.request_timeout_seconds, 60);
    assert!(config.models.creative.is_none());
    assert!(config.orchestration.creative_ultimate_fallback);
    assert!(config.pricing.is_empty());
    assert!(config.ledger.record_file.is_none());
    assert_eq!(config.observability.log_level, "info");
    assert_eq!(config.models.fast.temperature(), 0.7);
}

#[test]
fn test_missing_file_is_read_error_with_path() {
    let err = Config::from_file("/nonexistent/triproute.toml").unwrap_err();
    assert!(matches!(err, AppError::ConfigFileRead { .. }));
    assert!(err.to_string().contains("/nonexistent/triproute.toml"));
}

#[test]
fn test_syntax_error_is_parse_error_with_path() {
    let file = write_config("[server\nport = ");
    let err = Config::from_file(file.path()).unwrap_err();
    assert!(matches!(err, AppError::ConfigParseFailed { .. }));
    assert!(err.to_string().contains(&file.path().display().to_string()));
}

#[test]
fn test_missing_required_role_is_parse_error() {
    let without_cheap = &BASE[..BASE.find("[models.cheap]").unwrap()];
    let file = write_config(without_cheap);
    let err = Config::from_file(file.path()).unwrap_err();
    assert!(err.to_string().contains("cheap"), "{err}");
}

#[test]
fn test_validation_errors_carry_path() {
    let content = BASE.replace("max_tokens = 8192", "max_tokens = 0");
    let file = write_config(&content);
    let err = Config::from_file(file.path()).unwrap_err();

    assert!(matches!(err, AppError::ConfigValidationFailed { .. }));
    let msg = err.to_string();
    assert!(msg.contains(&file.path().display().to_string()));
    assert!(msg.contains("max_tokens must be greater than 0"));
}

#[test]
fn test_duplicate_names_rejected() {
    let content = BASE.replace("name = \"gemini_20_flash\"", "name = \"gemini_25_flash\"");
    let err = content.parse::<Config>().unwrap_err();
    assert!(err.to_string().contains("duplicate model name 'gemini_25_flash'"));
}

#[test]
fn test_creative_synthesis_requires_creative_model() {
    let content = format!("{BASE}\n[orchestration]\nsynthesis_model = \"creative\"\n");
    let err = content.parse::<Config>().unwrap_err();
    assert!(err.to_string().contains("[models.creative]"));
}

#[test]
fn test_timeout_bounds() {
    for bad in ["0", "301"] {
        let content = BASE.replace(
            "port = 8000",
            &format!("port = 8000\nrequest_timeout_seconds = {bad}"),
        );
        assert!(content.parse::<Config>().is_err(), "timeout {bad} should fail");
    }

    let content = BASE.replace("port = 8000", "port = 8000\nrequest_timeout_seconds = 300");
    assert!(content.parse::<Config>().is_ok());
}

#[test]
fn test_negative_price_rejected() {
    let content =
        format!("{BASE}\n[pricing.gemini_25_pro]\ninput_per_mtok = -1.0\noutput_per_mtok = 5.0\n");
    let err = content.parse::<Config>().unwrap_err();
    assert!(err.to_string().contains("pricing.gemini_25_pro"));
}

#[test]
fn test_hostname_is_rejected_instead_of_binding_all_interfaces() {
    let content = BASE.replace("host = \"0.0.0.0\"", "host = \"localhost\"");
    let file = write_config(&content);
    let err = Config::from_file(file.path()).unwrap_err();

    assert!(matches!(err, AppError::ConfigValidationFailed { .. }));
    assert!(err.to_string().contains("server.host: invalid IP address 'localhost'"));
}

#[test]
fn test_socket_addr_uses_configured_host() {
    let loopback: Config = BASE
        .replace("host = \"0.0.0.0\"", "host = \"127.0.0.1\"")
        .parse()
        .unwrap();
    assert_eq!(
        loopback.server.socket_addr().unwrap().to_string(),
        "127.0.0.1:8000"
    );

    let ipv6: Config = BASE.replace("host = \"0.0.0.0\"", "host = \"::1\"").parse().unwrap();
    assert_eq!(ipv6.server.socket_addr().unwrap().to_string(), "[::1]:8000");
}
