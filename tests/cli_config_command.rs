//! Integration tests for the `triproute config` template
//!
//! The generated file must load through the same path the server uses.

use std::fs;
use tempfile::TempDir;
use triproute::cli::generate_config_template;
use triproute::collector::MetricsCollector;
use triproute::config::Config;
use triproute::metrics::Metrics;
use triproute::models::{ModelRegistry, ModelRole};
use std::sync::Arc;

fn create_temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp directory")
}

#[test]
fn test_generated_template_creates_valid_config_file() {
    let temp_dir = create_temp_dir();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, generate_config_template()).expect("Failed to write template");

    let config =
        Config::from_file(&config_path).expect("Generated template should load as valid Config");

    assert_eq!(config.models.fast.name(), "gemini_25_flash");
    assert_eq!(config.models.strong.name(), "gemini_25_pro");
    assert_eq!(config.models.cheap.name(), "gemini_20_flash");
    assert_eq!(config.orchestration.synthesis_model, ModelRole::Strong);
    assert!(config.orchestration.creative_ultimate_fallback);
    assert_eq!(config.timeout_for(ModelRole::Strong), 120);
    assert_eq!(config.timeout_for(ModelRole::Fast), 60);
}

#[test]
fn test_template_builds_registry_and_collector() {
    let config: Config = generate_config_template().parse().unwrap();

    let registry = ModelRegistry::from_config(&config).unwrap();
    assert_eq!(registry.handles().count(), 4);
    assert_eq!(registry.creative().map(|h| h.name()), Some("openai_creative"));

    let metrics = Arc::new(Metrics::new().unwrap());
    let collector = MetricsCollector::from_config(&config, metrics).unwrap();
    assert!(collector.is_empty());
}

#[test]
fn test_template_file_content_matches_generation() {
    let temp_dir = create_temp_dir();
    let config_path = temp_dir.path().join("config.toml");

    let template = generate_config_template();
    fs::write(&config_path, template).expect("Failed to write template");

    let content = fs::read_to_string(&config_path).expect("Failed to read back");
    assert_eq!(content, template);
}

#[test]
fn test_template_with_ledger_enabled_opens_record_file() {
    let temp_dir = create_temp_dir();
    let record_file = temp_dir.path().join("logs").join("calls.jsonl");
    let template = generate_config_template().replace(
        "# record_file = \"logs/calls.jsonl\"",
        &format!("record_file = {:?}", record_file.display().to_string()),
    );

    let config: Config = template.parse().unwrap();
    assert_eq!(config.ledger.record_file.as_deref(), Some(record_file.as_path()));

    let metrics = Arc::new(Metrics::new().unwrap());
    MetricsCollector::from_config(&config, metrics).unwrap();
    assert!(record_file.exists());
}
