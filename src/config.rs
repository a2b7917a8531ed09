//! Configuration management for Triproute
//!
//! Parses TOML configuration files and provides typed access to settings.

use crate::collector::pricing::ModelPrice;
use crate::error::{AppError, AppResult};
use crate::models::ModelRole;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Upper bound for any timeout value, in seconds
const MAX_TIMEOUT_SECONDS: u64 = 300;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub models: ModelsConfig,
    #[serde(default)]
    pub orchestration: OrchestrationConfig,
    /// Per-model price overrides, keyed by logical model name
    #[serde(default)]
    pub pricing: BTreeMap<String, ModelPrice>,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Default per-call model timeout; endpoints may override it
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_request_timeout() -> u64 {
    60
}

impl ServerConfig {
    /// Socket address to bind; `host` must be a literal IP address
    pub fn socket_addr(&self) -> AppResult<SocketAddr> {
        let ip: IpAddr = self.host.trim().parse().map_err(|_| {
            AppError::Config(format!(
                "server.host: invalid IP address '{}'. \
                Use a literal address such as 127.0.0.1 or 0.0.0.0 (hostnames are not resolved).",
                self.host
            ))
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Model roles
///
/// `fast`, `strong` and `cheap` are required. `creative` is optional; without
/// it the ensemble uses the fast/strong slate for creative queries and the
/// cascade has no ultimate fallback.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelsConfig {
    pub fast: ModelEndpoint,
    pub strong: ModelEndpoint,
    pub cheap: ModelEndpoint,
    #[serde(default)]
    pub creative: Option<ModelEndpoint>,
}

impl ModelsConfig {
    /// Iterate over configured endpoints with their role
    pub fn iter(&self) -> impl Iterator<Item = (ModelRole, &ModelEndpoint)> {
        [
            (ModelRole::Fast, Some(&self.fast)),
            (ModelRole::Strong, Some(&self.strong)),
            (ModelRole::Cheap, Some(&self.cheap)),
            (ModelRole::Creative, self.creative.as_ref()),
        ]
        .into_iter()
        .filter_map(|(role, endpoint)| endpoint.map(|e| (role, e)))
    }

    /// Endpoint configured for a role, if any
    pub fn get(&self, role: ModelRole) -> Option<&ModelEndpoint> {
        match role {
            ModelRole::Fast => Some(&self.fast),
            ModelRole::Strong => Some(&self.strong),
            ModelRole::Cheap => Some(&self.cheap),
            ModelRole::Creative => self.creative.as_ref(),
        }
    }
}

/// Individual model endpoint configuration
///
/// All fields are private to enforce invariants. Configuration is loaded via
/// deserialization and validated via Config::validate(). After construction,
/// fields cannot be mutated, ensuring validated data remains valid.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelEndpoint {
    /// Logical name used in ledger records, pricing and API responses
    name: String,
    /// Provider model id sent on the wire
    model: String,
    base_url: String,
    max_tokens: usize,
    #[serde(default = "default_temperature")]
    temperature: f64,
    /// Environment variable holding the API key
    #[serde(default)]
    api_key_env: Option<String>,
    #[serde(default)]
    timeout_seconds: Option<u64>,
}

impl ModelEndpoint {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn api_key_env(&self) -> Option<&str> {
        self.api_key_env.as_deref()
    }

    pub fn timeout_seconds(&self) -> Option<u64> {
        self.timeout_seconds
    }

    fn validate(&self, role: ModelRole) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::Config(format!(
                "models.{role}: name cannot be empty"
            )));
        }

        if self.model.trim().is_empty() {
            return Err(AppError::Config(format!(
                "models.{role} ('{}'): model cannot be empty",
                self.name
            )));
        }

        if self.max_tokens == 0 {
            return Err(AppError::Config(format!(
                "models.{role} ('{}'): max_tokens must be greater than 0",
                self.name
            )));
        }

        // Wire format sends max_tokens as u32
        if self.max_tokens > u32::MAX as usize {
            return Err(AppError::Config(format!(
                "models.{role} ('{}'): max_tokens={} exceeds u32::MAX ({})",
                self.name,
                self.max_tokens,
                u32::MAX
            )));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(AppError::Config(format!(
                "models.{role} ('{}'): invalid base_url '{}'. \
                base_url must start with 'http://' or 'https://'.",
                self.name, self.base_url
            )));
        }

        if !(0.0..=2.0).contains(&self.temperature) || !self.temperature.is_finite() {
            return Err(AppError::Config(format!(
                "models.{role} ('{}'): invalid temperature {}. \
                temperature must be a finite number between 0.0 and 2.0.",
                self.name, self.temperature
            )));
        }

        if let Some(timeout) = self.timeout_seconds {
            validate_timeout(&format!("models.{role}.timeout_seconds"), timeout)?;
        }

        Ok(())
    }
}

fn default_temperature() -> f64 {
    0.7
}

fn validate_timeout(field: &str, timeout: u64) -> AppResult<()> {
    if timeout == 0 {
        return Err(AppError::Config(format!(
            "{field} must be greater than 0"
        )));
    }
    if timeout > MAX_TIMEOUT_SECONDS {
        return Err(AppError::Config(format!(
            "{field} cannot exceed {MAX_TIMEOUT_SECONDS} seconds (5 minutes), got {timeout}"
        )));
    }
    Ok(())
}

/// Orchestration pattern tuning
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OrchestrationConfig {
    /// Role whose model merges ensemble answers
    #[serde(default = "default_synthesis_model")]
    pub synthesis_model: ModelRole,
    /// Try the creative model when the cascade's strong model also fails
    #[serde(default = "default_true")]
    pub creative_ultimate_fallback: bool,
}

impl Default for OrchestrationConfig {
    fn default() -> Self {
        Self {
            synthesis_model: default_synthesis_model(),
            creative_ultimate_fallback: true,
        }
    }
}

fn default_synthesis_model() -> ModelRole {
    ModelRole::Strong
}

fn default_true() -> bool {
    true
}

/// Call ledger persistence
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LedgerConfig {
    /// Append every call record to this JSON-lines file
    #[serde(default)]
    pub record_file: Option<PathBuf>,
    /// Directory for summary snapshots (CLI runs and server shutdown)
    #[serde(default)]
    pub snapshot_dir: Option<PathBuf>,
}

/// Observability configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let path_display = path.as_ref().display().to_string();

        let content = std::fs::read_to_string(path.as_ref()).map_err(|source| {
            AppError::ConfigFileRead {
                path: path_display.clone(),
                source,
            }
        })?;

        let config: Self =
            toml::from_str(&content).map_err(|source| AppError::ConfigParseFailed {
                path: path_display.clone(),
                source,
            })?;

        config
            .validate()
            .map_err(|e| AppError::ConfigValidationFailed {
                path: path_display,
                reason: e.to_string(),
            })?;

        Ok(config)
    }

    /// Effective per-call timeout for a role
    ///
    /// Returns the endpoint's override if configured, otherwise the global
    /// `server.request_timeout_seconds`.
    pub fn timeout_for(&self, role: ModelRole) -> u64 {
        match self.models.get(role).and_then(|e| e.timeout_seconds()) {
            Some(timeout) => {
                tracing::debug!(
                    role = %role,
                    timeout_seconds = timeout,
                    "Using role-specific timeout override"
                );
                timeout
            }
            None => self.server.request_timeout_seconds,
        }
    }

    /// Validate configuration after parsing
    ///
    /// This is called automatically by `from_file()` and `from_str()`, but can
    /// also be called explicitly when a Config is built or mutated in code.
    pub fn validate(&self) -> AppResult<()> {
        self.server.socket_addr()?;

        let mut seen = HashSet::new();
        for (role, endpoint) in self.models.iter() {
            endpoint.validate(role)?;

            // Logical names key ensemble answers and ledger rows
            if !seen.insert(endpoint.name()) {
                return Err(AppError::Config(format!(
                    "models.{role}: duplicate model name '{}'. \
                    Logical names must be unique across fast, strong, cheap and creative.",
                    endpoint.name()
                )));
            }
        }

        if self.orchestration.synthesis_model == ModelRole::Creative
            && self.models.creative.is_none()
        {
            return Err(AppError::Config(
                "orchestration.synthesis_model = \"creative\" requires a [models.creative] endpoint"
                    .to_string(),
            ));
        }

        validate_timeout(
            "server.request_timeout_seconds",
            self.server.request_timeout_seconds,
        )?;

        for (model, price) in &self.pricing {
            if !price.is_valid() {
                return Err(AppError::Config(format!(
                    "pricing.{model}: prices must be finite and non-negative"
                )));
            }
        }

        Ok(())
    }
}

impl FromStr for Config {
    type Err = AppError;

    fn from_str(toml_str: &str) -> Result<Self, Self::Err> {
        let config: Config =
            toml::from_str(toml_str).map_err(|source| AppError::ConfigParseFailed {
                path: "<string>".to_string(),
                source,
            })?;

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_CONFIG: &str = r#"
[server]
host = "0.0.0.0"
port = 8000
request_timeout_seconds = 60

[models.fast]
name = "gemini_25_flash"
model = "gemini-2.5-flash"
base_url = "https://generativelanguage.googleapis.com/v1beta/openai"
max_tokens = 4096
temperature = 0.7
api_key_env = "GOOGLE_API_KEY"

[models.strong]
name = "gemini_25_pro"
model = "gemini-2.5-pro"
base_url = "https://generativelanguage.googleapis.com/v1beta/openai"
max_tokens = 8192
timeout_seconds = 120

[models.cheap]
name = "gemini_20_flash"
model = "gemini-2.0-flash"
base_url = "https://generativelanguage.googleapis.com/v1beta/openai"
max_tokens = 4096
temperature = 0.5

[models.creative]
name = "openai_creative"
model = "gpt-4o"
base_url = "https://api.openai.com/v1"
max_tokens = 2048
temperature = 0.9
api_key_env = "OPENAI_API_KEY"

[pricing.gemini_25_pro]
input_per_mtok = 1.5
output_per_mtok = 6.0

[ledger]
snapshot_dir = "logs"

[observability]
log_level = "debug"
"#;

    #[test]
    fn test_config_from_str_parses_successfully() {
        let config = Config::from_str(TEST_CONFIG).expect("should parse config");
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.request_timeout_seconds, 60);
        assert_eq!(config.observability.log_level, "debug");
        assert_eq!(config.ledger.snapshot_dir, Some(PathBuf::from("logs")));
        assert!(config.ledger.record_file.is_none());
    }

    #[test]
    fn test_config_parses_model_roles() {
        let config = Config::from_str(TEST_CONFIG).expect("should parse config");

        assert_eq!(config.models.fast.name(), "gemini_25_flash");
        assert_eq!(config.models.fast.model(), "gemini-2.5-flash");
        assert_eq!(config.models.fast.api_key_env(), Some("GOOGLE_API_KEY"));
        assert_eq!(config.models.strong.max_tokens(), 8192);
        // Default temperature applies when omitted
        assert_eq!(config.models.strong.temperature(), 0.7);
        assert_eq!(config.models.cheap.temperature(), 0.5);
        let creative = config.models.creative.as_ref().expect("creative configured");
        assert_eq!(creative.name(), "openai_creative");
        assert_eq!(config.models.iter().count(), 4);
    }

    #[test]
    fn test_config_orchestration_defaults() {
        let config = Config::from_str(TEST_CONFIG).expect("should parse config");
        assert_eq!(config.orchestration.synthesis_model, ModelRole::Strong);
        assert!(config.orchestration.creative_ultimate_fallback);
    }

    #[test]
    fn test_config_parses_pricing_overrides() {
        let config = Config::from_str(TEST_CONFIG).expect("should parse config");
        let price = config.pricing.get("gemini_25_pro").expect("override present");
        assert_eq!(price.input_per_mtok, 1.5);
        assert_eq!(price.output_per_mtok, 6.0);
    }

    #[test]
    fn test_timeout_for_uses_override_then_global() {
        let config = Config::from_str(TEST_CONFIG).expect("should parse config");
        assert_eq!(config.timeout_for(ModelRole::Strong), 120);
        assert_eq!(config.timeout_for(ModelRole::Fast), 60);
    }

    #[test]
    fn test_creative_is_optional() {
        let without_creative = TEST_CONFIG
            .split("[models.creative]")
            .next()
            .unwrap()
            .to_string();
        let config = Config::from_str(&without_creative).expect("should parse without creative");
        assert!(config.models.creative.is_none());
        assert!(config.models.get(ModelRole::Creative).is_none());
        assert_eq!(config.models.iter().count(), 3);
    }

    #[test]
    fn test_config_validation_duplicate_names_fails() {
        let mut config = Config::from_str(TEST_CONFIG).unwrap();
        config.models.cheap.name = "gemini_25_flash".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("duplicate model name"), "got: {err}");
    }

    #[test]
    fn test_config_validation_zero_max_tokens_fails() {
        let mut config = Config::from_str(TEST_CONFIG).unwrap();
        config.models.fast.max_tokens = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("max_tokens"));
    }

    #[test]
    fn test_config_validation_invalid_base_url_fails() {
        let mut config = Config::from_str(TEST_CONFIG).unwrap();
        config.models.strong.base_url = "generativelanguage.googleapis.com".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("base_url"));
    }

    #[test]
    fn test_config_validation_temperature_out_of_range_fails() {
        let mut config = Config::from_str(TEST_CONFIG).unwrap();
        config.models.cheap.temperature = 2.5;
        assert!(config.validate().is_err());

        config.models.cheap.temperature = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_timeout_bounds() {
        let mut config = Config::from_str(TEST_CONFIG).unwrap();

        config.server.request_timeout_seconds = 0;
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("greater than 0"), "got: {err}");

        config.server.request_timeout_seconds = 301;
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("300"), "got: {err}");

        config.server.request_timeout_seconds = 300;
        assert!(config.validate().is_ok());

        config.models.fast.timeout_seconds = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_creative_synthesis_requires_creative_model() {
        let mut config = Config::from_str(TEST_CONFIG).unwrap();
        config.models.creative = None;
        config.orchestration.synthesis_model = ModelRole::Creative;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("synthesis_model"), "got: {err}");
    }

    #[test]
    fn test_negative_price_fails() {
        let mut config = Config::from_str(TEST_CONFIG).unwrap();
        config.pricing.insert(
            "gemini_20_flash".to_string(),
            ModelPrice::new(-1.0, 0.3),
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_required_role_fails_to_parse() {
        let without_cheap = TEST_CONFIG.replace("[models.cheap]", "[models.unused]");
        let err = Config::from_str(&without_cheap).unwrap_err();
        assert!(matches!(err, AppError::ConfigParseFailed { .. }));
    }

    #[test]
    fn test_from_file_reports_missing_file() {
        let err = Config::from_file("/nonexistent/triproute.toml").unwrap_err();
        assert!(matches!(err, AppError::ConfigFileRead { .. }));
        assert!(err.to_string().contains("/nonexistent/triproute.toml"));
    }

    #[test]
    fn test_from_file_reports_validation_context() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            TEST_CONFIG.replace("request_timeout_seconds = 60", "request_timeout_seconds = 0"),
        )
        .unwrap();

        let err = Config::from_file(&path).unwrap_err();
        assert!(matches!(err, AppError::ConfigValidationFailed { .. }));
        assert!(err.to_string().contains("request_timeout_seconds"));
    }
}
