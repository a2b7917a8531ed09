//! Model roles and immutable model handles

use crate::config::ModelEndpoint;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Role a model plays in the orchestration patterns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelRole {
    /// Fast, cheap tier for simple queries and the default route
    Fast,
    /// Strong reasoning tier for technical and complex queries
    Strong,
    /// Cheapest model, used for the cascade's first attempt
    Cheap,
    /// Creative specialist, optional
    Creative,
}

impl ModelRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelRole::Fast => "fast",
            ModelRole::Strong => "strong",
            ModelRole::Cheap => "cheap",
            ModelRole::Creative => "creative",
        }
    }
}

impl std::fmt::Display for ModelRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A configured LLM backend bound to a role
///
/// Handles are built once at start-up and shared read-only.
#[derive(Clone, PartialEq)]
pub struct ModelHandle {
    name: String,
    role: ModelRole,
    model: String,
    base_url: String,
    temperature: f64,
    max_tokens: u32,
    api_key: Option<String>,
    timeout: Duration,
}

impl ModelHandle {
    /// Create a handle with default sampling settings and a 60s timeout
    pub fn new(role: ModelRole, name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role,
            model: model.into(),
            base_url: "http://localhost:8080/v1".to_string(),
            temperature: 0.7,
            max_tokens: 4096,
            api_key: None,
            timeout: Duration::from_secs(60),
        }
    }

    /// Build a handle from a validated endpoint
    ///
    /// The API key is read from the endpoint's `api_key_env` variable. A
    /// missing variable is logged and the handle is built without a key, so
    /// keyless local backends keep working.
    pub fn from_endpoint(role: ModelRole, endpoint: &ModelEndpoint, timeout_seconds: u64) -> Self {
        let api_key = endpoint.api_key_env().and_then(|var| match std::env::var(var) {
            Ok(key) if !key.trim().is_empty() => Some(key),
            _ => {
                tracing::warn!(
                    model = %endpoint.name(),
                    role = %role,
                    env_var = %var,
                    "API key environment variable is not set; calling without credentials"
                );
                None
            }
        });

        Self {
            name: endpoint.name().to_string(),
            role,
            model: endpoint.model().to_string(),
            base_url: endpoint.base_url().trim_end_matches('/').to_string(),
            temperature: endpoint.temperature(),
            // Bounded by Config::validate
            max_tokens: u32::try_from(endpoint.max_tokens()).unwrap_or(u32::MAX),
            api_key,
            timeout: Duration::from_secs(timeout_seconds),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Logical name used in results, ledger records and pricing
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> ModelRole {
        self.role
    }

    /// Provider model id sent on the wire
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

// Keeps API keys out of logs
impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle")
            .field("name", &self.name)
            .field("role", &self.role)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}
