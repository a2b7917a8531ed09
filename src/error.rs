//! Error types for Triproute
//!
//! `AppError` implements `IntoResponse` for Axum handlers. `ModelCallError`
//! is the typed failure returned by model callers; the orchestration
//! patterns branch on its variants instead of on error message text.

use crate::orchestration::Pattern;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Why a backend reported itself unavailable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnavailableKind {
    /// Model id unknown to the provider (HTTP 404)
    NotFound,
    /// Provider rejected the call for quota or rate reasons (HTTP 429)
    RateLimited,
    /// Provider is temporarily overloaded (HTTP 503)
    Overloaded,
}

impl UnavailableKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not found",
            Self::RateLimited => "rate limited",
            Self::Overloaded => "overloaded",
        }
    }
}

impl std::fmt::Display for UnavailableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of a single model invocation
///
/// Only [`ModelCallError::Unavailable`] is treated as recoverable by the
/// cascade's first attempt. Everything else is a hard failure for the
/// router and the cascade's first attempt, and a failed slot for the
/// ensemble.
#[derive(Debug, Clone, Error)]
pub enum ModelCallError {
    #[error("model {model} unavailable ({kind}): {detail}")]
    Unavailable {
        model: String,
        kind: UnavailableKind,
        detail: String,
    },

    #[error("model {model} returned HTTP {status}: {body}")]
    Http {
        model: String,
        status: u16,
        body: String,
    },

    #[error("request to model {model} timed out after {timeout_seconds} seconds")]
    Timeout { model: String, timeout_seconds: u64 },

    #[error("transport error calling model {model}: {message}")]
    Transport { model: String, message: String },

    #[error("malformed response from model {model}: {detail}")]
    MalformedResponse { model: String, detail: String },
}

impl ModelCallError {
    /// True when the backend is missing, rate limited or overloaded
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }

    /// Logical name of the model that failed
    pub fn model(&self) -> &str {
        match self {
            Self::Unavailable { model, .. }
            | Self::Http { model, .. }
            | Self::Timeout { model, .. }
            | Self::Transport { model, .. }
            | Self::MalformedResponse { model, .. } => model,
        }
    }

    /// Short label for metrics and ledger metadata
    pub fn kind_label(&self) -> &'static str {
        match self {
            Self::Unavailable { .. } => "unavailable",
            Self::Http { .. } => "http",
            Self::Timeout { .. } => "timeout",
            Self::Transport { .. } => "transport",
            Self::MalformedResponse { .. } => "malformed_response",
        }
    }
}

/// Main error type for the application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read config file {path}: {source}")]
    ConfigFileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration in {path}: {reason}")]
    ConfigValidationFailed { path: String, reason: String },

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Invalid strategy '{given}'. Use one of: {accepted}")]
    InvalidStrategy {
        given: String,
        accepted: &'static str,
    },

    #[error("{pattern} failed: {source}")]
    PatternFailed {
        pattern: Pattern,
        #[source]
        source: ModelCallError,
    },

    #[error("Failed to write ledger snapshot to {path}: {reason}")]
    Snapshot { path: String, reason: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Validation(_) | Self::InvalidStrategy { .. } => StatusCode::BAD_REQUEST,
            Self::Config(_)
            | Self::ConfigFileRead { .. }
            | Self::ConfigParseFailed { .. }
            | Self::ConfigValidationFailed { .. }
            | Self::PatternFailed { .. }
            | Self::Snapshot { .. }
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(serde_json::json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

/// Convenience type alias for Results
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn not_found() -> ModelCallError {
        ModelCallError::Unavailable {
            model: "gemini_20_flash".to_string(),
            kind: UnavailableKind::NotFound,
            detail: "models/gemini-2.0-flash is not found".to_string(),
        }
    }

    #[test]
    fn test_unavailable_is_classified_unavailable() {
        assert!(not_found().is_unavailable());
        assert_eq!(not_found().kind_label(), "unavailable");
    }

    #[test]
    fn test_generic_failures_are_not_unavailable() {
        let errors = [
            ModelCallError::Http {
                model: "m".to_string(),
                status: 500,
                body: "boom".to_string(),
            },
            ModelCallError::Timeout {
                model: "m".to_string(),
                timeout_seconds: 30,
            },
            ModelCallError::Transport {
                model: "m".to_string(),
                message: "connection refused".to_string(),
            },
            ModelCallError::MalformedResponse {
                model: "m".to_string(),
                detail: "no choices".to_string(),
            },
        ];

        for error in errors {
            assert!(!error.is_unavailable(), "{error} should not be unavailable");
            assert_eq!(error.model(), "m");
        }
    }

    #[test]
    fn test_model_call_error_display_names_model_and_kind() {
        let msg = not_found().to_string();
        assert!(msg.contains("gemini_20_flash"));
        assert!(msg.contains("not found"));
    }

    #[test]
    fn test_validation_error_response_status() {
        let err = AppError::Validation("query cannot be empty".to_string());
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_invalid_strategy_names_accepted_values() {
        let err = AppError::InvalidStrategy {
            given: "fastest".to_string(),
            accepted: "router, cascade, ensemble, direct, auto",
        };
        let msg = err.to_string();
        assert!(msg.contains("'fastest'"));
        assert!(msg.contains("router, cascade, ensemble, direct, auto"));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_pattern_failed_names_pattern_and_is_500() {
        let err = AppError::PatternFailed {
            pattern: Pattern::Router,
            source: not_found(),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("router failed:"), "got: {msg}");
        assert!(msg.contains("gemini_20_flash"));
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_config_error_creates() {
        let err = AppError::Config("test error".to_string());
        assert_eq!(err.to_string(), "Configuration error: test error");
    }
}
