//! HTTP surface for Triproute

use crate::collector::MetricsCollector;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::metrics::Metrics;
use crate::middleware::request_id_middleware;
use crate::models::{HttpModelCaller, ModelCaller, ModelRegistry};
use crate::orchestration::{OrchestrationContext, Orchestrator};
use axum::Router;
use axum::routing::{get, post};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod chat;
pub mod extractor;
pub mod health;
pub mod metrics;
pub mod patterns;

/// State shared by every handler; all fields are `Arc` so clones are cheap
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    orchestrator: Arc<Orchestrator>,
    collector: Arc<MetricsCollector>,
    metrics: Arc<Metrics>,
}

impl AppState {
    /// Wire the full stack from configuration with the HTTP model caller
    pub fn new(config: Config) -> AppResult<Self> {
        let caller = Arc::new(HttpModelCaller::new()?);
        Self::with_caller(config, caller)
    }

    /// Wire the full stack with a caller of your choice
    pub fn with_caller(config: Config, caller: Arc<dyn ModelCaller>) -> AppResult<Self> {
        let metrics = Arc::new(Metrics::new().map_err(|e| {
            AppError::Internal(format!("Failed to initialize metrics: {e}"))
        })?);
        let collector = Arc::new(MetricsCollector::from_config(&config, metrics.clone())?);
        let registry = Arc::new(ModelRegistry::from_config(&config)?);

        let ctx = OrchestrationContext::new(registry, caller, collector.clone())
            .with_settings(config.orchestration.clone());

        Ok(Self {
            config: Arc::new(config),
            orchestrator: Arc::new(Orchestrator::new(ctx)),
            collector,
            metrics,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    pub fn collector(&self) -> &MetricsCollector {
        &self.collector
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}

/// Every route, with tracing and request ids
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::info))
        .route("/health", get(health::handler))
        .route("/route", post(patterns::route))
        .route("/cascade", post(patterns::cascade))
        .route("/ensemble", post(patterns::ensemble))
        .route("/chat", post(chat::handler))
        .route("/metrics", get(metrics::summary))
        .route("/metrics/prometheus", get(metrics::prometheus))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        r#"
[server]
host = "127.0.0.1"
port = 8000

[models.fast]
name = "gemini_25_flash"
model = "gemini-2.5-flash"
base_url = "http://localhost:1234/v1"
max_tokens = 1024

[models.strong]
name = "gemini_25_pro"
model = "gemini-2.5-pro"
base_url = "http://localhost:1234/v1"
max_tokens = 1024

[models.cheap]
name = "gemini_20_flash"
model = "gemini-2.0-flash"
base_url = "http://localhost:1234/v1"
max_tokens = 1024
"#
        .parse()
        .unwrap()
    }

    #[test]
    fn test_appstate_wires_components() {
        let state = AppState::new(test_config()).unwrap();
        assert_eq!(state.config().server.port, 8000);
        assert_eq!(
            state.orchestrator().context().registry().cheap().name(),
            "gemini_20_flash"
        );
        assert!(state.collector().is_empty());
    }

    #[test]
    fn test_appstate_is_clonable() {
        let state = AppState::new(test_config()).unwrap();
        let clone = state.clone();
        assert!(Arc::ptr_eq(&state.orchestrator, &clone.orchestrator));
    }
}
