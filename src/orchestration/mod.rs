//! Orchestration patterns
//!
//! - [`router::Router`]: one model chosen by query class
//! - [`cascade::Cascade`]: cheap model first, strong model on low confidence
//! - [`ensemble::Ensemble`]: several models, answers merged by a synthesis call
//! - [`facade::Orchestrator`]: single entry point with explicit or automatic
//!   strategy selection
//!
//! Every pattern receives an [`OrchestrationContext`] at construction and
//! makes its model calls through [`OrchestrationContext::invoke`], which
//! times and records each call.

pub mod cascade;
pub mod ensemble;
pub mod facade;
pub mod router;

pub use cascade::{Cascade, CascadeResult, CascadeStage, FallbackReason};
pub use ensemble::{CombineStrategy, Ensemble, EnsembleResult, Slate};
pub use facade::{Orchestrator, PatternOutcome};
pub use router::{RouteDecision, Router, RouterResult};

use crate::collector::{Metadata, MetricsCollector, ModelCall};
use crate::config::OrchestrationConfig;
use crate::error::{AppError, ModelCallError};
use crate::metrics::FallbackKind;
use crate::models::{ModelCaller, ModelHandle, ModelRegistry};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

/// Pattern that issued a model call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pattern {
    Router,
    Cascade,
    Ensemble,
    /// Single fast-model call without orchestration
    Direct,
}

impl Pattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pattern::Router => "router",
            Pattern::Cascade => "cascade",
            Pattern::Ensemble => "ensemble",
            Pattern::Direct => "direct",
        }
    }
}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strategy requested by a caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Pattern(Pattern),
    /// Pick a pattern from the query's class
    Auto,
}

impl Strategy {
    pub const ACCEPTED: &'static str = "router, cascade, ensemble, direct, auto";
}

impl FromStr for Strategy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "router" => Ok(Strategy::Pattern(Pattern::Router)),
            "cascade" => Ok(Strategy::Pattern(Pattern::Cascade)),
            "ensemble" => Ok(Strategy::Pattern(Pattern::Ensemble)),
            "direct" => Ok(Strategy::Pattern(Pattern::Direct)),
            "auto" => Ok(Strategy::Auto),
            _ => Err(AppError::InvalidStrategy {
                given: s.to_string(),
                accepted: Self::ACCEPTED,
            }),
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::Pattern(pattern) => pattern.fmt(f),
            Strategy::Auto => f.write_str("auto"),
        }
    }
}

/// Build a metadata map from key/value pairs
pub fn metadata<const N: usize>(pairs: [(&str, serde_json::Value); N]) -> Metadata {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

/// Shared dependencies of every pattern
#[derive(Clone)]
pub struct OrchestrationContext {
    registry: Arc<ModelRegistry>,
    caller: Arc<dyn ModelCaller>,
    collector: Arc<MetricsCollector>,
    settings: OrchestrationConfig,
}

impl OrchestrationContext {
    pub fn new(
        registry: Arc<ModelRegistry>,
        caller: Arc<dyn ModelCaller>,
        collector: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            registry,
            caller,
            collector,
            settings: OrchestrationConfig::default(),
        }
    }

    pub fn with_settings(mut self, settings: OrchestrationConfig) -> Self {
        self.settings = settings;
        self
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn collector(&self) -> &MetricsCollector {
        &self.collector
    }

    pub fn settings(&self) -> &OrchestrationConfig {
        &self.settings
    }

    /// Call a model, then record the call with `tags`
    ///
    /// Failures are recorded with `error` and `error_kind` tags and returned
    /// unchanged; what a failure means is the pattern's decision.
    pub async fn invoke(
        &self,
        pattern: Pattern,
        handle: &ModelHandle,
        prompt: &str,
        mut tags: Metadata,
    ) -> Result<String, ModelCallError> {
        let start = Instant::now();
        let result = self.caller.invoke(handle, prompt).await;
        let latency_ms = start.elapsed().as_secs_f64() * 1000.0;

        if let Err(e) = &result {
            tracing::warn!(
                pattern = %pattern,
                model = %handle.name(),
                error = %e,
                latency_ms,
                "Model call failed"
            );
            tags.insert("error".to_string(), e.to_string().into());
            tags.insert("error_kind".to_string(), e.kind_label().into());
        }

        self.collector.log_call(
            ModelCall {
                pattern,
                model: handle.name(),
                query: prompt,
                response: result.as_deref().ok(),
                latency_ms,
                success: result.is_ok(),
            },
            tags,
        );

        result
    }

    /// Count a degraded path; failures are logged and swallowed
    pub fn record_fallback(&self, pattern: Pattern, kind: FallbackKind) {
        if let Some(metrics) = self.collector.metrics()
            && let Err(e) = metrics.record_fallback(pattern, kind)
        {
            tracing::warn!(error = %e, pattern = %pattern, "Failed to record fallback metric");
            metrics.metrics_recording_failure("record_fallback");
        }
    }
}
