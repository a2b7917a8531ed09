//! Prometheus metrics for Triproute
//!
//! Tracks:
//! - Requests by resolved pattern
//! - Model calls by pattern, model and outcome
//! - Model call latency by pattern
//! - Fallback paths taken by the cascade and ensemble
//! - Estimated spend by model
//! - Ledger sink failures
//!
//! Exposed at `/metrics/prometheus` in Prometheus text format. The JSON
//! summary at `/metrics` comes from the call ledger instead.

use crate::orchestration::Pattern;
use prometheus::{
    CounterVec, Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Call outcome label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Failure => "failure",
        }
    }
}

impl From<bool> for Outcome {
    fn from(success: bool) -> Self {
        if success {
            Outcome::Success
        } else {
            Outcome::Failure
        }
    }
}

/// Degraded path taken by a pattern
///
/// Restricting labels to an enum keeps cardinality fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackKind {
    /// Cascade escalated from the cheap to the strong model
    Escalated,
    /// Cascade fell through to the creative model
    CreativeFallback,
    /// Cascade ran out of models
    Exhausted,
    /// Ensemble had exactly one usable answer
    SingleModel,
    /// Ensemble synthesis failed or was blank; longest answer used
    LongestAnswer,
    /// Ensemble had no usable answer
    AllFailed,
}

impl FallbackKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackKind::Escalated => "escalated",
            FallbackKind::CreativeFallback => "creative_fallback",
            FallbackKind::Exhausted => "exhausted",
            FallbackKind::SingleModel => "single_model",
            FallbackKind::LongestAnswer => "longest_answer",
            FallbackKind::AllFailed => "all_failed",
        }
    }
}

/// Prometheus registry and handles
#[derive(Clone)]
pub struct Metrics {
    pub registry: Arc<Registry>,
    requests_total: IntCounterVec,
    model_calls: IntCounterVec,
    call_duration: HistogramVec,
    fallbacks: IntCounterVec,
    estimated_cost: CounterVec,
    sink_failures: IntCounterVec,
    metrics_recording_failures: IntCounterVec,
}

impl Metrics {
    /// Create and register all metrics with a fresh registry
    ///
    /// # Errors
    ///
    /// Returns an error if metric registration fails (e.g., duplicate names).
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        // Cardinality: 4 patterns
        let requests_total = IntCounterVec::new(
            Opts::new(
                "triproute_requests_total",
                "Total orchestration requests by resolved pattern",
            ),
            &["pattern"],
        )?;

        // Cardinality: 4 patterns x configured models x 2 outcomes
        let model_calls = IntCounterVec::new(
            Opts::new(
                "triproute_model_calls_total",
                "Total model calls by pattern, model and outcome",
            ),
            &["pattern", "model", "outcome"],
        )?;

        // Model calls are seconds-scale; buckets run from 50ms to 2 minutes
        let call_duration = HistogramVec::new(
            HistogramOpts::new(
                "triproute_model_call_duration_ms",
                "Model call latency in milliseconds",
            )
            .buckets(vec![
                50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0, 30000.0, 60000.0,
                120000.0,
            ]),
            &["pattern"],
        )?;

        let fallbacks = IntCounterVec::new(
            Opts::new(
                "triproute_fallbacks_total",
                "Degraded paths taken by the cascade and ensemble patterns",
            ),
            &["pattern", "kind"],
        )?;

        let estimated_cost = CounterVec::new(
            Opts::new(
                "triproute_estimated_cost_usd_total",
                "Estimated spend in USD by model (chars/4 token estimate)",
            ),
            &["model"],
        )?;

        let sink_failures = IntCounterVec::new(
            Opts::new(
                "triproute_ledger_sink_failures_total",
                "Call records a ledger sink failed to accept. \
                Calls still succeed; only the external record is lost.",
            ),
            &["sink"],
        )?;

        let metrics_recording_failures = IntCounterVec::new(
            Opts::new(
                "triproute_metrics_recording_failures_total",
                "Total number of metrics recording failures by operation",
            ),
            &["operation"],
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(model_calls.clone()))?;
        registry.register(Box::new(call_duration.clone()))?;
        registry.register(Box::new(fallbacks.clone()))?;
        registry.register(Box::new(estimated_cost.clone()))?;
        registry.register(Box::new(sink_failures.clone()))?;
        registry.register(Box::new(metrics_recording_failures.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            requests_total,
            model_calls,
            call_duration,
            fallbacks,
            estimated_cost,
            sink_failures,
            metrics_recording_failures,
        })
    }

    pub fn record_request(&self, pattern: Pattern) -> Result<(), prometheus::Error> {
        self.requests_total
            .get_metric_with_label_values(&[pattern.as_str()])?
            .inc();
        Ok(())
    }

    /// Record one model call
    ///
    /// # Errors
    ///
    /// Returns an error if the latency is NaN, infinite or negative, since
    /// those values corrupt histogram percentiles.
    pub fn record_model_call(
        &self,
        pattern: Pattern,
        model: &str,
        outcome: Outcome,
        latency_ms: f64,
    ) -> Result<(), prometheus::Error> {
        if !latency_ms.is_finite() || latency_ms < 0.0 {
            return Err(prometheus::Error::Msg(format!(
                "Histogram value must be finite and non-negative, got: {}",
                latency_ms
            )));
        }

        self.model_calls
            .get_metric_with_label_values(&[pattern.as_str(), model, outcome.as_str()])?
            .inc();
        self.call_duration
            .get_metric_with_label_values(&[pattern.as_str()])?
            .observe(latency_ms);
        Ok(())
    }

    pub fn record_fallback(
        &self,
        pattern: Pattern,
        kind: FallbackKind,
    ) -> Result<(), prometheus::Error> {
        self.fallbacks
            .get_metric_with_label_values(&[pattern.as_str(), kind.as_str()])?
            .inc();
        Ok(())
    }

    pub fn record_cost(&self, model: &str, cost_usd: f64) -> Result<(), prometheus::Error> {
        if !cost_usd.is_finite() || cost_usd < 0.0 {
            return Err(prometheus::Error::Msg(format!(
                "Cost must be finite and non-negative, got: {}",
                cost_usd
            )));
        }
        self.estimated_cost
            .get_metric_with_label_values(&[model])?
            .inc_by(cost_usd);
        Ok(())
    }

    pub fn sink_failure(&self, sink: &str) {
        self.sink_failures.with_label_values(&[sink]).inc();
    }

    /// Sum of sink failures across all sinks
    pub fn sink_failures_count(&self) -> u64 {
        self.sum_counter("triproute_ledger_sink_failures_total")
    }

    /// Count a failed `record_*` call
    ///
    /// Metrics are best effort: the request continues, the failure is logged
    /// by the caller and surfaced here.
    pub fn metrics_recording_failure(&self, operation: &str) {
        self.metrics_recording_failures
            .with_label_values(&[operation])
            .inc();
    }

    pub fn metrics_recording_failures_count(&self) -> u64 {
        self.sum_counter("triproute_metrics_recording_failures_total")
    }

    fn sum_counter(&self, name: &str) -> u64 {
        self.registry
            .gather()
            .iter()
            .find(|mf| mf.name() == name)
            .map(|mf| {
                mf.get_metric()
                    .iter()
                    .map(|m| m.counter.value.unwrap_or(0.0) as u64)
                    .sum()
            })
            .unwrap_or(0)
    }

    /// Gather all metrics and encode them in Prometheus text format
    ///
    /// # Errors
    ///
    /// Returns an error if metric encoding fails.
    pub fn gather(&self) -> Result<String, prometheus::Error> {
        let metric_families = self.registry.gather();
        let metric_count = metric_families.len();

        tracing::debug!(
            metric_family_count = metric_count,
            "Encoding metrics to Prometheus text format"
        );

        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();

        encoder.encode(&metric_families, &mut buffer).map_err(|e| {
            tracing::error!(
                error = %e,
                metric_family_count = metric_count,
                "Prometheus text encoder failed"
            );
            prometheus::Error::Msg(format!(
                "Failed to encode {} metric families: {}",
                metric_count, e
            ))
        })?;

        String::from_utf8(buffer).map_err(|e| {
            prometheus::Error::Msg(format!(
                "Failed to convert metrics to UTF-8 at byte {}: {}",
                e.utf8_error().valid_up_to(),
                e
            ))
        })
    }
}
