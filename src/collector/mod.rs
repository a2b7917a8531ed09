//! Call ledger and cost collector
//!
//! Every model call made by a pattern lands here as an immutable
//! [`CallRecord`]. The ledger is append-only for the process lifetime;
//! summaries are computed from it on demand. Nothing in this module can
//! fail a pattern call: sink errors, sink panics and Prometheus errors are
//! logged and counted.

pub mod pricing;
pub mod record;
pub mod sink;
pub mod summary;

pub use pricing::{ModelPrice, PriceTable, estimate_tokens};
pub use record::{CallRecord, Metadata, ModelCall};
pub use sink::{CallSink, JsonlSink, SinkError};
pub use summary::{Breakdown, Summary};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::metrics::{Metrics, Outcome};
use record::round_to;
use serde_json::json;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

/// Append-only call ledger with cost estimation
pub struct MetricsCollector {
    records: RwLock<Vec<CallRecord>>,
    prices: PriceTable,
    sinks: Vec<Arc<dyn CallSink>>,
    metrics: Option<Arc<Metrics>>,
    sink_failures: AtomicU64,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCollector {
    /// Empty ledger with the default price table and no sinks
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            prices: PriceTable::default(),
            sinks: Vec::new(),
            metrics: None,
            sink_failures: AtomicU64::new(0),
        }
    }

    pub fn with_prices(mut self, prices: PriceTable) -> Self {
        self.prices = prices;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn CallSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Collector wired from configuration
    ///
    /// Applies `[pricing]` overrides and opens the `[ledger] record_file`
    /// sink when configured.
    pub fn from_config(config: &Config, metrics: Arc<Metrics>) -> AppResult<Self> {
        let collector = Self::new()
            .with_prices(PriceTable::with_overrides(&config.pricing))
            .with_metrics(metrics);

        match &config.ledger.record_file {
            Some(path) => {
                let sink = JsonlSink::open(path).map_err(|e| {
                    AppError::Config(format!("ledger.record_file: {}", e))
                })?;
                tracing::info!(path = %path.display(), "Appending call records to JSONL file");
                Ok(collector.with_sink(Arc::new(sink)))
            }
            None => Ok(collector),
        }
    }

    pub fn metrics(&self) -> Option<&Metrics> {
        self.metrics.as_deref()
    }

    /// Record one model call
    ///
    /// Token counts are chars/4 estimates for the prompt and the response;
    /// cost comes from the price table (zero for unknown models). Caller
    /// metadata is merged over the computed fields.
    pub fn log_call(&self, call: ModelCall<'_>, metadata: Metadata) {
        let input_tokens = estimate_tokens(call.query);
        let output_tokens = call.response.map(estimate_tokens).unwrap_or(0);
        let cost_usd = self.prices.estimate(call.model, input_tokens, output_tokens);

        let mut full = Metadata::new();
        full.insert("input_tokens".to_string(), json!(input_tokens));
        full.insert("output_tokens".to_string(), json!(output_tokens));
        full.insert(
            record::TOTAL_TOKENS.to_string(),
            json!(input_tokens + output_tokens),
        );
        full.insert(
            record::ESTIMATED_COST_USD.to_string(),
            json!(round_to(cost_usd, 6)),
        );
        full.extend(metadata);

        let record = CallRecord::new(&call, full);

        tracing::info!(
            pattern = %call.pattern,
            model = %call.model,
            latency_ms = record.latency_ms,
            success = call.success,
            tokens = input_tokens + output_tokens,
            estimated_cost_usd = cost_usd,
            "Model call recorded"
        );

        self.record_prometheus(&call, cost_usd);
        self.forward_to_sinks(&record);

        self.records
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(record);
    }

    fn record_prometheus(&self, call: &ModelCall<'_>, cost_usd: f64) {
        let Some(metrics) = &self.metrics else {
            return;
        };

        if let Err(e) = metrics.record_model_call(
            call.pattern,
            call.model,
            Outcome::from(call.success),
            call.latency_ms,
        ) {
            tracing::warn!(error = %e, model = %call.model, "Failed to record model call metric");
            metrics.metrics_recording_failure("record_model_call");
        }

        if cost_usd > 0.0
            && let Err(e) = metrics.record_cost(call.model, cost_usd)
        {
            tracing::warn!(error = %e, model = %call.model, "Failed to record cost metric");
            metrics.metrics_recording_failure("record_cost");
        }
    }

    fn forward_to_sinks(&self, record: &CallRecord) {
        for sink in &self.sinks {
            let failure = match catch_unwind(AssertUnwindSafe(|| sink.record(record))) {
                Ok(Ok(())) => None,
                Ok(Err(e)) => Some(e.to_string()),
                Err(_) => Some("sink panicked".to_string()),
            };

            if let Some(reason) = failure {
                tracing::warn!(
                    sink = %sink.name(),
                    model = %record.model,
                    error = %reason,
                    "Call sink failed; record kept in memory ledger only"
                );
                self.count_sink_failure(sink.as_ref());
            }
        }
    }

    /// Block until every sink has persisted what it accepted
    ///
    /// Called before the process exits. Failures are logged and counted like
    /// record failures.
    pub fn flush_sinks(&self) {
        for sink in &self.sinks {
            let failure = match catch_unwind(AssertUnwindSafe(|| sink.flush())) {
                Ok(Ok(())) => None,
                Ok(Err(e)) => Some(e.to_string()),
                Err(_) => Some("sink panicked".to_string()),
            };

            if let Some(reason) = failure {
                tracing::warn!(sink = %sink.name(), error = %reason, "Call sink flush failed");
                self.count_sink_failure(sink.as_ref());
            }
        }
    }

    fn count_sink_failure(&self, sink: &dyn CallSink) {
        self.sink_failures.fetch_add(1, Ordering::Relaxed);
        if let Some(metrics) = &self.metrics {
            metrics.sink_failure(sink.name());
        }
    }

    /// Snapshot of every record in insertion order
    pub fn records(&self) -> Vec<CallRecord> {
        self.records
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sink failures since start-up
    pub fn sink_failures(&self) -> u64 {
        self.sink_failures.load(Ordering::Relaxed)
    }

    pub fn summary(&self) -> Summary {
        let records = self
            .records
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Summary::from_records(&records)
    }

    /// Write `{summary, detailed_metrics}` to `dir/metrics_<timestamp>.json`
    pub fn save_snapshot(&self, dir: impl AsRef<Path>) -> AppResult<PathBuf> {
        let dir = dir.as_ref();
        let path = dir.join(format!(
            "metrics_{}.json",
            chrono::Utc::now().format("%Y%m%d_%H%M%S")
        ));
        let snapshot_err = |reason: String| AppError::Snapshot {
            path: path.display().to_string(),
            reason,
        };

        let body = json!({
            "summary": self.summary(),
            "detailed_metrics": self.records(),
        });
        let content =
            serde_json::to_string_pretty(&body).map_err(|e| snapshot_err(e.to_string()))?;

        std::fs::create_dir_all(dir).map_err(|e| snapshot_err(e.to_string()))?;
        std::fs::write(&path, content).map_err(|e| snapshot_err(e.to_string()))?;

        tracing::info!(path = %path.display(), records = self.len(), "Metrics snapshot saved");
        Ok(path)
    }
}
