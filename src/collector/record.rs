//! Immutable call records

use crate::orchestration::Pattern;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Free-form tags attached to a record
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Characters of the query kept in `query_preview`
pub const PREVIEW_CHARS: usize = 50;

/// Metadata key for the estimated total token count
pub const TOTAL_TOKENS: &str = "total_tokens";
/// Metadata key for the estimated cost
pub const ESTIMATED_COST_USD: &str = "estimated_cost_usd";

/// One model call as seen by the collector
#[derive(Debug, Clone, Copy)]
pub struct ModelCall<'a> {
    pub pattern: Pattern,
    pub model: &'a str,
    /// Prompt sent to the model
    pub query: &'a str,
    /// Model output; `None` when the call failed
    pub response: Option<&'a str>,
    pub latency_ms: f64,
    pub success: bool,
}

/// One row of the call ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRecord {
    pub timestamp: DateTime<Utc>,
    pub pattern: Pattern,
    pub model: String,
    /// Query length in characters
    pub query_length: usize,
    pub query_preview: String,
    /// Latency rounded to 2 decimals
    pub latency_ms: f64,
    pub success: bool,
    pub metadata: Metadata,
}

impl CallRecord {
    pub fn new(call: &ModelCall<'_>, metadata: Metadata) -> Self {
        Self {
            timestamp: Utc::now(),
            pattern: call.pattern,
            model: call.model.to_string(),
            query_length: call.query.chars().count(),
            query_preview: preview(call.query),
            latency_ms: round_to(call.latency_ms, 2),
            success: call.success,
            metadata,
        }
    }

    pub fn total_tokens(&self) -> u64 {
        self.metadata
            .get(TOTAL_TOKENS)
            .and_then(|v| v.as_u64())
            .unwrap_or(0)
    }

    pub fn estimated_cost_usd(&self) -> f64 {
        self.metadata
            .get(ESTIMATED_COST_USD)
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0)
    }
}

/// First 50 characters, with `...` appended when the query is longer
pub fn preview(query: &str) -> String {
    let mut chars = query.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
