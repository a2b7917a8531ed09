//! Aggregate statistics over the call ledger

use crate::collector::record::{CallRecord, round_to};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Per-pattern or per-model statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Breakdown {
    pub calls: usize,
    pub successful: usize,
    pub total_latency_ms: f64,
    pub avg_latency_ms: f64,
    /// Percent, 2 decimals
    pub success_rate: f64,
}

impl Breakdown {
    fn add(&mut self, record: &CallRecord) {
        self.calls += 1;
        self.total_latency_ms += record.latency_ms;
        if record.success {
            self.successful += 1;
        }
    }

    fn finish(&mut self) {
        self.total_latency_ms = round_to(self.total_latency_ms, 2);
        self.avg_latency_ms = average(self.total_latency_ms, self.calls);
        self.success_rate = percent(self.successful, self.calls);
    }
}

/// Ledger summary
///
/// A pure function of the records; an empty ledger yields zeros and a
/// message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_calls: usize,
    pub successful_calls: usize,
    /// Percent, 2 decimals
    pub success_rate: f64,
    pub total_latency_ms: f64,
    pub avg_latency_ms: f64,
    pub total_tokens: u64,
    pub total_estimated_cost_usd: f64,
    pub patterns: BTreeMap<String, Breakdown>,
    pub models: BTreeMap<String, Breakdown>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

fn average(total: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        round_to(total / count as f64, 2)
    }
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        round_to(part as f64 / whole as f64 * 100.0, 2)
    }
}

impl Summary {
    pub fn from_records(records: &[CallRecord]) -> Self {
        if records.is_empty() {
            return Self {
                message: Some("No metrics collected yet".to_string()),
                ..Self::default()
            };
        }

        let mut patterns: BTreeMap<String, Breakdown> = BTreeMap::new();
        let mut models: BTreeMap<String, Breakdown> = BTreeMap::new();
        let mut successful_calls = 0;
        let mut total_latency = 0.0;
        let mut total_tokens = 0;
        let mut total_cost = 0.0;

        for record in records {
            patterns
                .entry(record.pattern.as_str().to_string())
                .or_default()
                .add(record);
            models.entry(record.model.clone()).or_default().add(record);

            if record.success {
                successful_calls += 1;
            }
            total_latency += record.latency_ms;
            total_tokens += record.total_tokens();
            total_cost += record.estimated_cost_usd();
        }

        patterns.values_mut().for_each(Breakdown::finish);
        models.values_mut().for_each(Breakdown::finish);

        Self {
            total_calls: records.len(),
            successful_calls,
            success_rate: percent(successful_calls, records.len()),
            total_latency_ms: round_to(total_latency, 2),
            avg_latency_ms: average(total_latency, records.len()),
            total_tokens,
            total_estimated_cost_usd: round_to(total_cost, 6),
            patterns,
            models,
            message: None,
        }
    }
}

fn write_breakdowns(
    f: &mut fmt::Formatter<'_>,
    title: &str,
    rows: &BTreeMap<String, Breakdown>,
    upper: bool,
) -> fmt::Result {
    writeln!(f, "\n{title}:")?;
    for (name, stats) in rows {
        let name = if upper {
            name.to_uppercase()
        } else {
            name.clone()
        };
        writeln!(f, "  {name}:")?;
        writeln!(f, "    Calls:           {}", stats.calls)?;
        writeln!(f, "    Avg Latency:     {}ms", stats.avg_latency_ms)?;
        writeln!(f, "    Success Rate:    {}%", stats.success_rate)?;
    }
    Ok(())
}

/// Console table, as printed by `triproute ask`
impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(70);
        if self.total_calls == 0 {
            writeln!(f, "{rule}")?;
            writeln!(f, "No metrics collected yet")?;
            return writeln!(f, "{rule}");
        }

        writeln!(f, "{rule}")?;
        writeln!(f, "ORCHESTRATION METRICS SUMMARY")?;
        writeln!(f, "{rule}")?;
        writeln!(f, "\nOverall Statistics:")?;
        writeln!(f, "  Total Calls:        {}", self.total_calls)?;
        writeln!(f, "  Successful Calls:   {}", self.successful_calls)?;
        writeln!(f, "  Success Rate:       {}%", self.success_rate)?;
        writeln!(f, "  Total Latency:      {:.2}ms", self.total_latency_ms)?;
        writeln!(f, "  Average Latency:    {:.2}ms", self.avg_latency_ms)?;
        writeln!(f, "  Estimated Tokens:   {}", self.total_tokens)?;
        writeln!(f, "  Estimated Cost:     ${:.6}", self.total_estimated_cost_usd)?;

        write_breakdowns(f, "Per-Pattern Statistics", &self.patterns, true)?;
        write_breakdowns(f, "Per-Model Statistics", &self.models, false)?;
        writeln!(f, "{rule}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::record::{Metadata, ModelCall};
    use crate::orchestration::Pattern;

    fn record(pattern: Pattern, model: &str, latency_ms: f64, success: bool) -> CallRecord {
        let mut metadata = Metadata::new();
        metadata.insert("total_tokens".to_string(), 10.into());
        metadata.insert("estimated_cost_usd".to_string(), 0.001.into());
        CallRecord::new(
            &ModelCall {
                pattern,
                model,
                query: "query",
                response: Some("response"),
                latency_ms,
                success,
            },
            metadata,
        )
    }

    #[test]
    fn test_empty_summary_has_message() {
        let summary = Summary::from_records(&[]);
        assert_eq!(summary.total_calls, 0);
        assert_eq!(summary.success_rate, 0.0);
        assert_eq!(summary.message.as_deref(), Some("No metrics collected yet"));
        assert!(summary.to_string().contains("No metrics collected yet"));
    }

    #[test]
    fn test_summary_totals_and_breakdowns() {
        let records = vec![
            record(Pattern::Cascade, "gemini_20_flash", 100.0, true),
            record(Pattern::Cascade, "gemini_25_pro", 300.0, true),
            record(Pattern::Router, "gemini_25_flash", 50.0, false),
        ];
        let summary = Summary::from_records(&records);

        assert_eq!(summary.total_calls, 3);
        assert_eq!(summary.successful_calls, 2);
        assert_eq!(summary.success_rate, 66.67);
        assert_eq!(summary.total_latency_ms, 450.0);
        assert_eq!(summary.avg_latency_ms, 150.0);
        assert_eq!(summary.total_tokens, 30);
        assert!((summary.total_estimated_cost_usd - 0.003).abs() < 1e-9);
        assert!(summary.message.is_none());

        let cascade = &summary.patterns["cascade"];
        assert_eq!(cascade.calls, 2);
        assert_eq!(cascade.avg_latency_ms, 200.0);
        assert_eq!(cascade.success_rate, 100.0);

        let router = &summary.patterns["router"];
        assert_eq!(router.success_rate, 0.0);
        assert_eq!(summary.models.len(), 3);
    }

    #[test]
    fn test_summary_display_lists_patterns() {
        let summary = Summary::from_records(&[record(Pattern::Ensemble, "gemini_25_pro", 10.0, true)]);
        let table = summary.to_string();
        assert!(table.contains("ORCHESTRATION METRICS SUMMARY"));
        assert!(table.contains("ENSEMBLE:"));
        assert!(table.contains("gemini_25_pro:"));
    }

    #[test]
    fn test_populated_summary_serializes_without_message() {
        let json = serde_json::to_value(Summary::from_records(&[
            record(Pattern::Direct, "gemini_25_flash", 1.0, true),
        ]))
        .unwrap();
        assert!(json.get("message").is_none());
        assert_eq!(json["patterns"]["direct"]["calls"], 1);
    }
}
