//! Ensemble pattern
//!
//! Queries a slate of two models concurrently and merges their answers with
//! one synthesis call. Slot failures are isolated: a failed model becomes an
//! `Error: ...` placeholder in `raw_answers` and is left out of the merge.
//! The ensemble always returns a result; total failure is flagged with
//! `error = true`.

use crate::heuristics::is_creative;
use crate::metrics::FallbackKind;
use crate::models::{ModelHandle, ModelRole};
use crate::orchestration::{OrchestrationContext, Pattern, metadata};
use futures::future::join_all;
use serde::Serialize;
use std::collections::BTreeMap;

pub const ALL_FAILED_ANSWER: &str = "All models failed to generate answers";

/// Which models an ensemble consults
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Slate {
    /// Creative query: creative + strong
    Creative,
    /// Creative query without a creative model: fast + strong
    CreativeDegraded,
    /// Everything else: fast + strong
    Standard,
}

impl Slate {
    pub fn for_query(query: &str, has_creative: bool) -> Self {
        match (is_creative(query), has_creative) {
            (true, true) => Slate::Creative,
            (true, false) => Slate::CreativeDegraded,
            (false, _) => Slate::Standard,
        }
    }

    /// `ensemble_strategy` tag on every slate call
    pub fn tag(&self) -> &'static str {
        match self {
            Slate::Creative => "creative_ensemble",
            Slate::CreativeDegraded => "creative_degraded_ensemble",
            Slate::Standard => "standard_ensemble",
        }
    }

    /// Roles consulted, in call order
    pub fn roles(&self) -> [ModelRole; 2] {
        match self {
            Slate::Creative => [ModelRole::Creative, ModelRole::Strong],
            Slate::CreativeDegraded | Slate::Standard => [ModelRole::Fast, ModelRole::Strong],
        }
    }
}

/// How the final answer was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CombineStrategy {
    /// Synthesis call merged two or more answers
    Summary,
    /// Only one slot produced an answer
    SingleModel,
    /// Synthesis failed; longest answer used
    Longest,
    /// Synthesis returned nothing; longest answer used
    LongestFallback,
    /// No slot produced an answer
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnsembleResult {
    /// Slate model names in call order
    pub models_called: Vec<String>,
    /// Answer or `Error: ...` placeholder per slate model
    pub raw_answers: BTreeMap<String, String>,
    pub final_answer: String,
    pub strategy: CombineStrategy,
    pub slate: Slate,
    pub error: bool,
}

/// Prompt asking one model to merge several labelled answers
pub fn synthesis_prompt(query: &str, answers: &[(&str, &str)]) -> String {
    let mut combined = String::new();
    for (i, (model, answer)) in answers.iter().enumerate() {
        combined.push_str(&format!("\n\n--- Answer {} from {model} ---\n{answer}", i + 1));
    }

    format!(
        "You are given multiple answers to the same question from different AI models.\n\
         Please analyze these answers and create a single, comprehensive response that:\n\
         1. Combines the best insights from all answers\n\
         2. Removes redundancy\n\
         3. Maintains accuracy and coherence\n\
         4. Provides the most helpful response to the user\n\
         \n\
         Original question: {query}\n\
         \n\
         Multiple answers:{combined}\n\
         \n\
         Please provide a unified, high-quality answer:"
    )
}

/// Longest answer by character count; the earliest wins a tie
fn longest<'a>(answers: &[(&str, &'a str)]) -> &'a str {
    answers
        .iter()
        .map(|(_, answer)| *answer)
        .reduce(|best, next| {
            if next.chars().count() > best.chars().count() {
                next
            } else {
                best
            }
        })
        .unwrap_or_default()
}

pub struct Ensemble {
    ctx: OrchestrationContext,
}

impl Ensemble {
    pub fn new(ctx: OrchestrationContext) -> Self {
        Self { ctx }
    }

    fn slate_handles(&self, slate: Slate) -> Vec<&ModelHandle> {
        let registry = self.ctx.registry();
        slate
            .roles()
            .into_iter()
            .filter_map(|role| registry.get(role))
            .collect()
    }

    fn synthesis_handle(&self) -> &ModelHandle {
        let registry = self.ctx.registry();
        registry
            .get(self.ctx.settings().synthesis_model)
            .unwrap_or_else(|| registry.strong())
    }

    pub async fn answer(&self, query: &str) -> EnsembleResult {
        let slate = Slate::for_query(query, self.ctx.registry().creative().is_some());
        let handles = self.slate_handles(slate);
        if slate == Slate::CreativeDegraded {
            tracing::warn!("Creative query but no creative model configured; using fast + strong");
        }

        tracing::info!(
            slate = %slate.tag(),
            models = handles.len(),
            "Ensemble calling models concurrently"
        );

        let calls = handles.iter().map(|handle| {
            self.ctx.invoke(
                Pattern::Ensemble,
                handle,
                query,
                metadata([
                    ("ensemble_strategy", slate.tag().into()),
                    ("model_count", handles.len().into()),
                ]),
            )
        });
        let results = join_all(calls).await;

        let models_called: Vec<String> = handles.iter().map(|h| h.name().to_string()).collect();
        let mut raw_answers = BTreeMap::new();
        let mut valid: Vec<(&str, &str)> = Vec::new();
        for (handle, result) in handles.iter().zip(&results) {
            match result {
                Ok(answer) => {
                    raw_answers.insert(handle.name().to_string(), answer.clone());
                    if !answer.trim().is_empty() {
                        valid.push((handle.name(), answer.as_str()));
                    }
                }
                Err(e) => {
                    raw_answers.insert(handle.name().to_string(), format!("Error: {e}"));
                }
            }
        }

        let result = move |final_answer: String, strategy: CombineStrategy| EnsembleResult {
            models_called,
            raw_answers,
            error: strategy == CombineStrategy::Error,
            final_answer,
            strategy,
            slate,
        };

        match valid.as_slice() {
            [] => {
                tracing::error!(slate = %slate.tag(), "Every ensemble model failed");
                self.ctx.record_fallback(Pattern::Ensemble, FallbackKind::AllFailed);
                result(ALL_FAILED_ANSWER.to_string(), CombineStrategy::Error)
            }
            [(model, answer)] => {
                tracing::info!(model = %model, "Only one ensemble model answered");
                self.ctx.record_fallback(Pattern::Ensemble, FallbackKind::SingleModel);
                result(answer.to_string(), CombineStrategy::SingleModel)
            }
            _ => {
                let (answer, strategy) = self.synthesize(query, &valid).await;
                result(answer, strategy)
            }
        }
    }

    async fn synthesize(&self, query: &str, valid: &[(&str, &str)]) -> (String, CombineStrategy) {
        let handle = self.synthesis_handle();
        let merged: Vec<&str> = valid.iter().map(|(model, _)| *model).collect();
        let prompt = synthesis_prompt(query, valid);

        tracing::info!(
            model = %handle.name(),
            answers = valid.len(),
            "Merging ensemble answers"
        );

        let synthesis = self
            .ctx
            .invoke(
                Pattern::Ensemble,
                handle,
                &prompt,
                metadata([
                    ("ensemble_strategy", "merge_synthesis".into()),
                    ("models_merged", merged.into()),
                ]),
            )
            .await;

        match synthesis {
            Ok(answer) if !answer.trim().is_empty() => (answer, CombineStrategy::Summary),
            Ok(_) => {
                tracing::warn!(model = %handle.name(), "Synthesis returned nothing; using longest answer");
                self.ctx.record_fallback(Pattern::Ensemble, FallbackKind::LongestAnswer);
                (longest(valid).to_string(), CombineStrategy::LongestFallback)
            }
            Err(e) => {
                tracing::warn!(model = %handle.name(), error = %e, "Synthesis failed; using longest answer");
                self.ctx.record_fallback(Pattern::Ensemble, FallbackKind::LongestAnswer);
                (longest(valid).to_string(), CombineStrategy::Longest)
            }
        }
    }
}
