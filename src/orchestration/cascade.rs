//! Cascade pattern
//!
//! ```text
//! FIRST_ATTEMPT (cheap) --confident--> DONE
//!        | low confidence, empty, or model unavailable
//!        v
//! ESCALATE (strong) --ok--> DONE (used_fallback)
//!        | error
//!        v
//! creative, when configured --ok--> DONE
//!        | error / not configured
//!        v
//! DONE (error = true)
//! ```
//!
//! Only [`ModelCallError::Unavailable`] escalates from the first attempt;
//! any other first-attempt failure is returned as `Err`. Once escalated the
//! cascade never returns `Err`.

use crate::error::ModelCallError;
use crate::heuristics::{QualityIssue, diagnose};
use crate::metrics::FallbackKind;
use crate::models::ModelHandle;
use crate::orchestration::{OrchestrationContext, Pattern, metadata};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeStage {
    FirstAttempt,
    Fallback,
    CreativeUltimateFallback,
}

impl CascadeStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            CascadeStage::FirstAttempt => "first_attempt",
            CascadeStage::Fallback => "fallback",
            CascadeStage::CreativeUltimateFallback => "creative_ultimate_fallback",
        }
    }
}

/// Why the cascade escalated
#[derive(Debug, Clone)]
pub enum FallbackReason {
    /// The cheap model was unavailable
    ModelError(ModelCallError),
    /// The cheap model returned nothing
    EmptyAnswer,
    /// The answer tripped one or more quality rules
    LowConfidence(Vec<QualityIssue>),
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::ModelError(e) => write!(f, "Model error: {e}"),
            FallbackReason::EmptyAnswer => f.write_str("No response from first model"),
            FallbackReason::LowConfidence(issues) => {
                for (i, issue) in issues.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    write!(f, "{issue}")?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CascadeResult {
    pub used_fallback: bool,
    pub first_model: String,
    pub second_model: Option<String>,
    pub first_answer: String,
    pub final_answer: String,
    pub reason_for_fallback: Option<String>,
    /// Every model failed; `final_answer` describes the failure
    pub error: bool,
}

pub struct Cascade {
    ctx: OrchestrationContext,
}

impl Cascade {
    pub fn new(ctx: OrchestrationContext) -> Self {
        Self { ctx }
    }

    async fn attempt(
        &self,
        stage: CascadeStage,
        handle: &ModelHandle,
        query: &str,
        reason: Option<&str>,
    ) -> Result<String, ModelCallError> {
        let mut tags = metadata([("cascade_stage", stage.as_str().into())]);
        if let Some(reason) = reason {
            tags.insert("fallback_reason".to_string(), reason.into());
        }
        self.ctx.invoke(Pattern::Cascade, handle, query, tags).await
    }

    pub async fn answer(&self, query: &str) -> Result<CascadeResult, ModelCallError> {
        let registry = self.ctx.registry();
        let cheap = registry.cheap();

        let first = self
            .attempt(CascadeStage::FirstAttempt, cheap, query, None)
            .await;

        let (first_answer, reason) = match first {
            Ok(answer) if answer.trim().is_empty() => (answer, FallbackReason::EmptyAnswer),
            Ok(answer) => {
                let issues = diagnose(&answer);
                if issues.is_empty() {
                    tracing::info!(model = %cheap.name(), "First answer looks confident");
                    return Ok(CascadeResult {
                        used_fallback: false,
                        first_model: cheap.name().to_string(),
                        second_model: None,
                        first_answer: answer.clone(),
                        final_answer: answer,
                        reason_for_fallback: None,
                        error: false,
                    });
                }
                (answer, FallbackReason::LowConfidence(issues))
            }
            Err(e) if e.is_unavailable() => (format!("Error: {e}"), FallbackReason::ModelError(e)),
            Err(e) => return Err(e),
        };

        let reason = reason.to_string();
        tracing::info!(
            from = %cheap.name(),
            to = %registry.strong().name(),
            reason = %reason,
            "Cascade escalating"
        );
        self.ctx.record_fallback(Pattern::Cascade, FallbackKind::Escalated);

        let escalated = |second: &ModelHandle, final_answer: String, error: bool| CascadeResult {
            used_fallback: true,
            first_model: cheap.name().to_string(),
            second_model: Some(second.name().to_string()),
            first_answer: first_answer.clone(),
            final_answer,
            reason_for_fallback: Some(reason.clone()),
            error,
        };

        let strong = registry.strong();
        let strong_error = match self
            .attempt(CascadeStage::Fallback, strong, query, Some(&reason))
            .await
        {
            Ok(answer) => return Ok(escalated(strong, answer, false)),
            Err(e) => e,
        };

        let creative = registry
            .creative()
            .filter(|_| self.ctx.settings().creative_ultimate_fallback);

        let Some(creative) = creative else {
            self.ctx.record_fallback(Pattern::Cascade, FallbackKind::Exhausted);
            return Ok(escalated(
                strong,
                format!("Fallback failed: {strong_error}"),
                true,
            ));
        };

        tracing::warn!(
            model = %creative.name(),
            error = %strong_error,
            "Strong model failed; trying creative model as ultimate fallback"
        );
        self.ctx
            .record_fallback(Pattern::Cascade, FallbackKind::CreativeFallback);

        match self
            .attempt(
                CascadeStage::CreativeUltimateFallback,
                creative,
                query,
                Some(&reason),
            )
            .await
        {
            Ok(answer) => Ok(escalated(creative, answer, false)),
            Err(e) => {
                self.ctx.record_fallback(Pattern::Cascade, FallbackKind::Exhausted);
                Ok(escalated(
                    creative,
                    format!("All models failed. Last error: {e}"),
                    true,
                ))
            }
        }
    }
}
