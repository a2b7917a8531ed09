//! Router pattern
//!
//! Classifies the query and sends it to exactly one model. Technical and
//! complex queries go to the strong tier, simple and general queries to the
//! fast tier. No retry and no fallback: a model failure is returned to the
//! caller.

use crate::error::ModelCallError;
use crate::heuristics::QueryProfile;
use crate::heuristics::classifier::{Evidence, QueryClass};
use crate::models::{ModelHandle, ModelRole};
use crate::orchestration::{OrchestrationContext, Pattern, metadata};
use serde::Serialize;

/// Which tier a query goes to and why
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDecision {
    pub class: QueryClass,
    pub role: ModelRole,
    pub evidence: Option<Evidence>,
}

impl RouteDecision {
    /// Classify a query in router precedence: technical > complex > simple
    pub fn for_query(query: &str) -> Self {
        let profile = QueryProfile::of(query);
        let (class, evidence) = profile.class();
        let role = match class {
            QueryClass::Technical | QueryClass::Complex => ModelRole::Strong,
            QueryClass::Simple | QueryClass::General => ModelRole::Fast,
        };
        Self {
            class,
            role,
            evidence: evidence.cloned(),
        }
    }

    /// Human-readable reason naming the class, the evidence and the model
    pub fn reason(&self, model: &str) -> String {
        let evidence = self
            .evidence
            .as_ref()
            .map(|e| format!(" ({e})"))
            .unwrap_or_default();

        match self.class {
            QueryClass::Technical => format!(
                "Technical/coding query detected{evidence} - using {model} for technical expertise"
            ),
            QueryClass::Complex => format!(
                "Complex/reasoning-heavy query detected{evidence} - using {model} for better reasoning"
            ),
            QueryClass::Simple => format!(
                "Simple/factual query detected{evidence} - using {model} for quick response"
            ),
            QueryClass::General => format!("Default routing to {model} for general query"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouterResult {
    pub chosen_model: String,
    pub reason: String,
    pub response: String,
    pub role: ModelRole,
    pub query_class: QueryClass,
}

pub struct Router {
    ctx: OrchestrationContext,
}

impl Router {
    pub fn new(ctx: OrchestrationContext) -> Self {
        Self { ctx }
    }

    fn handle_for(&self, role: ModelRole) -> &ModelHandle {
        match role {
            ModelRole::Strong => self.ctx.registry().strong(),
            _ => self.ctx.registry().fast(),
        }
    }

    /// Route the query to one model and return its answer
    pub async fn route(&self, query: &str) -> Result<RouterResult, ModelCallError> {
        let decision = RouteDecision::for_query(query);
        let handle = self.handle_for(decision.role);
        let reason = decision.reason(handle.name());

        tracing::info!(
            class = %decision.class,
            model = %handle.name(),
            reason = %reason,
            "Router decision"
        );

        let response = self
            .ctx
            .invoke(
                Pattern::Router,
                handle,
                query,
                metadata([
                    ("routing_reason", reason.clone().into()),
                    ("query_class", decision.class.as_str().into()),
                ]),
            )
            .await?;

        Ok(RouterResult {
            chosen_model: handle.name().to_string(),
            reason,
            response,
            role: decision.role,
            query_class: decision.class,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_query_goes_to_fast_tier() {
        let decision = RouteDecision::for_query("What is the capital of Japan?");
        assert_eq!(decision.class, QueryClass::Simple);
        assert_eq!(decision.role, ModelRole::Fast);
        let reason = decision.reason("gemini_25_flash");
        assert!(reason.starts_with("Simple/factual query detected"));
        assert!(reason.contains("gemini_25_flash"));
    }

    #[test]
    fn test_technical_beats_simple() {
        let decision = RouteDecision::for_query("What is a hash map?");
        assert_eq!(decision.class, QueryClass::Technical);
        assert_eq!(decision.role, ModelRole::Strong);
    }

    #[test]
    fn test_reasoning_cue_goes_to_strong_tier() {
        let decision = RouteDecision::for_query(
            "Explain, step by step, how attention works in transformer models and why it scales quadratically.",
        );
        assert_eq!(decision.class, QueryClass::Complex);
        assert_eq!(decision.role, ModelRole::Strong);
        assert!(decision.reason("gemini_25_pro").contains("reasoning cue 'explain'"));
    }

    #[test]
    fn test_general_reason_has_no_evidence() {
        let decision =
            RouteDecision::for_query("I would love a relaxing couple of days somewhere near the coast");
        assert_eq!(decision.class, QueryClass::General);
        assert_eq!(
            decision.reason("gemini_25_flash"),
            "Default routing to gemini_25_flash for general query"
        );
    }
}
