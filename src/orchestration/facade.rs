//! Single entry point over the orchestration patterns
//!
//! Automatic selection looks at the query's facets in this order: creative
//! goes to the ensemble, technical to the cascade, everything else to the
//! router. This is deliberately not the router's own precedence.

use crate::error::{AppError, AppResult, ModelCallError};
use crate::heuristics::QueryProfile;
use crate::orchestration::{
    Cascade, CascadeResult, Ensemble, EnsembleResult, OrchestrationContext, Pattern, Router,
    RouterResult, Strategy, metadata,
};
use serde::Serialize;

/// Full result of whichever pattern handled a query
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "pattern", rename_all = "lowercase")]
pub enum PatternOutcome {
    Router(RouterResult),
    Cascade(CascadeResult),
    Ensemble(EnsembleResult),
    Direct { model: String, answer: String },
}

impl PatternOutcome {
    pub fn pattern(&self) -> Pattern {
        match self {
            PatternOutcome::Router(_) => Pattern::Router,
            PatternOutcome::Cascade(_) => Pattern::Cascade,
            PatternOutcome::Ensemble(_) => Pattern::Ensemble,
            PatternOutcome::Direct { .. } => Pattern::Direct,
        }
    }

    /// The text a caller shows the user
    pub fn answer(&self) -> &str {
        match self {
            PatternOutcome::Router(r) => &r.response,
            PatternOutcome::Cascade(c) => &c.final_answer,
            PatternOutcome::Ensemble(e) => &e.final_answer,
            PatternOutcome::Direct { answer, .. } => answer,
        }
    }

    pub fn into_answer(self) -> String {
        match self {
            PatternOutcome::Router(r) => r.response,
            PatternOutcome::Cascade(c) => c.final_answer,
            PatternOutcome::Ensemble(e) => e.final_answer,
            PatternOutcome::Direct { answer, .. } => answer,
        }
    }
}

/// Pattern chosen for `auto`
pub fn select_pattern(query: &str) -> Pattern {
    let profile = QueryProfile::of(query);
    if profile.creative.is_some() {
        Pattern::Ensemble
    } else if profile.technical.is_some() {
        Pattern::Cascade
    } else {
        Pattern::Router
    }
}

/// Reject blank queries before any model is called
fn validate_query(query: &str) -> AppResult<()> {
    if query.trim().is_empty() {
        return Err(AppError::Validation(
            "query cannot be empty or contain only whitespace".to_string(),
        ));
    }
    Ok(())
}

fn pattern_failed(pattern: Pattern, source: ModelCallError) -> AppError {
    AppError::PatternFailed { pattern, source }
}

pub struct Orchestrator {
    ctx: OrchestrationContext,
    router: Router,
    cascade: Cascade,
    ensemble: Ensemble,
}

impl Orchestrator {
    pub fn new(ctx: OrchestrationContext) -> Self {
        Self {
            router: Router::new(ctx.clone()),
            cascade: Cascade::new(ctx.clone()),
            ensemble: Ensemble::new(ctx.clone()),
            ctx,
        }
    }

    pub fn context(&self) -> &OrchestrationContext {
        &self.ctx
    }

    /// Router pattern; a model failure is returned as [`AppError::PatternFailed`]
    pub async fn route_query(&self, query: &str) -> AppResult<RouterResult> {
        validate_query(query)?;
        self.router
            .route(query)
            .await
            .map_err(|source| pattern_failed(Pattern::Router, source))
    }

    /// Cascade pattern; only a non-escalating first-attempt failure is an error
    pub async fn answer_with_cascade(&self, query: &str) -> AppResult<CascadeResult> {
        validate_query(query)?;
        self.cascade
            .answer(query)
            .await
            .map_err(|source| pattern_failed(Pattern::Cascade, source))
    }

    /// Ensemble pattern; model failures end up in the result, never here
    pub async fn ensemble_answer(&self, query: &str) -> AppResult<EnsembleResult> {
        validate_query(query)?;
        Ok(self.ensemble.answer(query).await)
    }

    /// One fast-model call, no orchestration
    pub async fn direct(&self, query: &str) -> Result<String, ModelCallError> {
        let fast = self.ctx.registry().fast();
        self.ctx
            .invoke(
                Pattern::Direct,
                fast,
                query,
                metadata([("strategy", "direct".into())]),
            )
            .await
    }

    /// Run a query through the requested strategy and return the full result
    ///
    /// A blank query is rejected before any model call.
    pub async fn respond_with(&self, query: &str, strategy: Strategy) -> AppResult<PatternOutcome> {
        validate_query(query)?;

        let pattern = match strategy {
            Strategy::Pattern(pattern) => pattern,
            Strategy::Auto => {
                let pattern = select_pattern(query);
                tracing::info!(pattern = %pattern, "Auto strategy selected pattern");
                pattern
            }
        };

        if let Some(metrics) = self.ctx.collector().metrics()
            && let Err(e) = metrics.record_request(pattern)
        {
            tracing::warn!(error = %e, pattern = %pattern, "Failed to record request metric");
            metrics.metrics_recording_failure("record_request");
        }

        let outcome = match pattern {
            Pattern::Router => PatternOutcome::Router(self.route_query(query).await?),
            Pattern::Cascade => PatternOutcome::Cascade(self.answer_with_cascade(query).await?),
            Pattern::Ensemble => PatternOutcome::Ensemble(self.ensemble_answer(query).await?),
            Pattern::Direct => PatternOutcome::Direct {
                model: self.ctx.registry().fast().name().to_string(),
                answer: self
                    .direct(query)
                    .await
                    .map_err(|source| pattern_failed(Pattern::Direct, source))?,
            },
        };

        Ok(outcome)
    }

    /// Run a query and return only the answer text
    pub async fn respond(&self, query: &str, strategy: Strategy) -> AppResult<String> {
        Ok(self.respond_with(query, strategy).await?.into_answer())
    }

    /// Like [`Orchestrator::respond`] with the strategy given by name
    ///
    /// An unknown name fails before any model call.
    pub async fn get_model_response(&self, prompt: &str, strategy: &str) -> AppResult<String> {
        let strategy: Strategy = strategy.parse()?;
        self.respond(prompt, strategy).await
    }
}
