//! `POST /chat`
//!
//! Conversational entry point: runs the message through the requested
//! strategy (`auto` by default) and returns the answer text along with the
//! pattern that produced it.

use crate::error::AppResult;
use crate::handlers::AppState;
use crate::handlers::extractor::ValidatedJson;
use crate::handlers::patterns::{RequestMetadata, validate_text};
use crate::middleware::RequestId;
use crate::orchestration::{Pattern, PatternOutcome, Strategy};
use axum::{Extension, Json, extract::State};
use serde::{Deserialize, Deserializer, Serialize};

/// Chat request
///
/// Validated during deserialization, including the strategy name.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    message: String,
    pattern: Strategy,
}

impl ChatRequest {
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn pattern(&self) -> Strategy {
        self.pattern
    }
}

impl<'de> Deserialize<'de> for ChatRequest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct RawChatRequest {
            message: String,
            #[serde(default)]
            pattern: Option<String>,
        }

        let raw = RawChatRequest::deserialize(deserializer)?;
        validate_text("message", &raw.message).map_err(serde::de::Error::custom)?;

        let pattern = match raw.pattern.as_deref() {
            None => Strategy::Auto,
            Some(name) => name
                .parse()
                .map_err(|e| serde::de::Error::custom(format!("pattern: {e}")))?,
        };

        Ok(ChatRequest {
            message: raw.message,
            pattern,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub pattern_used: Pattern,
    pub answer: String,
    pub metadata: ChatMetadata,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMetadata {
    #[serde(flatten)]
    pub request: RequestMetadata,
    /// Strategy as requested, before `auto` resolution
    pub pattern_requested: String,
    /// Full result of the pattern that ran
    pub details: PatternOutcome,
}

pub async fn handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    ValidatedJson(request): ValidatedJson<ChatRequest>,
) -> AppResult<Json<ChatResponse>> {
    tracing::info!(
        request_id = %request_id,
        strategy = %request.pattern(),
        message_length = request.message().len(),
        "Chat request"
    );

    let outcome = state
        .orchestrator()
        .respond_with(request.message(), request.pattern())
        .await
        .inspect_err(|e| {
            tracing::error!(request_id = %request_id, error = %e, "Chat request failed");
        })?;

    let pattern_used = outcome.pattern();
    tracing::info!(request_id = %request_id, pattern = %pattern_used, "Chat request answered");

    Ok(Json(ChatResponse {
        pattern_used,
        answer: outcome.answer().to_string(),
        metadata: ChatMetadata {
            request: RequestMetadata::for_query(request.message()),
            pattern_requested: request.pattern().to_string(),
            details: outcome,
        },
    }))
}
