//! `POST /route`, `POST /cascade`, `POST /ensemble`
//!
//! Each endpoint runs one pattern and returns its full result with a
//! `metadata` block.

use crate::error::AppResult;
use crate::handlers::AppState;
use crate::handlers::extractor::ValidatedJson;
use crate::middleware::RequestId;
use crate::orchestration::{Pattern, PatternOutcome, Strategy};
use axum::{Extension, Json, extract::State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Maximum query length in characters
pub const MAX_QUERY_LENGTH: usize = 5_000;

/// Body of the pattern endpoints
///
/// Validated during deserialization: blank or oversized queries never reach
/// a handler.
#[derive(Debug, Clone, Serialize)]
pub struct QueryRequest {
    query: String,
}

impl QueryRequest {
    pub fn query(&self) -> &str {
        &self.query
    }
}

impl<'de> Deserialize<'de> for QueryRequest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct RawQueryRequest {
            query: String,
        }

        let raw = RawQueryRequest::deserialize(deserializer)?;
        validate_text("query", &raw.query).map_err(serde::de::Error::custom)?;
        Ok(QueryRequest { query: raw.query })
    }
}

/// Shared validation for user text fields
pub(crate) fn validate_text(field: &str, text: &str) -> Result<(), String> {
    if text.trim().is_empty() {
        return Err(format!(
            "{field} cannot be empty or contain only whitespace"
        ));
    }

    let chars = text.chars().count();
    if chars > MAX_QUERY_LENGTH {
        return Err(format!(
            "{field} exceeds maximum length of {MAX_QUERY_LENGTH} characters (got {chars})"
        ));
    }

    Ok(())
}

#[derive(Debug, Clone, Serialize)]
pub struct RequestMetadata {
    pub timestamp: DateTime<Utc>,
    pub query_length: usize,
}

impl RequestMetadata {
    pub fn for_query(query: &str) -> Self {
        Self {
            timestamp: Utc::now(),
            query_length: query.chars().count(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PatternResponse {
    #[serde(flatten)]
    pub outcome: PatternOutcome,
    pub metadata: RequestMetadata,
}

async fn run(
    state: &AppState,
    request_id: RequestId,
    query: &str,
    pattern: Pattern,
) -> AppResult<Json<PatternResponse>> {
    tracing::info!(
        request_id = %request_id,
        pattern = %pattern,
        query_length = query.len(),
        "Pattern request"
    );

    let outcome = state
        .orchestrator()
        .respond_with(query, Strategy::Pattern(pattern))
        .await
        .inspect_err(|e| {
            tracing::error!(request_id = %request_id, pattern = %pattern, error = %e, "Pattern failed");
        })?;

    Ok(Json(PatternResponse {
        outcome,
        metadata: RequestMetadata::for_query(query),
    }))
}

pub async fn route(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    ValidatedJson(request): ValidatedJson<QueryRequest>,
) -> AppResult<Json<PatternResponse>> {
    run(&state, request_id, request.query(), Pattern::Router).await
}

pub async fn cascade(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    ValidatedJson(request): ValidatedJson<QueryRequest>,
) -> AppResult<Json<PatternResponse>> {
    run(&state, request_id, request.query(), Pattern::Cascade).await
}

pub async fn ensemble(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    ValidatedJson(request): ValidatedJson<QueryRequest>,
) -> AppResult<Json<PatternResponse>> {
    run(&state, request_id, request.query(), Pattern::Ensemble).await
}
