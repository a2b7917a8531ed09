//! `GET /metrics` (ledger summary) and `GET /metrics/prometheus`

use crate::collector::Summary;
use crate::handlers::AppState;
use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    pub summary: Summary,
    pub timestamp: DateTime<Utc>,
}

pub async fn summary(State(state): State<AppState>) -> Json<MetricsResponse> {
    Json(MetricsResponse {
        summary: state.collector().summary(),
        timestamp: Utc::now(),
    })
}

/// Prometheus text exposition format
pub async fn prometheus(State(state): State<AppState>) -> (StatusCode, String) {
    match state.metrics().gather() {
        Ok(body) => (StatusCode::OK, body),
        Err(e) => {
            tracing::error!(error = %e, "Failed to gather Prometheus metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to gather metrics: {e}"),
            )
        }
    }
}
