//! `GET /health` and `GET /`

use axum::{Json, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
}

pub async fn handler() -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy",
            timestamp: Utc::now(),
        }),
    )
}

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub service: &'static str,
    pub version: &'static str,
    pub description: &'static str,
    pub endpoints: Vec<EndpointInfo>,
}

#[derive(Debug, Serialize)]
pub struct EndpointInfo {
    pub method: &'static str,
    pub path: &'static str,
    pub description: &'static str,
}

const ENDPOINTS: &[(&str, &str, &str)] = &[
    ("POST", "/route", "Route the query to one model by query class"),
    ("POST", "/cascade", "Cheap model first, strong model on low confidence"),
    ("POST", "/ensemble", "Query several models and merge their answers"),
    ("POST", "/chat", "Answer with an explicit or automatically chosen pattern"),
    ("GET", "/metrics", "Call ledger summary"),
    ("GET", "/metrics/prometheus", "Prometheus metrics"),
    ("GET", "/health", "Liveness check"),
];

pub async fn info() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        description: env!("CARGO_PKG_DESCRIPTION"),
        endpoints: ENDPOINTS
            .iter()
            .map(|&(method, path, description)| EndpointInfo {
                method,
                path,
                description,
            })
            .collect(),
    })
}
