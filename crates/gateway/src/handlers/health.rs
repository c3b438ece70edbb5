//! Health check handlers

use axum::{extract::State, Json};
use serde::Serialize;
use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Serialize)]
pub struct ReadyResponse {
    pub status: String,
    pub checks: HealthChecks,
}

#[derive(Serialize)]
pub struct HealthChecks {
    pub cache: CheckResult,
}

#[derive(Serialize)]
pub struct CheckResult {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Liveness probe - always returns healthy if server is running
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: paperweb_common::VERSION.to_string(),
    })
}

/// Readiness probe - checks the network cache.
///
/// Builds work without a cache, so a disabled cache is still ready.
pub async fn ready(State(state): State<AppState>) -> Json<ReadyResponse> {
    let start = std::time::Instant::now();

    let cache_check = match state.service.cache() {
        None => CheckResult {
            status: "disabled".to_string(),
            backend: None,
            latency_ms: None,
            error: None,
        },
        Some(cache) => match cache.ping().await {
            Ok(_) => CheckResult {
                status: "up".to_string(),
                backend: Some(cache.backend().to_string()),
                latency_ms: Some(start.elapsed().as_millis() as u64),
                error: None,
            },
            Err(e) => CheckResult {
                status: "down".to_string(),
                backend: Some(cache.backend().to_string()),
                latency_ms: None,
                error: Some(e.to_string()),
            },
        },
    };

    let all_healthy = cache_check.status != "down";

    Json(ReadyResponse {
        status: if all_healthy { "ready" } else { "not_ready" }.to_string(),
        checks: HealthChecks {
            cache: cache_check,
        },
    })
}
