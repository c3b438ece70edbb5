//! Citation network handler

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

use crate::AppState;
use paperweb_common::{
    errors::{AppError, Result},
    metrics::RequestMetrics,
    models::{NetworkRequest, NetworkResponse},
};

/// Build the citation network around a paper
///
/// POST /v1/network
///
/// The service enforces the build deadline, so a slow crawl answers 200 with
/// a partial network and a `warning`.
pub async fn fetch_network(
    State(state): State<AppState>,
    payload: std::result::Result<Json<NetworkRequest>, JsonRejection>,
) -> Result<Json<NetworkResponse>> {
    let metrics = RequestMetrics::start("POST", "/v1/network");

    let result = build_network(&state, payload).await;

    metrics.finish(match &result {
        Ok(_) => 200,
        Err(e) => e.status_code().as_u16(),
    });

    result.map(Json)
}

async fn build_network(
    state: &AppState,
    payload: std::result::Result<Json<NetworkRequest>, JsonRejection>,
) -> Result<NetworkResponse> {
    let Json(request) = payload.map_err(|e| AppError::InvalidJson {
        message: e.body_text(),
    })?;

    state.service.fetch_network(&request).await
}
