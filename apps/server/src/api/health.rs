use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::{catalog_sync::catalog_is_fresh, error::ApiResult, main_lib::AppState};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SourceStatus {
    source: String,
    state: String,
    consecutive_failures: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusResponse {
    sources: Vec<SourceStatus>,
    cached_prices: usize,
    catalog_items: usize,
    catalog_fresh: bool,
}

async fn healthz() -> &'static str {
    "ok"
}

/// Circuit state of every price source that has been called, plus cache
/// and catalog sizes.
async fn get_status(State(state): State<Arc<AppState>>) -> ApiResult<Json<StatusResponse>> {
    let sources = state
        .engine
        .source_health()
        .into_iter()
        .map(|h| SourceStatus {
            source: h.source,
            state: h.state.to_string(),
            consecutive_failures: h.consecutive_failures,
        })
        .collect();

    Ok(Json(StatusResponse {
        sources,
        cached_prices: state.engine.cache().len(),
        catalog_items: state.catalog.snapshot().len(),
        catalog_fresh: catalog_is_fresh(&state),
    }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/healthz", get(healthz))
}

pub fn api_router() -> Router<Arc<AppState>> {
    Router::new().route("/health/status", get(get_status))
}
