use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use skyvestments_market_data::ItemCatalog;

use crate::{
    catalog_sync::{refresh_catalog_if_stale, CatalogRefresh},
    error::ApiResult,
    main_lib::AppState,
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ItemsResponse {
    items: Vec<String>,
    /// Milliseconds since the epoch; 0 when the catalog was never loaded.
    last_updated: i64,
}

async fn get_items(State(state): State<Arc<AppState>>) -> ApiResult<Json<ItemsResponse>> {
    let snapshot = state.catalog.snapshot();
    Ok(Json(ItemsResponse {
        items: snapshot.display_names(),
        last_updated: snapshot
            .loaded_at()
            .map_or(0, |at| at.timestamp_millis()),
    }))
}

async fn refresh_items(State(state): State<Arc<AppState>>) -> ApiResult<Json<CatalogRefresh>> {
    Ok(Json(refresh_catalog_if_stale(&state).await))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/items", get(get_items))
        .route("/refresh-items", post(refresh_items))
}
