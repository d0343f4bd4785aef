use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use skyvestments_market_data::PriceRecord;
use skyvestments_storage_json::PricesFile;

use crate::{error::ApiResult, main_lib::AppState};

#[derive(Serialize)]
struct PriceResponse {
    price: Option<PriceRecord>,
}

#[derive(Serialize)]
struct SuccessResponse {
    success: bool,
}

async fn get_price(
    State(state): State<Arc<AppState>>,
    Path(item_name): Path<String>,
) -> ApiResult<Json<PriceResponse>> {
    let price = state.engine.resolve_price(&item_name).await;
    Ok(Json(PriceResponse { price }))
}

/// Resolves every tracked item one after another.
async fn refresh_all(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<BTreeMap<String, Option<PriceRecord>>>> {
    let names = state.entries.tracked_items()?;
    let results = state.engine.refresh_all(names).await;
    Ok(Json(results.into_iter().collect()))
}

async fn get_prices(State(state): State<Arc<AppState>>) -> ApiResult<Json<PricesFile>> {
    Ok(Json(PricesFile {
        prices: state.engine.cache().snapshot(),
    }))
}

async fn replace_prices(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PricesFile>, JsonRejection>,
) -> ApiResult<Json<SuccessResponse>> {
    let Json(file) = payload?;
    state.engine.cache().replace_all(file.prices);
    Ok(Json(SuccessResponse { success: true }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/price/{item_name}", get(get_price))
        .route("/refresh-all", post(refresh_all))
        .route("/prices", get(get_prices).put(replace_prices))
}
