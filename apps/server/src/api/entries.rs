use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use skyvestments_storage_json::EntriesFile;

use crate::{error::ApiResult, main_lib::AppState};

async fn get_entries(State(state): State<Arc<AppState>>) -> ApiResult<Json<EntriesFile>> {
    Ok(Json(state.entries.load()?))
}

async fn replace_entries(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<EntriesFile>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(file) = payload?;
    state.entries.replace(&file)?;
    Ok(Json(json!({ "success": true })))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/entries", get(get_entries).put(replace_entries))
}
