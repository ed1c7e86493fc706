//! `/items` endpoints.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::Value;

use crate::item::Item;

use super::error::ApiError;
use super::AppState;

/// Routes under `/items`.
pub fn routes() -> Router<AppState> {
    Router::new().route("/items", get(list_items).post(create_item))
}

async fn create_item(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Item>), ApiError> {
    let Json(payload) = payload?;
    let item = state.items.create(Item::from_document(payload)?).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

async fn list_items(State(state): State<AppState>) -> Result<Json<Vec<Item>>, ApiError> {
    Ok(Json(state.items.list().await?))
}
