//! `/lrRecord` endpoints.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde_json::Value;

use crate::record::{DeletedRecord, LrRecord};

use super::error::ApiError;
use super::AppState;

/// Routes under `/lrRecord`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/lrRecord", get(list_records).post(create_record))
        .route("/lrRecord/:lr_num", put(update_record).delete(delete_record))
}

async fn create_record(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<LrRecord>, ApiError> {
    let Json(payload) = payload?;
    Ok(Json(state.lifecycle.create(payload).await?))
}

async fn list_records(State(state): State<AppState>) -> Result<Json<Vec<LrRecord>>, ApiError> {
    Ok(Json(state.lifecycle.list().await?))
}

async fn update_record(
    State(state): State<AppState>,
    Path(lr_num): Path<String>,
    patch: Result<Json<Value>, JsonRejection>,
) -> Result<Json<LrRecord>, ApiError> {
    let Json(patch) = patch?;
    Ok(Json(state.lifecycle.update(&lr_num, patch).await?))
}

async fn delete_record(
    State(state): State<AppState>,
    Path(lr_num): Path<String>,
) -> Result<Json<DeletedRecord>, ApiError> {
    Ok(Json(state.lifecycle.delete(&lr_num).await?))
}
