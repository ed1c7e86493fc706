//! `/users` endpoints.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};

use crate::error::Error;
use crate::user::User;

use super::error::ApiError;
use super::AppState;

/// Routes under `/users`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/:username", get(get_user))
}

async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(state.users.list().await?))
}

async fn get_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<User>, ApiError> {
    state
        .users
        .find_by_username(&username)
        .await?
        .map(Json)
        .ok_or_else(|| Error::UserNotFound.into())
}
