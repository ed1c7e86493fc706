//! HTTP API.
//!
//! Maps verbs and paths onto the lifecycle manager and the item and user
//! collections. Handlers decode JSON themselves so that malformed bodies are
//! reported with the same `{"error": "..."}` shape as every other failure.

pub mod error;
mod items;
mod lr_records;
mod users;

use std::sync::Arc;

use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::lifecycle::LrLifecycle;
use crate::storage::{ItemStore, SqliteRecordStore, Storage, UserStore};

pub use error::ApiError;

/// State shared by all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// LR record lifecycle.
    pub lifecycle: LrLifecycle,
    /// Item collection.
    pub items: ItemStore,
    /// User directory.
    pub users: UserStore,
}

impl AppState {
    /// Wire every collection to the given storage handle.
    #[must_use]
    pub fn new(storage: &Storage) -> Self {
        Self {
            lifecycle: LrLifecycle::new(Arc::new(SqliteRecordStore::new(storage.clone()))),
            items: ItemStore::new(storage.clone()),
            users: UserStore::new(storage.clone()),
        }
    }
}

/// Build the application router.
///
/// An empty `cors_origins` list allows any origin.
pub fn router(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(lr_records::routes())
        .merge(items::routes())
        .merge(users::routes())
        .with_state(state)
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|s| s.parse().ok()).collect();
        layer.allow_origin(AllowOrigin::list(origins))
    }
}

#[allow(clippy::unused_async)]
async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
