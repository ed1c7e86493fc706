//! HTTP error responses.
//!
//! Bridges [`crate::Error`] into axum responses. The API only ever answers
//! failures with `404` or `400`, and always with an `{"error": "..."}` body.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::error::Error;

/// Error returned from every handler.
#[derive(Debug)]
pub struct ApiError(Error);

impl ApiError {
    /// Status code reported for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        if self.0.is_not_found_kind() {
            StatusCode::NOT_FOUND
        } else {
            StatusCode::BAD_REQUEST
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(Error::validation(rejection.body_text()))
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if self.0.is_not_found_kind() {
            tracing::debug!(status = %status, error = %self.0, "Request rejected");
        } else {
            tracing::warn!(status = %status, error = %self.0, "Request failed");
        }

        let body = ErrorBody {
            error: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
