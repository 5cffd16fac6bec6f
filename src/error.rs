use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::domain::Id;

/// Error type for HTTP handlers, rendered as `{ "error", "code" }`.
///
/// Validation rejections are not errors here; they are returned as data.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("snapshot {0} not found")]
    SnapshotNotFound(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Id },
}

pub type ApiResult<T> = Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::SnapshotNotFound(_) | ApiError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        };

        let body = json!({
            "error": self.to_string(),
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
