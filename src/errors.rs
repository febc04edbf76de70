use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Faults raised by the storage layer.
///
/// Uniqueness violations during an upsert never appear here: they are
/// absorbed by the insert/update fallback in `store_service::store`. Only
/// genuine storage faults (I/O, corruption, pool failure) cross this
/// boundary.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("storage fault: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("upsert for index \"{0}\" exhausted its retries under concurrent delete/recreate")]
    UpsertContention(String),
}

/// HTTP-facing error, produced by the route layer.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
