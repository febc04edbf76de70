use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::errors::ApiError;
use crate::services::store_service;
use crate::state::db::{Db, StoreAction};

/// Build the storage routes. Validation of query parameters happens here;
/// the storage layer only ever sees values that passed it.
pub fn routes(db: Db) -> Router {
    Router::new()
        .route("/store", post(store_string))
        .route("/get", get(get_string))
        .route("/list", get(list_indices))
        .route("/delete", delete(delete_string))
        .route("/stats", get(get_stats))
        .with_state(db)
}

#[derive(Deserialize)]
struct StoreParams {
    index: Option<String>,
    data: Option<String>,
}

#[derive(Deserialize)]
struct IndexParam {
    index: Option<String>,
}

fn require_index(index: Option<String>) -> Result<String, ApiError> {
    index.ok_or_else(|| ApiError::BadRequest("parameter \"index\" is required".to_string()))
}

//
// ─────────────────────────────────────────────────────────────
// POST /store?index=<key>&data=<value>
// Create or overwrite the record under `index`
// ─────────────────────────────────────────────────────────────
//
async fn store_string(
    State(db): State<Db>,
    Query(params): Query<StoreParams>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    // An empty index is a legal key; an empty data payload is not.
    let index = require_index(params.index)?;
    let data = match params.data {
        Some(d) if !d.is_empty() => d,
        _ => {
            return Err(ApiError::BadRequest(
                "parameter \"data\" is required and must be non-empty".to_string(),
            ))
        }
    };

    let outcome = store_service::store(&db, &index, &data).await?;

    let (status, message) = match outcome.action {
        StoreAction::Created => (
            StatusCode::CREATED,
            format!("string stored under index \"{index}\""),
        ),
        StoreAction::Updated => (
            StatusCode::OK,
            format!("string updated under index \"{index}\""),
        ),
    };

    Ok((
        status,
        Json(json!({
            "action": outcome.action,
            "message": message,
            "index": outcome.index,
            "length": outcome.length,
        })),
    ))
}

//
// ─────────────────────────────────────────────────────────────
// GET /get?index=<key>
// Return the full record or 404
// ─────────────────────────────────────────────────────────────
//
async fn get_string(
    State(db): State<Db>,
    Query(params): Query<IndexParam>,
) -> Result<Json<Value>, ApiError> {
    let index = require_index(params.index)?;

    match store_service::get(&db, &index).await? {
        Some(record) => Ok(Json(json!(record))),
        None => Err(ApiError::NotFound(format!(
            "no record under index \"{index}\""
        ))),
    }
}

//
// ─────────────────────────────────────────────────────────────
// GET /list
// All indices with metadata, newest creation first
// ─────────────────────────────────────────────────────────────
//
async fn list_indices(State(db): State<Db>) -> Result<Json<Value>, ApiError> {
    let indices = store_service::list_all(&db).await?;

    Ok(Json(json!({
        "count": indices.len(),
        "indices": indices,
    })))
}

//
// ─────────────────────────────────────────────────────────────
// DELETE /delete?index=<key>
// Remove the record if it exists, 404 otherwise
// ─────────────────────────────────────────────────────────────
//
async fn delete_string(
    State(db): State<Db>,
    Query(params): Query<IndexParam>,
) -> Result<Json<Value>, ApiError> {
    let index = require_index(params.index)?;

    if store_service::delete(&db, &index).await? {
        Ok(Json(json!({
            "message": format!("record under index \"{index}\" deleted"),
        })))
    } else {
        Err(ApiError::NotFound(format!(
            "no record under index \"{index}\""
        )))
    }
}

//
// ─────────────────────────────────────────────────────────────
// GET /stats
// Aggregate table statistics
// ─────────────────────────────────────────────────────────────
//
async fn get_stats(State(db): State<Db>) -> Result<Json<Value>, ApiError> {
    let stats = store_service::stats(&db).await?;
    Ok(Json(json!(stats)))
}
