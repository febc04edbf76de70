use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::state::db::Db;

pub fn routes(db: Db) -> Router {
    Router::new()
        .route("/", get(info))
        .route("/system/alive", get(is_alive))
        .with_state(db)
}

/// GET /system/alive
async fn is_alive() -> &'static str {
    "OK"
}

/// GET /
/// Describe the available endpoints.
async fn info(State(db): State<Db>) -> Json<Value> {
    Json(json!({
        "message": "String Storage API",
        "version": env!("CARGO_PKG_VERSION"),
        "database": db.path(),
        "endpoints": {
            "POST /store?index=<key>&data=<value>": "store a string",
            "GET /get?index=<key>": "fetch a string",
            "GET /list": "list all indices with metadata",
            "DELETE /delete?index=<key>": "delete a string",
            "GET /stats": "database statistics",
        },
        "usage": "pass index and data as query parameters",
    }))
}
