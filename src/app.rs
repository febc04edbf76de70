use axum::Router;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::routes::{store_routes, system_routes};
use crate::state::db::Db;

/// Build the complete Axum application:
/// - /store /get /list /delete /stats  (storage operations)
/// - /                                 (API info)
/// - /system/alive                     (liveness probe)
///
/// `db` is a cheap clone of the shared pool handle.
pub fn build_app(db: Db) -> Router {
    Router::new()
        .merge(store_routes::routes(db.clone()))
        .merge(system_routes::routes(db))
        // Logging middleware
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}
