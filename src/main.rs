/*****************************************************************************************
 *
 *  stringstore – SQLite-backed string storage over HTTP
 *  ----------------------------------------------------
 *
 *  Stores caller-keyed string payloads in a single SQLite table and exposes
 *  upsert / get / delete / list / stats through query-parameter routes.
 *
 *****************************************************************************************/

use axum::serve;
use tokio::net::TcpListener;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::FmtSubscriber;

use stringstore::app;
use stringstore::config::AppConfig;
use stringstore::state::db::Db;

#[tokio::main]
async fn main() {
    //
    // ────────────────────────────────────────────────────────
    //  Select configuration profile (APP_ENV)
    // ────────────────────────────────────────────────────────
    //
    let cfg = AppConfig::from_env();

    //
    // ────────────────────────────────────────────────────────
    //  Configure logging
    // ────────────────────────────────────────────────────────
    //
    let level = match cfg.log_level.to_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        _ => LevelFilter::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    tracing::info!("Starting stringstore…");
    tracing::info!("Loaded configuration: {:?}", cfg);

    //
    // ────────────────────────────────────────────────────────
    //  Open the database (creates file and schema if missing)
    // ────────────────────────────────────────────────────────
    //
    let db = Db::connect(&cfg.database_path)
        .await
        .expect("Failed to open database");

    tracing::info!("Database ready at {}", db.path());

    //
    // ────────────────────────────────────────────────────────
    //  Build Axum app and start listening
    // ────────────────────────────────────────────────────────
    //
    let app = app::build_app(db.clone());

    let addr = format!("{}:{}", cfg.host, cfg.port);
    let listener = TcpListener::bind(&addr)
        .await
        .expect("Failed to bind address");

    tracing::info!("Listening on http://{}", addr);

    serve(listener, app)
        .with_graceful_shutdown(shutdown(db))
        .await
        .expect("Server error");
}

//
// ─────────────────────────────────────────────────────────────
//  Graceful shutdown handler
// ─────────────────────────────────────────────────────────────
//
async fn shutdown(db: Db) {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to listen for shutdown signal");

    tracing::warn!("CTRL+C received — closing database…");
    db.close().await;
    tracing::info!("Database closed. Goodbye.");
}
