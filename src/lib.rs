//! SQLite-backed string storage service.
//!
//! The storage manager lives in [`services::store_service`], operating on the
//! shared [`state::db::Db`] handle; the HTTP layer in [`routes`] is a thin
//! adapter that validates query parameters and maps results to status codes.

pub mod app;
pub mod config;
pub mod errors;
pub mod routes;
pub mod services;
pub mod state;
