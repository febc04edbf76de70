use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::SqlitePool;

use crate::errors::StoreError;

/// A full stored record, as returned by a point lookup.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Record {
    #[sqlx(rename = "index_key")]
    pub index: String,
    pub data: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Metadata for one record as reported by the enumeration: everything except
/// the payload itself, whose size is capped to its length.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct IndexEntry {
    #[sqlx(rename = "index_key")]
    pub index: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub data_length: i64,
}

/// Key and creation time of the most recently created record.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct LatestRecord {
    #[sqlx(rename = "index_key")]
    pub index: String,
    pub created_at: DateTime<Utc>,
}

/// Aggregate view over the whole table.
#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    pub total_records: i64,
    pub total_data_size: i64,
    pub database_file: String,
    pub database_exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_record: Option<LatestRecord>,
}

/// Which branch an upsert took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreAction {
    Created,
    Updated,
}

/// Result of a store call: the branch taken, the key written, and the
/// character length of the stored value (never the value itself).
#[derive(Debug, Clone, Serialize)]
pub struct StoreOutcome {
    pub action: StoreAction,
    pub index: String,
    pub length: usize,
}

/// Shared handle to the backing SQLite database.
///
/// Cloning is cheap; all clones share one pool. Each query checks a
/// connection out of the pool and returns it on every exit path, so no
/// connection is ever held across operations.
#[derive(Clone)]
pub struct Db {
    pool: SqlitePool,
    path: String,
}

impl Db {
    /// Open (creating if missing) the database at `path` and ensure the
    /// schema exists. `:memory:` opens a private in-memory database.
    pub async fn connect(path: &str) -> Result<Self, StoreError> {
        let opts = if path == ":memory:" {
            SqliteConnectOptions::from_str("sqlite::memory:")?
        } else {
            SqliteConnectOptions::from_str(&format!("sqlite:{path}?mode=rwc"))?
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
                // Transient "database is locked" under concurrent writes.
                .busy_timeout(Duration::from_secs(5))
        };

        // SQLite allows a single writer at a time; one pooled connection
        // serializes writes instead of bouncing off the lock. Recycling that
        // connection would drop a `:memory:` database, so it lives as long
        // as the pool does.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(opts)
            .await?;

        let db = Self {
            pool,
            path: path.to_string(),
        };
        db.init_schema().await?;

        Ok(db)
    }

    async fn init_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS strings (
                id         INTEGER PRIMARY KEY AUTOINCREMENT,
                index_key  TEXT UNIQUE NOT NULL,
                data       TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Configured database location, as given to `connect`.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Whether the backing file is present on disk. Always false for
    /// `:memory:`, which has no on-disk presence to report.
    pub fn exists(&self) -> bool {
        Path::new(&self.path).exists()
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
