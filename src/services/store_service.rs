use chrono::Utc;

use crate::errors::StoreError;
use crate::state::db::{Db, IndexEntry, LatestRecord, Record, Stats, StoreAction, StoreOutcome};

/// How many insert/update rounds an upsert may lose before giving up. More
/// than one round only happens when a concurrent delete lands between our
/// failed insert and the fallback update.
const MAX_UPSERT_ATTEMPTS: u32 = 3;

/// Store `data` under `index`, creating the record or overwriting an
/// existing one.
///
/// The insert runs first; a unique-constraint violation means the key is
/// already live, so we fall back to an update that refreshes `data` and
/// `updated_at` while leaving `created_at` untouched. If the update affects
/// zero rows the record was deleted out from under us, and the insert is
/// retried.
pub async fn store(db: &Db, index: &str, data: &str) -> Result<StoreOutcome, StoreError> {
    for _ in 0..MAX_UPSERT_ATTEMPTS {
        let now = Utc::now();
        let inserted = sqlx::query(
            "INSERT INTO strings (index_key, data, created_at, updated_at) VALUES (?, ?, ?, ?)",
        )
        .bind(index)
        .bind(data)
        .bind(now)
        .bind(now)
        .execute(db.pool())
        .await;

        match inserted {
            Ok(_) => {
                return Ok(StoreOutcome {
                    action: StoreAction::Created,
                    index: index.to_string(),
                    length: data.chars().count(),
                })
            }
            Err(err) if is_unique_violation(&err) => {
                let updated =
                    sqlx::query("UPDATE strings SET data = ?, updated_at = ? WHERE index_key = ?")
                        .bind(data)
                        .bind(Utc::now())
                        .bind(index)
                        .execute(db.pool())
                        .await?;

                if updated.rows_affected() > 0 {
                    return Ok(StoreOutcome {
                        action: StoreAction::Updated,
                        index: index.to_string(),
                        length: data.chars().count(),
                    });
                }
                // Row vanished between insert and update; take another round.
            }
            Err(err) => return Err(err.into()),
        }
    }

    Err(StoreError::UpsertContention(index.to_string()))
}

/// Point lookup by exact key. Absence is a normal outcome, not a fault.
pub async fn get(db: &Db, index: &str) -> Result<Option<Record>, StoreError> {
    let record = sqlx::query_as::<_, Record>(
        "SELECT index_key, data, created_at, updated_at FROM strings WHERE index_key = ?",
    )
    .bind(index)
    .fetch_optional(db.pool())
    .await?;

    Ok(record)
}

/// Remove the record under `index`. Returns whether a row was deleted;
/// deleting a missing key is not an error.
pub async fn delete(db: &Db, index: &str) -> Result<bool, StoreError> {
    let result = sqlx::query("DELETE FROM strings WHERE index_key = ?")
        .bind(index)
        .execute(db.pool())
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Enumerate every live record, newest creation first. Payloads are reported
/// as lengths only; callers needing the value must `get` per key.
pub async fn list_all(db: &Db) -> Result<Vec<IndexEntry>, StoreError> {
    let entries = sqlx::query_as::<_, IndexEntry>(
        "SELECT index_key, created_at, updated_at, LENGTH(data) AS data_length \
         FROM strings ORDER BY created_at DESC, id DESC",
    )
    .fetch_all(db.pool())
    .await?;

    Ok(entries)
}

/// Aggregate statistics over the table. `latest_record` is present only when
/// at least one record exists.
pub async fn stats(db: &Db) -> Result<Stats, StoreError> {
    let total_records = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM strings")
        .fetch_one(db.pool())
        .await?;

    let total_data_size =
        sqlx::query_scalar::<_, i64>("SELECT COALESCE(SUM(LENGTH(data)), 0) FROM strings")
            .fetch_one(db.pool())
            .await?;

    let latest_record = sqlx::query_as::<_, LatestRecord>(
        "SELECT index_key, created_at FROM strings ORDER BY created_at DESC, id DESC LIMIT 1",
    )
    .fetch_optional(db.pool())
    .await?;

    Ok(Stats {
        total_records,
        total_data_size,
        database_file: db.path().to_string(),
        database_exists: db.exists(),
        latest_record,
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_db() -> Db {
        Db::connect(":memory:").await.unwrap()
    }

    #[tokio::test]
    async fn first_store_round_trips() {
        let db = test_db().await;

        let outcome = store(&db, "user1", "hello").await.unwrap();
        assert_eq!(outcome.action, StoreAction::Created);
        assert_eq!(outcome.index, "user1");
        assert_eq!(outcome.length, 5);

        let record = get(&db, "user1").await.unwrap().unwrap();
        assert_eq!(record.data, "hello");
        assert_eq!(record.created_at, record.updated_at);
    }

    #[tokio::test]
    async fn restore_updates_value_and_preserves_created_at() {
        let db = test_db().await;

        store(&db, "k", "first").await.unwrap();
        let first = get(&db, "k").await.unwrap().unwrap();

        let outcome = store(&db, "k", "second").await.unwrap();
        assert_eq!(outcome.action, StoreAction::Updated);
        assert_eq!(outcome.length, 6);

        let second = get(&db, "k").await.unwrap().unwrap();
        assert_eq!(second.data, "second");
        assert_eq!(second.created_at, first.created_at);
        assert!(second.updated_at >= second.created_at);
    }

    #[tokio::test]
    async fn get_missing_key_is_none() {
        let db = test_db().await;
        assert!(get(&db, "nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn empty_index_is_a_legal_key() {
        let db = test_db().await;

        let outcome = store(&db, "", "payload").await.unwrap();
        assert_eq!(outcome.action, StoreAction::Created);

        let record = get(&db, "").await.unwrap().unwrap();
        assert_eq!(record.data, "payload");
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let db = test_db().await;

        assert!(!delete(&db, "ghost").await.unwrap());

        store(&db, "ghost", "boo").await.unwrap();
        assert!(delete(&db, "ghost").await.unwrap());
        assert!(!delete(&db, "ghost").await.unwrap());
        assert!(get(&db, "ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let db = test_db().await;

        store(&db, "a", "1").await.unwrap();
        store(&db, "b", "2").await.unwrap();
        store(&db, "c", "3").await.unwrap();

        let entries = list_all(&db).await.unwrap();
        let order: Vec<&str> = entries.iter().map(|e| e.index.as_str()).collect();
        assert_eq!(order, vec!["c", "b", "a"]);
    }

    #[tokio::test]
    async fn list_reports_lengths_not_values() {
        let db = test_db().await;

        store(&db, "k", "four").await.unwrap();

        let entries = list_all(&db).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].data_length, 4);
    }

    #[tokio::test]
    async fn stats_on_empty_table() {
        let db = test_db().await;

        let s = stats(&db).await.unwrap();
        assert_eq!(s.total_records, 0);
        assert_eq!(s.total_data_size, 0);
        assert!(s.latest_record.is_none());
        assert_eq!(s.database_file, ":memory:");
    }

    #[tokio::test]
    async fn stats_counts_records_and_sizes() {
        let db = test_db().await;

        store(&db, "a", "xx").await.unwrap();
        store(&db, "b", "y").await.unwrap();

        let s = stats(&db).await.unwrap();
        assert_eq!(s.total_records, 2);
        assert_eq!(s.total_data_size, 3);
        assert_eq!(s.latest_record.unwrap().index, "b");
    }

    #[tokio::test]
    async fn stats_size_ignores_overwritten_values() {
        let db = test_db().await;

        store(&db, "k", "longer-value").await.unwrap();
        store(&db, "k", "xy").await.unwrap();

        let s = stats(&db).await.unwrap();
        assert_eq!(s.total_records, 1);
        assert_eq!(s.total_data_size, 2);
    }

    #[tokio::test]
    async fn concurrent_stores_to_one_key_leave_one_row() {
        let db = test_db().await;

        let mut handles = Vec::new();
        for i in 0..8 {
            let db = db.clone();
            handles.push(tokio::spawn(async move {
                store(&db, "hot", &format!("v{i}")).await.unwrap()
            }));
        }

        let mut created = 0;
        for handle in handles {
            let outcome = handle.await.unwrap();
            if outcome.action == StoreAction::Created {
                created += 1;
            }
        }
        assert_eq!(created, 1);

        let entries = list_all(&db).await.unwrap();
        assert_eq!(entries.len(), 1);

        let record = get(&db, "hot").await.unwrap().unwrap();
        let inputs: Vec<String> = (0..8).map(|i| format!("v{i}")).collect();
        assert!(inputs.contains(&record.data));
    }

    #[tokio::test]
    async fn data_survives_reconnect() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("strings.db");
        let path = path.to_str().unwrap();

        {
            let db = Db::connect(path).await.unwrap();
            store(&db, "k", "v").await.unwrap();
            assert!(stats(&db).await.unwrap().database_exists);
            db.close().await;
        }

        let db = Db::connect(path).await.unwrap();
        assert_eq!(get(&db, "k").await.unwrap().unwrap().data, "v");
    }

    #[tokio::test]
    async fn full_lifecycle_scenario() {
        let db = test_db().await;

        let outcome = store(&db, "user1", "hello").await.unwrap();
        assert_eq!(outcome.action, StoreAction::Created);
        assert_eq!(outcome.length, 5);

        assert_eq!(get(&db, "user1").await.unwrap().unwrap().data, "hello");

        let outcome = store(&db, "user1", "hi").await.unwrap();
        assert_eq!(outcome.action, StoreAction::Updated);
        assert_eq!(outcome.length, 2);

        assert!(delete(&db, "user1").await.unwrap());
        assert!(get(&db, "user1").await.unwrap().is_none());
        assert!(!delete(&db, "user1").await.unwrap());
    }
}
