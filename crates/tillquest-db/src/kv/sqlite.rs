//! SQLite-backed [`KvStore`] over the `kv_entries` table.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use super::KvStore;
use crate::error::DbResult;

/// Repository for the `kv_entries` table.
#[derive(Debug, Clone)]
pub struct SqliteKvStore {
    pool: SqlitePool,
}

impl SqliteKvStore {
    /// Creates a new SqliteKvStore.
    pub fn new(pool: SqlitePool) -> Self {
        SqliteKvStore { pool }
    }

    /// Lists stored keys, sorted.
    pub async fn keys(&self) -> DbResult<Vec<String>> {
        let keys: Vec<String> = sqlx::query_scalar("SELECT key FROM kv_entries ORDER BY key")
            .fetch_all(&self.pool)
            .await?;
        Ok(keys)
    }
}

impl KvStore for SqliteKvStore {
    async fn get(&self, key: &str) -> DbResult<Option<String>> {
        let value: Option<String> =
            sqlx::query_scalar("SELECT value FROM kv_entries WHERE key = ?1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> DbResult<()> {
        debug!(key = %key, bytes = value.len(), "Writing kv entry");

        sqlx::query(
            r#"
            INSERT INTO kv_entries (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn remove(&self, key: &str) -> DbResult<()> {
        debug!(key = %key, "Removing kv entry");

        sqlx::query("DELETE FROM kv_entries WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn remove_if(&self, key: &str, expected: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM kv_entries WHERE key = ?1 AND value = ?2")
            .bind(key)
            .bind(expected)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn replace_if(&self, key: &str, expected: &str, value: &str) -> DbResult<bool> {
        debug!(key = %key, bytes = value.len(), "Replacing kv entry");

        let result = sqlx::query(
            "UPDATE kv_entries SET value = ?3, updated_at = ?4 WHERE key = ?1 AND value = ?2",
        )
        .bind(key)
        .bind(expected)
        .bind(value)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn clear(&self) -> DbResult<()> {
        debug!("Clearing all kv entries");

        sqlx::query("DELETE FROM kv_entries")
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
