//! Key-value storage using SQLite

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::KeyValueStore,
};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
    Row,
};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::debug;

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS kv_store (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL,
        updated_at INTEGER NOT NULL
    )
"#;

/// SQLite-backed [`KeyValueStore`].
///
/// Stands in for the platform key-value storage mobile hosts provide. Every
/// key maps to one row; writes are upserts.
pub struct SqliteKeyValueStore {
    pool: SqlitePool,
}

impl SqliteKeyValueStore {
    /// Open (or create) a store at `db_path`.
    pub async fn new(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(BridgeError::Io)?;
        }

        // SQLite URLs want forward slashes even on Windows
        let path_str = db_path.to_string_lossy().replace('\\', "/");
        let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", path_str))
            .map_err(|e| BridgeError::DatabaseError(format!("Invalid database path: {}", e)))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Failed to connect to DB: {}", e)))?;

        Self::create_schema(&pool).await?;
        debug!(path = ?db_path, "Initialized key-value store");

        Ok(Self { pool })
    }

    /// Create a store that lives only as long as this value (for testing).
    pub async fn in_memory() -> Result<Self> {
        // A single connection, otherwise each pooled connection would see
        // its own empty in-memory database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Failed to connect to DB: {}", e)))?;

        Self::create_schema(&pool).await?;
        Ok(Self { pool })
    }

    async fn create_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::query(CREATE_TABLE)
            .execute(pool)
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Failed to create table: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for SqliteKeyValueStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Failed to read key: {}", e)))?;

        Ok(row.map(|row| row.get::<String, _>(0)))
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await
        .map_err(|e| BridgeError::DatabaseError(format!("Failed to write key: {}", e)))?;

        debug!(key = key, bytes = value.len(), "Stored item");
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM kv_store WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Failed to delete key: {}", e)))?;

        debug!(key = key, "Removed item");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_remove() {
        let store = SqliteKeyValueStore::in_memory().await.unwrap();

        assert_eq!(store.get_item("songs").await.unwrap(), None);

        store.set_item("songs", "[]").await.unwrap();
        assert_eq!(store.get_item("songs").await.unwrap(), Some("[]".to_string()));
        assert!(store.contains_key("songs").await.unwrap());

        store.remove_item("songs").await.unwrap();
        assert_eq!(store.get_item("songs").await.unwrap(), None);
        assert!(!store.contains_key("songs").await.unwrap());
    }

    #[tokio::test]
    async fn test_overwrite_keeps_single_row() {
        let store = SqliteKeyValueStore::in_memory().await.unwrap();

        store.set_item("k", "one").await.unwrap();
        store.set_item("k", "two").await.unwrap();

        assert_eq!(store.get_item("k").await.unwrap(), Some("two".to_string()));
        let rows: i64 = sqlx::query("SELECT COUNT(*) FROM kv_store")
            .fetch_one(&store.pool)
            .await
            .unwrap()
            .get(0);
        assert_eq!(rows, 1);
    }

    #[tokio::test]
    async fn test_remove_missing_key_is_ok() {
        let store = SqliteKeyValueStore::in_memory().await.unwrap();
        store.remove_item("missing").await.unwrap();
    }

    #[tokio::test]
    async fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.db");

        {
            let store = SqliteKeyValueStore::new(path.clone()).await.unwrap();
            store.set_item("a", "1").await.unwrap();
            store.set_item("b", "2").await.unwrap();
        }

        let reopened = SqliteKeyValueStore::new(path).await.unwrap();
        assert_eq!(reopened.get_item("a").await.unwrap(), Some("1".to_string()));
        assert_eq!(reopened.get_item("b").await.unwrap(), Some("2".to_string()));
    }
}
