//! Key-value storage using SQLite

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::StorageBackend,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::path::{Path, PathBuf};
use tokio::sync::OnceCell;
use tracing::debug;

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS controller_storage (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL,
        updated_at INTEGER NOT NULL
    )
"#;

#[derive(Debug, Clone)]
enum Location {
    File(PathBuf),
    Memory,
}

/// SQLite-backed [`StorageBackend`].
///
/// The database is opened on first use, so the store can be constructed from
/// synchronous code (the controller config builder) and only needs a Tokio
/// runtime once a controller actually reads or writes.
pub struct SqliteStorage {
    location: Location,
    pool: OnceCell<SqlitePool>,
}

impl SqliteStorage {
    /// Storage backed by the database file at `db_path`. Parent directories
    /// are created on first use.
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            location: Location::File(db_path.into()),
            pool: OnceCell::new(),
        }
    }

    /// Storage that lives as long as this value (for tests and previews).
    pub fn in_memory() -> Self {
        Self {
            location: Location::Memory,
            pool: OnceCell::new(),
        }
    }

    /// `<platform data dir>/media-sdk/controller.db`, if the platform has a
    /// data directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join("media-sdk").join("controller.db"))
    }

    /// Database file path, `None` for in-memory storage.
    pub fn path(&self) -> Option<&Path> {
        match &self.location {
            Location::File(path) => Some(path),
            Location::Memory => None,
        }
    }

    async fn pool(&self) -> Result<&SqlitePool> {
        self.pool.get_or_try_init(|| self.connect()).await
    }

    async fn connect(&self) -> Result<SqlitePool> {
        let pool = match &self.location {
            Location::File(path) => {
                if let Some(parent) = path.parent() {
                    tokio::fs::create_dir_all(parent).await.map_err(|e| {
                        BridgeError::OperationFailed(format!(
                            "Failed to create {}: {}",
                            parent.display(),
                            e
                        ))
                    })?;
                }

                let options = SqliteConnectOptions::new()
                    .filename(path)
                    .create_if_missing(true);
                SqlitePoolOptions::new()
                    .max_connections(4)
                    .connect_with(options)
                    .await
            }
            Location::Memory => {
                let options: SqliteConnectOptions = "sqlite::memory:".parse().map_err(
                    |e: sqlx::Error| BridgeError::OperationFailed(e.to_string()),
                )?;
                // every connection would get its own database
                SqlitePoolOptions::new()
                    .max_connections(1)
                    .idle_timeout(None)
                    .max_lifetime(None)
                    .connect_with(options)
                    .await
            }
        }
        .map_err(|e| BridgeError::OperationFailed(format!("Failed to connect to DB: {}", e)))?;

        sqlx::query(CREATE_TABLE)
            .execute(&pool)
            .await
            .map_err(|e| BridgeError::OperationFailed(format!("Failed to create table: {}", e)))?;

        debug!(location = ?self.location, "Initialized controller storage");
        Ok(pool)
    }

    fn now() -> i64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for SqliteStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStorage")
            .field("location", &self.location)
            .field("connected", &self.pool.initialized())
            .finish()
    }
}

#[async_trait]
impl StorageBackend for SqliteStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM controller_storage WHERE key = ?")
            .bind(key)
            .fetch_optional(self.pool().await?)
            .await
            .map_err(|e| BridgeError::OperationFailed(format!("Failed to read item: {}", e)))?;

        Ok(row.map(|row| row.get::<String, _>(0)))
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO controller_storage (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Self::now())
        .execute(self.pool().await?)
        .await
        .map_err(|e| BridgeError::OperationFailed(format!("Failed to write item: {}", e)))?;

        debug!(key, "Stored item");
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM controller_storage WHERE key = ?")
            .bind(key)
            .execute(self.pool().await?)
            .await
            .map_err(|e| BridgeError::OperationFailed(format!("Failed to remove item: {}", e)))?;

        debug!(key, "Removed item");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_db() -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir()
            .join(format!("media-sdk-{}-{}", std::process::id(), nanos))
            .join("controller.db")
    }

    #[tokio::test]
    async fn test_in_memory_round_trip() {
        let storage = SqliteStorage::in_memory();

        assert_eq!(storage.get_item("volume").await.unwrap(), None);
        storage.set_item("volume", "0.4").await.unwrap();
        assert_eq!(storage.get_item("volume").await.unwrap(), Some("0.4".to_string()));

        storage.set_item("volume", "0.9").await.unwrap();
        assert_eq!(storage.get_item("volume").await.unwrap(), Some("0.9".to_string()));

        storage.remove_item("volume").await.unwrap();
        assert_eq!(storage.get_item("volume").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_remove_missing_key() {
        let storage = SqliteStorage::in_memory();
        storage.remove_item("never-set").await.unwrap();
    }

    #[tokio::test]
    async fn test_file_storage_survives_reopen() {
        let path = temp_db();

        let first = SqliteStorage::new(&path);
        first.set_item("livepeer-media-controller", "{}").await.unwrap();
        drop(first);

        let second = SqliteStorage::new(&path);
        assert_eq!(
            second.get_item("livepeer-media-controller").await.unwrap(),
            Some("{}".to_string())
        );

        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn test_construction_is_lazy() {
        let storage = SqliteStorage::new("/nonexistent/dir/controller.db");
        assert_eq!(storage.path(), Some(Path::new("/nonexistent/dir/controller.db")));
        assert!(format!("{:?}", storage).contains("connected: false"));
    }

    #[test]
    fn test_default_path_file_name() {
        if let Some(path) = SqliteStorage::default_path() {
            assert!(path.ends_with("media-sdk/controller.db"));
        }
    }
}
