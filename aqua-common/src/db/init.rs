//! Database initialization
//!
//! Opens (creating if needed) the SQLite file that backs the persistent
//! result cache. Table creation belongs to the store that owns the table.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Busy timeout applied to every pool
pub const BUSY_TIMEOUT_MS: u64 = 5000;

/// Initialize database connection pool, creating the file and parent folder
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Applied to every pooled connection
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(BUSY_TIMEOUT_MS));

    let pool = SqlitePoolOptions::new()
        .max_connections(8)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_database_creates_file_and_parent() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested").join("cache.db");

        let pool = init_database(&db_path).await.unwrap();
        assert!(db_path.exists());

        let mode: String = sqlx::query_scalar("PRAGMA journal_mode")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
    }
}
