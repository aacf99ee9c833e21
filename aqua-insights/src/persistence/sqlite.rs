//! SQLite-backed persistence
//!
//! One row per (namespace, version, key); the record list is stored as JSON.

use super::{not_opened, Persist, Scope, StoredRecords};
use crate::models::ScoredRecord;
use aqua_common::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use tokio::sync::RwLock;
use tracing::{debug, info};

pub struct SqlitePersist {
    pool: SqlitePool,
    scope: RwLock<Option<Scope>>,
}

impl SqlitePersist {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            scope: RwLock::new(None),
        }
    }

    async fn scope(&self) -> Result<Scope> {
        self.scope.read().await.clone().ok_or_else(not_opened)
    }
}

fn persistence_error(operation: &str, e: impl std::fmt::Display) -> Error {
    Error::Persistence(format!("{} failed: {}", operation, e))
}

#[async_trait]
impl Persist for SqlitePersist {
    async fn open(&self, namespace: &str, version: u32) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS result_cache (
                namespace TEXT NOT NULL,
                version INTEGER NOT NULL,
                store_key TEXT NOT NULL,
                items TEXT NOT NULL,
                stored_at TEXT NOT NULL,
                PRIMARY KEY (namespace, version, store_key)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| persistence_error("open", e))?;

        *self.scope.write().await = Some(Scope {
            namespace: namespace.to_string(),
            version,
        });

        info!(namespace, version, "Result cache store opened");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<StoredRecords>> {
        let scope = self.scope().await?;

        let row = sqlx::query(
            r#"
            SELECT items, stored_at
            FROM result_cache
            WHERE namespace = ? AND version = ? AND store_key = ?
            "#,
        )
        .bind(&scope.namespace)
        .bind(i64::from(scope.version))
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| persistence_error("get", e))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items: String = row.get("items");
        let records: Vec<ScoredRecord> =
            serde_json::from_str(&items).map_err(|e| persistence_error("decode items", e))?;

        let stored_at: String = row.get("stored_at");
        let stored_at = DateTime::parse_from_rfc3339(&stored_at)
            .map_err(|e| persistence_error("decode stored_at", e))?
            .with_timezone(&Utc);

        Ok(Some(StoredRecords { records, stored_at }))
    }

    async fn set(&self, key: &str, records: &[ScoredRecord]) -> Result<()> {
        let scope = self.scope().await?;
        // Prepare all data before touching the pool
        let items = serde_json::to_string(records).map_err(|e| persistence_error("encode", e))?;
        let stored_at = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO result_cache (namespace, version, store_key, items, stored_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(namespace, version, store_key) DO UPDATE SET
                items = excluded.items,
                stored_at = excluded.stored_at
            "#,
        )
        .bind(&scope.namespace)
        .bind(i64::from(scope.version))
        .bind(key)
        .bind(&items)
        .bind(&stored_at)
        .execute(&self.pool)
        .await
        .map_err(|e| persistence_error("set", e))?;

        debug!(key, count = records.len(), "Result set persisted");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let scope = self.scope().await?;

        sqlx::query(
            "DELETE FROM result_cache WHERE namespace = ? AND version = ? AND store_key = ?",
        )
        .bind(&scope.namespace)
        .bind(i64::from(scope.version))
        .bind(key)
        .execute(&self.pool)
        .await
        .map_err(|e| persistence_error("remove", e))?;

        Ok(())
    }
}
