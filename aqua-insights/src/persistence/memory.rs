//! In-process persistence, for tests and hosts without storage

use super::{not_opened, Persist, Scope, StoredRecords};
use crate::models::ScoredRecord;
use aqua_common::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct MemoryPersist {
    scope: RwLock<Option<Scope>>,
    entries: RwLock<HashMap<(Scope, String), StoredRecords>>,
}

impl MemoryPersist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries across all scopes
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Seed or overwrite an entry with an explicit timestamp
    pub async fn insert_stored(&self, key: &str, stored: StoredRecords) -> Result<()> {
        let scope = self.scope().await?;
        self.entries
            .write()
            .await
            .insert((scope, key.to_string()), stored);
        Ok(())
    }

    async fn scope(&self) -> Result<Scope> {
        self.scope.read().await.clone().ok_or_else(not_opened)
    }
}

#[async_trait]
impl Persist for MemoryPersist {
    async fn open(&self, namespace: &str, version: u32) -> Result<()> {
        *self.scope.write().await = Some(Scope {
            namespace: namespace.to_string(),
            version,
        });
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<StoredRecords>> {
        let scope = self.scope().await?;
        Ok(self
            .entries
            .read()
            .await
            .get(&(scope, key.to_string()))
            .cloned())
    }

    async fn set(&self, key: &str, records: &[ScoredRecord]) -> Result<()> {
        self.insert_stored(
            key,
            StoredRecords {
                records: records.to_vec(),
                stored_at: Utc::now(),
            },
        )
        .await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let scope = self.scope().await?;
        self.entries.write().await.remove(&(scope, key.to_string()));
        Ok(())
    }
}
