//! Persistence Port: a namespaced key → record-list store
//!
//! Every operation may fail with [`Error::Persistence`](aqua_common::Error::Persistence).
//! Callers treat failure as "cache unavailable", never as "cache says empty".

pub mod memory;
pub mod sqlite;

pub use memory::MemoryPersist;
pub use sqlite::SqlitePersist;

use crate::models::ScoredRecord;
use aqua_common::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Records as stored, with the time they were written
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecords {
    pub records: Vec<ScoredRecord>,
    pub stored_at: DateTime<Utc>,
}

#[async_trait]
pub trait Persist: Send + Sync {
    /// Scope all later calls to `namespace`/`version`; idempotent
    async fn open(&self, namespace: &str, version: u32) -> Result<()>;

    async fn get(&self, key: &str) -> Result<Option<StoredRecords>>;

    /// Replace whatever is stored under `key` (last writer wins)
    async fn set(&self, key: &str, records: &[ScoredRecord]) -> Result<()>;

    /// Removing an absent key is not an error
    async fn remove(&self, key: &str) -> Result<()>;
}

/// (namespace, version) chosen by `open`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct Scope {
    pub namespace: String,
    pub version: u32,
}

pub(crate) fn not_opened() -> aqua_common::Error {
    aqua_common::Error::Persistence("store not opened".to_string())
}
