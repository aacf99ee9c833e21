//! Shared test doubles for the Transport and Persistence ports

#![allow(dead_code)]

pub mod log_capture;

use aqua_common::config::CachePolicy;
use aqua_common::{Error, Result};
use aqua_insights::models::{QuerySelector, ScoredRecord};
use aqua_insights::persistence::{Persist, StoredRecords};
use aqua_insights::services::{CacheSettings, ResultCacheService};
use aqua_insights::transport::Transport;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Mutex};

pub const ASSESSMENT_ID: u32 = 211;

pub fn settings(policy: CachePolicy) -> CacheSettings {
    CacheSettings {
        base_uri: "http://remote.test".to_string(),
        headers: vec![("api_key".to_string(), "secret".to_string())],
        namespace: "aqua".to_string(),
        version: 1,
        policy,
    }
}

pub fn scored(vref: &str, score: Option<f64>) -> ScoredRecord {
    ScoredRecord::new(vref, score)
}

/// Canned answers per selector, counting every remote call
#[derive(Default)]
pub struct MockTransport {
    responses: std::sync::Mutex<HashMap<String, Vec<ScoredRecord>>>,
    gates: Mutex<HashMap<String, oneshot::Receiver<()>>>,
    calls: AtomicUsize,
    fail: AtomicBool,
    delay: Option<Duration>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every request sleeps first, widening coalescing windows
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn respond(&self, selector: &QuerySelector, records: Vec<ScoredRecord>) {
        self.responses
            .lock()
            .unwrap()
            .insert(selector.cache_key(), records);
    }

    /// Hold the next request for `selector` until the returned sender fires
    pub async fn gate(&self, selector: &QuerySelector) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().await.insert(selector.cache_key(), rx);
        tx
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn request(
        &self,
        _base_uri: &str,
        selector: &QuerySelector,
        headers: &[(String, String)],
    ) -> Result<Vec<ScoredRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(headers.iter().any(|(name, _)| name == "api_key"));

        let key = selector.cache_key();
        let gate = self.gates.lock().await.remove(&key);
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Transport("remote unreachable".to_string()));
        }
        Ok(self
            .responses
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .unwrap_or_default())
    }
}

/// A store that is always unavailable
pub struct BrokenPersist;

#[async_trait]
impl Persist for BrokenPersist {
    async fn open(&self, _namespace: &str, _version: u32) -> Result<()> {
        Err(Error::Persistence("disk full".to_string()))
    }

    async fn get(&self, _key: &str) -> Result<Option<StoredRecords>> {
        Err(Error::Persistence("disk full".to_string()))
    }

    async fn set(&self, _key: &str, _records: &[ScoredRecord]) -> Result<()> {
        Err(Error::Persistence("disk full".to_string()))
    }

    async fn remove(&self, _key: &str) -> Result<()> {
        Err(Error::Persistence("disk full".to_string()))
    }
}

/// A store whose reads work but whose writes fail
pub struct ReadOnlyPersist {
    pub inner: aqua_insights::persistence::MemoryPersist,
}

#[async_trait]
impl Persist for ReadOnlyPersist {
    async fn open(&self, namespace: &str, version: u32) -> Result<()> {
        self.inner.open(namespace, version).await
    }

    async fn get(&self, key: &str) -> Result<Option<StoredRecords>> {
        self.inner.get(key).await
    }

    async fn set(&self, _key: &str, _records: &[ScoredRecord]) -> Result<()> {
        Err(Error::Persistence("read-only".to_string()))
    }

    async fn remove(&self, _key: &str) -> Result<()> {
        Err(Error::Persistence("read-only".to_string()))
    }
}

pub fn service(
    transport: Arc<MockTransport>,
    persist: Arc<dyn Persist>,
    policy: CachePolicy,
) -> ResultCacheService {
    ResultCacheService::new(settings(policy), transport, persist, None)
}
