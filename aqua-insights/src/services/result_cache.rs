//! Result Cache Service
//!
//! Cache-aside fetching: a selector is resolved from the Persistence Port when
//! possible and from the Transport Port otherwise. Resolution is coalesced per
//! cache key, so concurrent callers for one selector share a single remote
//! request.
//!
//! Persistence failures never fail a request. They are logged, remembered for
//! `/health`, and the request continues as if the cache were empty.

use crate::models::{QuerySelector, ResultSet, ScoredRecord};
use crate::persistence::{Persist, StoredRecords};
use crate::transport::Transport;
use aqua_common::config::{CachePolicy, InsightsConfig};
use aqua_common::events::{EventBus, InsightsEvent};
use aqua_common::{Error, Result};
use chrono::Utc;
use futures::future::{BoxFuture, FutureExt, Shared};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info, warn};

/// Values the service needs from the resolved configuration
#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub base_uri: String,
    /// Sent with every remote request
    pub headers: Vec<(String, String)>,
    pub namespace: String,
    pub version: u32,
    pub policy: CachePolicy,
}

impl CacheSettings {
    pub fn from_config(config: &InsightsConfig) -> Self {
        Self {
            base_uri: config.base_uri.clone(),
            headers: vec![(config.api_key_header.clone(), config.api_key.clone())],
            namespace: config.namespace.clone(),
            version: config.persistence_version,
            policy: config.cache_policy,
        }
    }
}

/// Counters reported on `/health`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Answered from the store
    pub hits: u64,
    /// Remote requests issued
    pub remote_fetches: u64,
    /// Callers that joined an in-flight resolution
    pub coalesced: u64,
    /// Expired entries served because the remote failed
    pub stale_served: u64,
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    remote_fetches: AtomicU64,
    coalesced: AtomicU64,
    stale_served: AtomicU64,
}

/// Outcome of one resolution, shared between coalesced callers
#[derive(Debug, Clone)]
struct Resolved {
    records: Arc<Vec<ScoredRecord>>,
}

/// Error text only: coalesced callers each need their own copy
type SharedResolve = Shared<BoxFuture<'static, std::result::Result<Resolved, String>>>;

struct Inner {
    transport: Arc<dyn Transport>,
    persist: Arc<dyn Persist>,
    settings: CacheSettings,
    opened: OnceCell<()>,
    in_flight: Mutex<HashMap<String, SharedResolve>>,
    last_persistence_error: std::sync::RwLock<Option<String>>,
    counters: Counters,
    event_bus: Option<EventBus>,
}

/// Cheap to clone; clones share the store, the in-flight table and the counters
#[derive(Clone)]
pub struct ResultCacheService {
    inner: Arc<Inner>,
}

impl ResultCacheService {
    pub fn new(
        settings: CacheSettings,
        transport: Arc<dyn Transport>,
        persist: Arc<dyn Persist>,
        event_bus: Option<EventBus>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport,
                persist,
                settings,
                opened: OnceCell::new(),
                in_flight: Mutex::new(HashMap::new()),
                last_persistence_error: std::sync::RwLock::new(None),
                counters: Counters::default(),
                event_bus,
            }),
        }
    }

    /// Records for `selector`, from the store or the remote
    ///
    /// Fails with [`Error::Transport`] only when the remote fails and nothing
    /// stored can answer.
    pub async fn get_results(&self, selector: &QuerySelector) -> Result<ResultSet> {
        let key = selector.cache_key();

        let resolve = {
            let mut in_flight = self.inner.in_flight.lock().await;
            match in_flight.get(&key) {
                Some(existing) => {
                    self.inner.counters.coalesced.fetch_add(1, Ordering::Relaxed);
                    debug!(key = %key, "Joining in-flight resolution");
                    existing.clone()
                }
                None => {
                    let resolve = Inner::spawn_resolve(Arc::clone(&self.inner), *selector, key.clone());
                    in_flight.insert(key.clone(), resolve.clone());
                    resolve
                }
            }
        };

        let resolved = resolve.await.map_err(Error::Transport)?;
        Ok(ResultSet::new(resolved.records.as_ref().clone(), key))
    }

    /// Host data-provider entry point: the selector arrives as JSON text
    pub async fn get_results_from_string_selector(&self, selector: &str) -> Result<ResultSet> {
        let selector = QuerySelector::from_json_str(selector)?;
        self.get_results(&selector).await
    }

    /// Drop the stored entry for `selector`
    ///
    /// Unlike lookups, an unavailable store is reported to the caller here.
    pub async fn evict(&self, selector: &QuerySelector) -> Result<()> {
        let key = selector.cache_key();
        self.inner.ensure_open().await?;
        self.inner.persist.remove(&key).await.map_err(|e| {
            self.inner.record_persistence_error("remove", &e);
            e
        })?;
        info!(key = %key, "Evicted cached result set");
        Ok(())
    }

    pub fn stats(&self) -> CacheStats {
        let c = &self.inner.counters;
        CacheStats {
            hits: c.hits.load(Ordering::Relaxed),
            remote_fetches: c.remote_fetches.load(Ordering::Relaxed),
            coalesced: c.coalesced.load(Ordering::Relaxed),
            stale_served: c.stale_served.load(Ordering::Relaxed),
        }
    }

    /// Most recent persistence failure, if any
    pub fn last_persistence_error(&self) -> Option<String> {
        self.inner
            .last_persistence_error
            .read()
            .map(|e| e.clone())
            .unwrap_or_default()
    }
}

impl Inner {
    /// Run the resolution on its own task so it completes even if every
    /// caller goes away; the result still lands in the store.
    fn spawn_resolve(inner: Arc<Inner>, selector: QuerySelector, key: String) -> SharedResolve {
        let handle = tokio::spawn(async move {
            let outcome = inner.resolve(&selector, &key).await;
            inner.in_flight.lock().await.remove(&key);
            outcome
        });

        async move {
            match handle.await {
                Ok(outcome) => outcome,
                Err(e) => Err(format!("resolution task failed: {}", e)),
            }
        }
        .boxed()
        .shared()
    }

    async fn resolve(&self, selector: &QuerySelector, key: &str) -> std::result::Result<Resolved, String> {
        let stored = self.lookup(key).await;

        let expired = match stored {
            Some(stored) if self.is_fresh(&stored) => {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key, count = stored.records.len(), "Cache hit");
                self.announce(key, stored.records.len(), true);
                return Ok(Resolved {
                    records: Arc::new(stored.records),
                });
            }
            Some(stored) => {
                debug!(key = %key, stored_at = %stored.stored_at, "Cached entry expired");
                Some(stored)
            }
            None => None,
        };

        self.counters.remote_fetches.fetch_add(1, Ordering::Relaxed);
        info!(key = %key, "Cache miss, fetching from remote");

        let records = match self
            .transport
            .request(&self.settings.base_uri, selector, &self.settings.headers)
            .await
        {
            Ok(records) => records,
            Err(e) => {
                return match expired {
                    Some(stale) => {
                        self.counters.stale_served.fetch_add(1, Ordering::Relaxed);
                        warn!(key = %key, error = %e, "Remote failed, serving expired entry");
                        Ok(Resolved {
                            records: Arc::new(stale.records),
                        })
                    }
                    None => Err(transport_message(e)),
                };
            }
        };

        self.store(key, &records).await;
        self.announce(key, records.len(), false);

        Ok(Resolved {
            records: Arc::new(records),
        })
    }

    /// `None` on a miss and on any store failure
    async fn lookup(&self, key: &str) -> Option<StoredRecords> {
        if let Err(e) = self.ensure_open().await {
            self.record_persistence_error("open", &e);
            return None;
        }
        match self.persist.get(key).await {
            Ok(stored) => stored,
            Err(e) => {
                self.record_persistence_error("get", &e);
                None
            }
        }
    }

    async fn store(&self, key: &str, records: &[ScoredRecord]) {
        if self.opened.get().is_none() {
            // open already failed during lookup
            return;
        }
        if let Err(e) = self.persist.set(key, records).await {
            self.record_persistence_error("set", &e);
        }
    }

    /// Opens the store once; a failed open is retried by the next request
    async fn ensure_open(&self) -> Result<()> {
        self.opened
            .get_or_try_init(|| async {
                self.persist
                    .open(&self.settings.namespace, self.settings.version)
                    .await
            })
            .await?;
        Ok(())
    }

    fn is_fresh(&self, stored: &StoredRecords) -> bool {
        match self.settings.policy {
            CachePolicy::UntilEvicted => true,
            CachePolicy::MaxAge(max_age) => {
                // Clock skew into the future counts as fresh
                let age = (Utc::now() - stored.stored_at).to_std().unwrap_or_default();
                age <= max_age
            }
        }
    }

    fn record_persistence_error(&self, operation: &str, e: &Error) {
        warn!(operation, error = %e, "Result cache store unavailable, continuing without it");
        if let Ok(mut last) = self.last_persistence_error.write() {
            *last = Some(format!("{}: {}", operation, e));
        }
    }

    fn announce(&self, key: &str, record_count: usize, from_cache: bool) {
        if let Some(bus) = &self.event_bus {
            bus.emit_lossy(InsightsEvent::ResultsFetched {
                result_set_id: key.to_string(),
                record_count,
                from_cache,
                timestamp: Utc::now(),
            });
        }
    }
}

fn transport_message(e: Error) -> String {
    match e {
        Error::Transport(msg) => msg,
        other => other.to_string(),
    }
}
