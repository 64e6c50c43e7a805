//! Time-bounded snapshot cache

use crate::model::StockSnapshot;
use cached::{Cached, TimedCache};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

/// Per-ticker snapshot cache
///
/// Entries expire `ttl` after insertion; eviction is purely time-based.
/// Clones share the same underlying storage.
#[derive(Clone)]
pub struct SnapshotCache {
    cache: Arc<RwLock<TimedCache<String, Arc<StockSnapshot>>>>,
    ttl: Duration,
}

impl SnapshotCache {
    /// Create a new cache with specified TTL
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Arc::new(RwLock::new(TimedCache::with_lifespan(ttl))),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Live snapshot for `symbol`, if any
    pub async fn get(&self, symbol: &str) -> Option<Arc<StockSnapshot>> {
        // TimedCache evicts expired entries on lookup, hence the write lock
        let mut cache = self.cache.write().await;
        cache.cache_get(symbol).cloned()
    }

    pub async fn insert(&self, symbol: impl Into<String>, snapshot: Arc<StockSnapshot>) {
        let mut cache = self.cache.write().await;
        let _ = cache.cache_set(symbol.into(), snapshot);
    }

    /// Return the cached snapshot or run `fetcher` and cache its result
    ///
    /// Errors from `fetcher` are returned as-is and leave the cache untouched.
    pub async fn get_or_fetch<F, Fut, E>(
        &self,
        symbol: &str,
        fetcher: F,
    ) -> Result<Arc<StockSnapshot>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<StockSnapshot, E>>,
    {
        if let Some(snapshot) = self.get(symbol).await {
            debug!(symbol, "Snapshot cache hit");
            return Ok(snapshot);
        }

        debug!(symbol, "Snapshot cache miss");
        let snapshot = Arc::new(fetcher().await?);
        self.insert(symbol, Arc::clone(&snapshot)).await;

        Ok(snapshot)
    }

    pub async fn invalidate(&self, symbol: &str) {
        let mut cache = self.cache.write().await;
        let _ = cache.cache_remove(symbol);
    }

    pub async fn clear(&self) {
        let mut cache = self.cache.write().await;
        cache.cache_clear();
    }

    /// Number of stored entries, expired ones included until next lookup
    pub async fn len(&self) -> usize {
        let cache = self.cache.read().await;
        cache.cache_size()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
