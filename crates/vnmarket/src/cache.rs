//! TTL cache for slow-changing per-symbol resources

use cached::{Cached, TimedCache};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Cache key: resource name plus upper-cased symbol
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub resource: &'static str,
    pub symbol: String,
}

impl CacheKey {
    pub fn new(resource: &'static str, symbol: impl AsRef<str>) -> Self {
        Self {
            resource,
            symbol: symbol.as_ref().to_uppercase(),
        }
    }
}

/// Thread-safe cache of decoded JSON responses
pub struct ResponseCache {
    cache: Arc<RwLock<TimedCache<CacheKey, serde_json::Value>>>,
}

impl ResponseCache {
    /// Create a new cache with specified TTL
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Arc::new(RwLock::new(TimedCache::with_lifespan(ttl))),
        }
    }

    pub async fn get(&self, key: &CacheKey) -> Option<serde_json::Value> {
        let mut cache = self.cache.write().await;
        cache.cache_get(key).cloned()
    }

    pub async fn insert(&self, key: CacheKey, value: serde_json::Value) {
        let mut cache = self.cache.write().await;
        let _ = cache.cache_set(key, value);
    }

    /// Return the cached value for `key`, or run `fetcher` and cache its result.
    ///
    /// Entries that no longer decode as `T` are treated as misses.
    pub async fn get_or_fetch<T, F, Fut, E>(&self, key: CacheKey, fetcher: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.get(&key).await {
            match serde_json::from_value(value) {
                Ok(hit) => {
                    tracing::debug!("Cache hit for {:?}", key);
                    return Ok(hit);
                }
                Err(e) => tracing::debug!("Discarding cached {:?}: {e}", key),
            }
        }

        tracing::debug!("Cache miss for {:?}", key);
        let fetched = fetcher().await?;

        match serde_json::to_value(&fetched) {
            Ok(value) => self.insert(key, value).await,
            Err(e) => tracing::warn!("Not caching {:?}: {e}", key),
        }

        Ok(fetched)
    }

    pub async fn invalidate(&self, key: &CacheKey) {
        let mut cache = self.cache.write().await;
        let _ = cache.cache_remove(key);
    }

    /// Clear all cached entries
    pub async fn clear(&self) {
        let mut cache = self.cache.write().await;
        cache.cache_clear();
    }

    pub async fn len(&self) -> usize {
        let cache = self.cache.read().await;
        cache.cache_size()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Clone for ResponseCache {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
        }
    }
}
