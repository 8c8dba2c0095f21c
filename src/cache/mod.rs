use crate::core::constants;
use async_trait::async_trait;
use lazy_static::lazy_static;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use tracing::debug;

lazy_static! {
    static ref SHARED_CACHE: Arc<ByteCache> = Arc::new(ByteCache::new(CacheConfig::default()));
}

/// The caching seam the resource loader depends on.
///
/// Implementations must be safe under concurrent callers; the default
/// [`ByteCache`] funnels all access through one mutex.
#[async_trait]
pub trait ByteCaching: Send + Sync {
    /// Returns the cached payload for the key, if present.
    async fn get(&self, key: &str) -> Option<Vec<u8>>;

    /// Inserts or replaces the payload for the key, with cost = byte length.
    async fn insert(&self, key: &str, bytes: Vec<u8>);
}

/// Size limits for a [`ByteCache`], fixed at construction.
#[derive(Debug, Clone, Copy)]
pub struct CacheConfig {
    pub count_limit: usize,
    pub total_cost_limit: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            count_limit: constants::CACHE_COUNT_LIMIT,
            total_cost_limit: constants::CACHE_TOTAL_COST_LIMIT,
        }
    }
}

struct CacheInner {
    entries: LruCache<String, Vec<u8>>,
    count_limit: usize,
    total_cost: usize,
    total_cost_limit: usize,
}

/// An in-memory byte cache bounded by entry count and aggregate payload size.
///
/// Both limits hold after every insert; least-recently-used entries are
/// evicted until they do. Payloads are returned by copy, never by reference
/// into the cache.
pub struct ByteCache {
    inner: Mutex<CacheInner>,
}

impl ByteCache {
    pub fn new(config: CacheConfig) -> Self {
        let capacity = NonZeroUsize::new(config.count_limit).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(CacheInner {
                entries: LruCache::new(capacity),
                count_limit: config.count_limit,
                total_cost: 0,
                total_cost_limit: config.total_cost_limit,
            }),
        }
    }

    /// The process-wide cache instance used when no cache is injected.
    pub fn shared() -> Arc<ByteCache> {
        SHARED_CACHE.clone()
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.entries.get(key).cloned()
    }

    pub fn insert(&self, key: &str, bytes: Vec<u8>) {
        let cost = bytes.len();
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());

        // A zero count limit, like a payload larger than the whole cost
        // budget, means nothing can legally be retained.
        if inner.count_limit == 0 {
            debug!(key, "cache count limit is zero, skipping");
            return;
        }
        if cost > inner.total_cost_limit {
            debug!(key, cost, "payload exceeds cache cost limit, skipping");
            return;
        }

        if let Some(previous) = inner.entries.push(key.to_string(), bytes) {
            inner.total_cost -= previous.1.len();
        }
        inner.total_cost += cost;

        while inner.total_cost > inner.total_cost_limit {
            match inner.entries.pop_lru() {
                Some((_, evicted)) => inner.total_cost -= evicted.len(),
                None => break,
            }
        }
    }

    pub fn len(&self) -> usize {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn total_cost(&self) -> usize {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.total_cost
    }
}

#[async_trait]
impl ByteCaching for ByteCache {
    async fn get(&self, key: &str) -> Option<Vec<u8>> {
        ByteCache::get(self, key)
    }

    async fn insert(&self, key: &str, bytes: Vec<u8>) {
        ByteCache::insert(self, key, bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replaces_existing_entry() {
        let cache = ByteCache::new(CacheConfig {
            count_limit: 4,
            total_cost_limit: 100,
        });
        cache.insert("k", vec![1, 2, 3]);
        cache.insert("k", vec![9]);

        assert_eq!(cache.get("k"), Some(vec![9]));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.total_cost(), 1);
    }

    #[test]
    fn test_oversized_payload_not_retained() {
        let cache = ByteCache::new(CacheConfig {
            count_limit: 4,
            total_cost_limit: 8,
        });
        cache.insert("big", vec![0; 16]);
        assert!(cache.get("big").is_none());
        assert_eq!(cache.total_cost(), 0);
    }
}
