// Cache tiers for upstream payloads and whole responses.
// Both tiers share one get/put interface so either can be swapped or disabled.

pub mod edge;
pub mod memory;
pub mod paths;
pub mod store;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

pub use edge::{CacheStatus, CachedResponse, EdgeCache};
pub use memory::{Disabled, MemoryStore};
pub use store::{DEFAULT_TTL, DiskStore};

/// A TTL-based key-value store.
///
/// Implementations must be individually atomic per key; callers never hold
/// locks across calls.
#[async_trait]
pub trait CacheTier<V>: Send + Sync {
    /// Read a value. Absent and expired keys are both `None`.
    async fn get(&self, key: &str) -> Result<Option<V>>;

    /// Store a value that expires after `ttl`.
    async fn put(&self, key: &str, value: V, ttl: Duration) -> Result<()>;
}

/// Best-effort string cache used by the handlers.
///
/// Store failures are logged and otherwise ignored: a read error is a miss
/// and a write error drops the value.
#[derive(Clone)]
pub struct KvCache {
    tier: Arc<dyn CacheTier<String>>,
    ttl: Duration,
}

impl KvCache {
    pub fn new(tier: Arc<dyn CacheTier<String>>, ttl: Duration) -> Self {
        Self { tier, ttl }
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        match self.tier.get(key).await {
            Ok(Some(value)) => {
                tracing::debug!(key, "KV cache HIT");
                Some(value)
            }
            Ok(None) => {
                tracing::debug!(key, "KV cache MISS");
                None
            }
            Err(e) => {
                tracing::warn!(key, error = %e, "KV cache read failed");
                None
            }
        }
    }

    pub async fn put(&self, key: &str, value: &str) {
        if let Err(e) = self.tier.put(key, value.to_string(), self.ttl).await {
            tracing::warn!(key, error = %e, "KV cache write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Broken;

    #[async_trait]
    impl CacheTier<String> for Broken {
        async fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(std::io::Error::other("offline").into())
        }

        async fn put(&self, _key: &str, _value: String, _ttl: Duration) -> Result<()> {
            Err(std::io::Error::other("offline").into())
        }
    }

    #[tokio::test]
    async fn test_kv_cache_swallows_store_errors() {
        let cache = KvCache::new(Arc::new(Broken), DEFAULT_TTL);
        cache.put("plugins:1:10::::", "{}").await;
        assert_eq!(cache.get("plugins:1:10::::").await, None);
    }

    #[tokio::test]
    async fn test_kv_cache_round_trip() {
        let cache = KvCache::new(Arc::new(MemoryStore::<String>::new(16)), DEFAULT_TTL);
        assert_eq!(cache.get("changelog:1").await, None);

        cache.put("changelog:1", "[]").await;
        assert_eq!(cache.get("changelog:1").await.as_deref(), Some("[]"));
    }
}
