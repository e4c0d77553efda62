// In-process cache tiers.
// A bounded TTL map, and a no-op tier for turning caching off.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::Result;

use super::CacheTier;

struct Entry<V> {
    value: V,
    /// `None` when the TTL reaches past what `Instant` can represent.
    expires_at: Option<Instant>,
}

impl<V> Entry<V> {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

/// In-memory TTL store holding at most `max_entries` keys.
///
/// Expired entries are dropped lazily. When the map is full and nothing has
/// expired, new writes are skipped.
pub struct MemoryStore<V> {
    entries: RwLock<HashMap<String, Entry<V>>>,
    max_entries: usize,
}

impl<V> MemoryStore<V> {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_entries,
        }
    }

    /// Number of stored entries, including expired ones not yet purged.
    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl<V> CacheTier<V> for MemoryStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Result<Option<V>> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|entry| entry.is_live(Instant::now()))
            .map(|entry| entry.value.clone()))
    }

    async fn put(&self, key: &str, value: V, ttl: Duration) -> Result<()> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;

        if entries.len() >= self.max_entries && !entries.contains_key(key) {
            entries.retain(|_, entry| entry.is_live(now));
            if entries.len() >= self.max_entries {
                tracing::debug!(key, max_entries = self.max_entries, "Memory cache full, skipping write");
                return Ok(());
            }
        }

        entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: now.checked_add(ttl),
            },
        );
        Ok(())
    }
}

/// Tier that stores nothing.
pub struct Disabled;

#[async_trait]
impl<V: Send + 'static> CacheTier<V> for Disabled {
    async fn get(&self, _key: &str) -> Result<Option<V>> {
        Ok(None)
    }

    async fn put(&self, _key: &str, _value: V, _ttl: Duration) -> Result<()> {
        Ok(())
    }
}
