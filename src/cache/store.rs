// Disk-backed key-value store.
// Handles JSON serialization, TTL checking, and atomic filesystem writes.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tokio::fs;

use crate::error::Result;

use super::CacheTier;
use super::paths::{entries_dir, entry_path};

/// Default TTL for cached upstream payloads: one day.
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

static TEMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Wrapper for cached data with metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    /// The cache key, kept for inspection of the cache directory.
    pub key: String,
    /// The cached data.
    pub data: T,
    /// When the data was cached.
    pub cached_at: DateTime<Utc>,
    /// Lifetime of the entry in seconds.
    pub ttl_secs: u64,
}

impl<T> CachedData<T> {
    /// Create a new cached data entry.
    pub fn new(key: &str, data: T, ttl: Duration) -> Self {
        Self {
            key: key.to_string(),
            data,
            cached_at: Utc::now(),
            ttl_secs: ttl.as_secs(),
        }
    }

    /// Check if this cached data has expired.
    pub fn is_expired(&self) -> bool {
        let elapsed = Utc::now()
            .signed_duration_since(self.cached_at)
            .to_std()
            .unwrap_or(Duration::ZERO);

        elapsed >= Duration::from_secs(self.ttl_secs)
    }
}

/// Key-value store keeping one JSON file per key.
#[derive(Debug, Clone)]
pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(entries_dir(&root)).await?;
        tracing::debug!(path = %root.display(), "Opened disk cache");
        Ok(Self { root })
    }

    #[cfg(test)]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read an entry, deleting it if it has expired.
    pub async fn read_if_valid<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let path = entry_path(&self.root, key);
        let contents = match fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let cached: CachedData<T> = serde_json::from_str(&contents)?;
        if cached.is_expired() {
            tracing::debug!(key, "Disk cache entry expired");
            delete(&path).await?;
            return Ok(None);
        }

        Ok(Some(cached.data))
    }

    /// Write an entry atomically via a temp file and rename.
    pub async fn write_cached<T: Serialize>(&self, key: &str, data: &T, ttl: Duration) -> Result<()> {
        let path = entry_path(&self.root, key);
        let cached = CachedData::new(key, data, ttl);
        let json = serde_json::to_vec(&cached)?;

        let seq = TEMP_SEQ.fetch_add(1, Ordering::Relaxed);
        let temp_path = path.with_extension(format!("{}.{}.tmp", std::process::id(), seq));
        fs::write(&temp_path, &json).await?;
        fs::rename(&temp_path, &path).await?;

        tracing::debug!(key, size = json.len(), "Cached entry on disk");
        Ok(())
    }
}

#[async_trait]
impl CacheTier<String> for DiskStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.read_if_valid(key).await
    }

    async fn put(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        self.write_cached(key, &value, ttl).await
    }
}

/// Delete a cached file.
async fn delete(path: &Path) -> Result<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
