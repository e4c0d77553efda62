// Cache path utilities.
// Locates the cache directory and maps cache keys onto file names.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use sha2::{Digest, Sha256};

/// Get the base cache directory (~/.cache/hubproxy on Linux).
pub fn cache_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "hubproxy").map(|dirs| dirs.cache_dir().to_path_buf())
}

/// Directory holding key-value entries under a cache root.
pub fn entries_dir(root: &Path) -> PathBuf {
    root.join("kv")
}

/// Path to the file storing `key`.
///
/// Keys contain `:` and `/`, so the file name is the SHA-256 of the key
/// rather than a sanitized copy of it.
pub fn entry_path(root: &Path, key: &str) -> PathBuf {
    entries_dir(root).join(format!("{}.json", key_digest(key)))
}

fn key_digest(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}
