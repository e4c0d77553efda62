// Server configuration.
// Loaded once at startup from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use crate::cache::{DEFAULT_TTL, paths};
use crate::error::{ProxyError, Result};
use crate::github::GITHUB_API_BASE;

const DEV_ORIGIN: &str = "http://localhost:8788";
const PROD_ORIGIN: &str = "https://hub2wp.com";

/// Backend used for the key-value tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackend {
    Disk,
    Memory,
    Off,
}

impl CacheBackend {
    fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "disk" => Ok(CacheBackend::Disk),
            "memory" => Ok(CacheBackend::Memory),
            "off" | "none" => Ok(CacheBackend::Off),
            other => Err(ProxyError::Config(format!("unknown CACHE_BACKEND: {}", other))),
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port to listen on.
    pub port: u16,
    /// The single origin allowed by CORS.
    pub allowed_origin: String,
    /// GitHub token sent with every upstream call.
    pub github_token: String,
    /// GitHub REST API base URL.
    pub github_api_url: String,
    /// Optional per-call upstream timeout. Unset means calls may stall.
    pub upstream_timeout: Option<Duration>,
    pub cache_backend: CacheBackend,
    /// Directory for the disk cache.
    pub cache_dir: PathBuf,
    /// TTL for key-value entries.
    pub cache_ttl: Duration,
    pub edge_cache_enabled: bool,
    /// TTL for whole cached responses.
    pub edge_cache_ttl: Duration,
    /// Comma separated featured repositories, overriding the built-in list.
    pub featured_plugins: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let number = |name: &str, default: u64| -> u64 {
            var(name)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default)
        };

        let github_token = var("GITHUB_PAT")
            .or_else(|| var("GITHUB_TOKEN"))
            .filter(|t| !t.trim().is_empty())
            .ok_or(ProxyError::MissingToken)?;

        let development = var("ENVIRONMENT").is_some_and(|env| env == "development");
        let allowed_origin = var("ALLOWED_ORIGIN").unwrap_or_else(|| {
            if development {
                DEV_ORIGIN.into()
            } else {
                PROD_ORIGIN.into()
            }
        });

        let cache_backend = match var("CACHE_BACKEND") {
            Some(raw) => CacheBackend::parse(&raw)?,
            None => CacheBackend::Disk,
        };

        let cache_dir = var("CACHE_DIR")
            .map(PathBuf::from)
            .or_else(paths::cache_dir)
            .unwrap_or_else(|| PathBuf::from("./.cache"));

        Ok(Self {
            port: var("PORT")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(8787),
            allowed_origin,
            github_token,
            github_api_url: var("GITHUB_API_URL").unwrap_or_else(|| GITHUB_API_BASE.into()),
            upstream_timeout: var("UPSTREAM_TIMEOUT_SECS")
                .and_then(|v| v.trim().parse().ok())
                .map(Duration::from_secs),
            cache_backend,
            cache_dir,
            cache_ttl: Duration::from_secs(number("CACHE_TTL_SECS", DEFAULT_TTL.as_secs())),
            edge_cache_enabled: !var("EDGE_CACHE").is_some_and(|v| v.eq_ignore_ascii_case("off")),
            edge_cache_ttl: Duration::from_secs(number("EDGE_CACHE_TTL_SECS", 3600)),
            featured_plugins: var("FEATURED_PLUGINS"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_missing_token_is_an_error() {
        assert!(matches!(load(&[]), Err(ProxyError::MissingToken)));
        assert!(matches!(load(&[("GITHUB_PAT", " ")]), Err(ProxyError::MissingToken)));
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("GITHUB_PAT", "secret")]).unwrap();
        assert_eq!(config.port, 8787);
        assert_eq!(config.allowed_origin, PROD_ORIGIN);
        assert_eq!(config.github_api_url, GITHUB_API_BASE);
        assert_eq!(config.cache_backend, CacheBackend::Disk);
        assert_eq!(config.cache_ttl, DEFAULT_TTL);
        assert!(config.edge_cache_enabled);
        assert_eq!(config.upstream_timeout, None);
    }

    #[test]
    fn test_development_origin() {
        let config = load(&[("GITHUB_TOKEN", "secret"), ("ENVIRONMENT", "development")]).unwrap();
        assert_eq!(config.allowed_origin, DEV_ORIGIN);
        assert_eq!(config.github_token, "secret");
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("GITHUB_PAT", "secret"),
            ("ALLOWED_ORIGIN", "https://example.org"),
            ("CACHE_BACKEND", "Memory"),
            ("EDGE_CACHE", "off"),
            ("UPSTREAM_TIMEOUT_SECS", "15"),
            ("PORT", "9000"),
        ])
        .unwrap();
        assert_eq!(config.allowed_origin, "https://example.org");
        assert_eq!(config.cache_backend, CacheBackend::Memory);
        assert!(!config.edge_cache_enabled);
        assert_eq!(config.upstream_timeout, Some(Duration::from_secs(15)));
        assert_eq!(config.port, 9000);
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let result = load(&[("GITHUB_PAT", "secret"), ("CACHE_BACKEND", "redis")]);
        assert!(matches!(result, Err(ProxyError::Config(_))));
    }
}
