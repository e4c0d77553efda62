// Edge response cache.
// Stores whole HTTP responses keyed by the inbound request, populated off the response path.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{HeaderMap, HeaderValue, Method, StatusCode, Uri, header::ACCEPT},
    response::Response,
};
use bytes::Bytes;

use crate::tasks::BackgroundTasks;

use super::CacheTier;

/// Diagnostic header reporting whether the edge tier answered.
pub const CACHE_STATUS_HEADER: &str = "x-cache-status";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
        }
    }

    /// Set (or overwrite) the diagnostic header on a response.
    pub fn mark(self, response: &mut Response) {
        response
            .headers_mut()
            .insert(CACHE_STATUS_HEADER, HeaderValue::from_static(self.as_str()));
    }
}

/// A fully buffered response.
#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl CachedResponse {
    /// Rebuild a response from the stored copy.
    pub fn to_response(&self) -> Response {
        let mut response = Response::new(Body::from(self.body.clone()));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers.clone();
        response
    }
}

/// Outer cache tier wrapping the whole dispatch.
#[derive(Clone)]
pub struct EdgeCache {
    tier: Arc<dyn CacheTier<CachedResponse>>,
    ttl: Duration,
    tasks: BackgroundTasks,
}

impl EdgeCache {
    pub fn new(
        tier: Arc<dyn CacheTier<CachedResponse>>,
        ttl: Duration,
        tasks: BackgroundTasks,
    ) -> Self {
        Self { tier, ttl, tasks }
    }

    /// Normalized request key: method, path with query, and `Accept`.
    pub fn key_for(method: &Method, uri: &Uri, headers: &HeaderMap) -> String {
        let path = uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or_else(|| uri.path());
        let accept = headers
            .get(ACCEPT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        format!("{} {} accept={}", method, path, accept)
    }

    pub async fn lookup(&self, key: &str) -> Option<CachedResponse> {
        match self.tier.get(key).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(key, error = %e, "Edge cache read failed");
                None
            }
        }
    }

    /// Store a response without blocking the caller.
    pub fn store_detached(&self, key: String, response: CachedResponse) {
        let tier = self.tier.clone();
        let ttl = self.ttl;
        self.tasks.spawn("edge-cache-store", async move {
            match tier.put(&key, response, ttl).await {
                Ok(()) => tracing::debug!(key = %key, "Edge cache stored"),
                Err(e) => tracing::warn!(key = %key, error = %e, "Edge cache write failed"),
            }
        });
    }
}
