// Edge cache middleware.
// Replays stored responses for GET requests and stores fresh 200s in the background.

use axum::{
    body::{Body, to_bytes},
    extract::{Request, State},
    http::{Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::cache::{CacheStatus, CachedResponse, EdgeCache};
use crate::error::ProxyError;

use super::AppState;

pub async fn edge_cache(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if request.method() != Method::GET {
        let mut response = next.run(request).await;
        CacheStatus::Miss.mark(&mut response);
        return response;
    }

    let key = EdgeCache::key_for(request.method(), request.uri(), request.headers());

    if let Some(cached) = state.edge.lookup(&key).await {
        tracing::debug!(key = %key, "Edge cache HIT");
        let mut response = cached.to_response();
        CacheStatus::Hit.mark(&mut response);
        return response;
    }

    let response = next.run(request).await;
    if response.status() != StatusCode::OK {
        let mut response = response;
        CacheStatus::Miss.mark(&mut response);
        return response;
    }

    let (parts, body) = response.into_parts();
    let body = match to_bytes(body, usize::MAX).await {
        Ok(body) => body,
        Err(e) => {
            let mut response =
                ProxyError::Internal(format!("Failed to buffer response: {}", e)).into_response();
            CacheStatus::Miss.mark(&mut response);
            return response;
        }
    };

    state.edge.store_detached(
        key,
        CachedResponse {
            status: parts.status,
            headers: parts.headers.clone(),
            body: body.clone(),
        },
    );

    let mut response = Response::from_parts(parts, Body::from(body));
    CacheStatus::Miss.mark(&mut response);
    response
}
