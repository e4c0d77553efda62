// HTTP routing and shared handler state.
// Builds the /v1 route table and wraps it in the CORS and edge cache layers.

pub mod changelog;
pub mod edge;
pub mod plugin;
pub mod plugins;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    http::{HeaderValue, Method, StatusCode, header::CONTENT_TYPE},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::cache::{CacheTier, CachedResponse, Disabled, DiskStore, EdgeCache, KvCache, MemoryStore};
use crate::catalog::FeaturedList;
use crate::config::{CacheBackend, Config};
use crate::error::{ProxyError, Result};
use crate::github::GitHubClient;
use crate::tasks::BackgroundTasks;

/// Upper bound on in-memory entries per tier.
const MEMORY_CACHE_ENTRIES: usize = 10_000;

/// How long browsers may reuse a preflight answer.
const CORS_MAX_AGE: Duration = Duration::from_secs(86_400);

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub github: Arc<GitHubClient>,
    pub kv: KvCache,
    pub edge: EdgeCache,
    pub featured: FeaturedList,
    pub allowed_origin: HeaderValue,
    pub tasks: BackgroundTasks,
}

impl AppState {
    /// Build the upstream client and both cache tiers from configuration.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let github = GitHubClient::new(
            &config.github_token,
            &config.github_api_url,
            config.upstream_timeout,
        )?;

        let kv_tier: Arc<dyn CacheTier<String>> = match config.cache_backend {
            CacheBackend::Disk => Arc::new(DiskStore::open(&config.cache_dir).await?),
            CacheBackend::Memory => Arc::new(MemoryStore::<String>::new(MEMORY_CACHE_ENTRIES)),
            CacheBackend::Off => Arc::new(Disabled),
        };

        let edge_tier: Arc<dyn CacheTier<CachedResponse>> = if config.edge_cache_enabled {
            Arc::new(MemoryStore::<CachedResponse>::new(MEMORY_CACHE_ENTRIES))
        } else {
            Arc::new(Disabled)
        };

        let allowed_origin = HeaderValue::from_str(&config.allowed_origin)
            .map_err(|e| ProxyError::Config(format!("invalid allowed origin: {}", e)))?;

        let tasks = BackgroundTasks::new();

        Ok(Self {
            github: Arc::new(github),
            kv: KvCache::new(kv_tier, config.cache_ttl),
            edge: EdgeCache::new(edge_tier, config.edge_cache_ttl, tasks.clone()),
            featured: FeaturedList::from_list(config.featured_plugins.as_deref()),
            allowed_origin,
            tasks,
        })
    }
}

/// Build the application router.
///
/// Layer order, outermost first: tracing, CORS (answers OPTIONS), edge
/// cache, then the route table.
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(state.allowed_origin.clone());

    let api = Router::new()
        .route("/plugins", get(plugins::list).fallback(method_not_allowed))
        .route("/plugin", get(plugin::detail).fallback(method_not_allowed))
        .route("/changelog", get(changelog::changelog).fallback(method_not_allowed));

    Router::new()
        .nest("/v1", api)
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state.clone(), edge::edge_cache))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS for the single configured origin. The caller's `Origin` is never
/// echoed, and every `OPTIONS` request is answered here with an empty body.
fn cors_layer(allowed_origin: HeaderValue) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::exact(allowed_origin))
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(CORS_MAX_AGE)
}

/// 200 response carrying an already serialized JSON body.
pub fn json_response(body: String) -> Response {
    (
        StatusCode::OK,
        [(CONTENT_TYPE, HeaderValue::from_static("application/json"))],
        body,
    )
        .into_response()
}

/// Required `id` query parameter for the single-repository endpoints.
pub fn require_repo_id(id: Option<&str>) -> Result<&str> {
    let id = id
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ProxyError::BadRequest("Missing repo id".into()))?;

    if !id.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ProxyError::BadRequest("Invalid repo id".into()));
    }
    Ok(id)
}

async fn not_found() -> ProxyError {
    ProxyError::NotFound
}

async fn method_not_allowed() -> ProxyError {
    ProxyError::MethodNotAllowed
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, http::Method};
    use serde_json::json;

    use crate::testing::{MockUpstream, TEST_ORIGIN, get as get_path, repo_json, send, test_state};

    async fn listing_upstream() -> MockUpstream {
        MockUpstream::start(Router::new().route(
            "/search/repositories",
            get(|| async {
                Json(json!({
                    "total_count": 1,
                    "incomplete_results": false,
                    "items": [repo_json(1, "a/one", 5)],
                }))
            }),
        ))
        .await
    }

    #[tokio::test]
    async fn test_options_is_answered_before_routing() {
        let upstream = listing_upstream().await;
        let state = test_state(&upstream, FeaturedList::new(["a/one"]), true);

        for path in ["/v1/plugins", "/anything/else"] {
            let response = send(&state, Method::OPTIONS, path).await;
            assert_eq!(response.status, StatusCode::OK);
            assert!(response.body.is_empty());
            assert_eq!(response.headers["access-control-allow-origin"], TEST_ORIGIN);
            assert_eq!(response.headers["access-control-allow-methods"], "GET,OPTIONS");
            assert_eq!(response.headers["access-control-allow-headers"], "content-type");
            assert_eq!(response.headers["access-control-max-age"], "86400");
            assert!(response.cache_status().is_none());
        }
        assert_eq!(upstream.hits(), 0);
    }

    #[tokio::test]
    async fn test_unknown_path_is_not_found() {
        let upstream = listing_upstream().await;
        let state = test_state(&upstream, FeaturedList::default(), true);

        let response = get_path(&state, "/v2/plugins").await;
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.json(), json!({ "error": "Not found" }));
        assert_eq!(response.headers["access-control-allow-origin"], TEST_ORIGIN);
        assert_eq!(response.cache_status(), Some("MISS"));
    }

    #[tokio::test]
    async fn test_wrong_method_is_rejected() {
        let upstream = listing_upstream().await;
        let state = test_state(&upstream, FeaturedList::default(), true);

        let response = send(&state, Method::POST, "/v1/plugins").await;
        assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.json()["error"], "Method not allowed");
        assert_eq!(upstream.hits(), 0);
    }

    #[tokio::test]
    async fn test_origin_is_never_reflected() {
        let upstream = listing_upstream().await;
        let state = test_state(&upstream, FeaturedList::new(["a/one"]), false);

        let request = axum::http::Request::builder()
            .uri("/v1/plugins")
            .header("origin", "https://evil.example")
            .body(axum::body::Body::empty())
            .unwrap();
        let response = tower::ServiceExt::oneshot(router(state), request).await.unwrap();
        assert_eq!(response.headers()["access-control-allow-origin"], TEST_ORIGIN);
    }

    #[tokio::test]
    async fn test_preflight_with_foreign_origin_gets_configured_origin() {
        let upstream = listing_upstream().await;
        let state = test_state(&upstream, FeaturedList::default(), true);

        let request = axum::http::Request::builder()
            .method(Method::OPTIONS)
            .uri("/v1/plugin?id=1")
            .header("origin", "https://evil.example")
            .header("access-control-request-method", "GET")
            .body(axum::body::Body::empty())
            .unwrap();
        let response = tower::ServiceExt::oneshot(router(state), request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["access-control-allow-origin"], TEST_ORIGIN);
        assert_eq!(response.headers()["access-control-max-age"], "86400");
        assert_eq!(upstream.hits(), 0);
    }

    #[tokio::test]
    async fn test_edge_cache_replays_successful_responses() {
        let upstream = listing_upstream().await;
        let state = test_state(&upstream, FeaturedList::new(["a/one"]), true);

        let first = get_path(&state, "/v1/plugins").await;
        assert_eq!(first.status, StatusCode::OK);
        assert_eq!(first.cache_status(), Some("MISS"));
        assert_eq!(first.headers["content-type"], "application/json");

        state.tasks.drain().await;

        let second = get_path(&state, "/v1/plugins").await;
        assert_eq!(second.status, StatusCode::OK);
        assert_eq!(second.cache_status(), Some("HIT"));
        assert_eq!(second.body, first.body);
        assert_eq!(second.headers["access-control-allow-origin"], TEST_ORIGIN);
        assert_eq!(upstream.hits(), 1);
    }

    #[tokio::test]
    async fn test_edge_cache_skips_errors() {
        let upstream = listing_upstream().await;
        let state = test_state(&upstream, FeaturedList::default(), true);

        let first = get_path(&state, "/v1/plugin").await;
        assert_eq!(first.status, StatusCode::BAD_REQUEST);
        state.tasks.drain().await;

        let second = get_path(&state, "/v1/plugin").await;
        assert_eq!(second.status, StatusCode::BAD_REQUEST);
        assert_eq!(second.cache_status(), Some("MISS"));
    }

    #[test]
    fn test_require_repo_id() {
        assert_eq!(require_repo_id(Some("12345")).unwrap(), "12345");
        assert_eq!(require_repo_id(Some(" 7 ")).unwrap(), "7");
        assert!(matches!(require_repo_id(None), Err(ProxyError::BadRequest(_))));
        assert!(matches!(require_repo_id(Some("")), Err(ProxyError::BadRequest(_))));

        let err = require_repo_id(Some("1/../../user")).unwrap_err();
        assert_eq!(err.to_string(), "Invalid repo id");
    }
}
