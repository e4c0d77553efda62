// Test support.
// An in-process mock of the GitHub API and an AppState wired to it.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Router,
    body::{Body, to_bytes},
    extract::Request,
    http::{HeaderMap, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
};
use serde_json::{Value, json};
use tower::ServiceExt;

use crate::cache::{CacheTier, CachedResponse, DEFAULT_TTL, Disabled, EdgeCache, KvCache, MemoryStore};
use crate::catalog::FeaturedList;
use crate::github::GitHubClient;
use crate::routes::{AppState, router};
use crate::tasks::BackgroundTasks;

pub const TEST_ORIGIN: &str = "https://hub2wp.com";

/// Mock GitHub API listening on an ephemeral local port.
pub struct MockUpstream {
    pub base_url: String,
    hits: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockUpstream {
    pub async fn start(routes: Router) -> Self {
        let hits = Arc::new(AtomicUsize::new(0));
        let requests = Arc::new(Mutex::new(Vec::new()));

        let (counter, log) = (hits.clone(), requests.clone());
        let app = routes.layer(middleware::from_fn(move |req: Request, next: Next| {
            let (counter, log) = (counter.clone(), log.clone());
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                log.lock().unwrap().push(req.uri().to_string());
                next.run(req).await
            }
        }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            hits,
            requests,
        }
    }

    /// Number of requests the mock has served.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// Request URIs in arrival order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

/// State backed by the mock upstream and in-memory caches.
pub fn test_state(upstream: &MockUpstream, featured: FeaturedList, edge_cache: bool) -> AppState {
    let tasks = BackgroundTasks::new();
    let edge_tier: Arc<dyn CacheTier<CachedResponse>> = if edge_cache {
        Arc::new(MemoryStore::<CachedResponse>::new(64))
    } else {
        Arc::new(Disabled)
    };

    AppState {
        github: Arc::new(GitHubClient::new("test-token", &upstream.base_url, None).unwrap()),
        kv: KvCache::new(Arc::new(MemoryStore::<String>::new(64)), DEFAULT_TTL),
        edge: EdgeCache::new(edge_tier, Duration::from_secs(60), tasks.clone()),
        featured,
        allowed_origin: HeaderValue::from_static(TEST_ORIGIN),
        tasks,
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap()
    }

    pub fn cache_status(&self) -> Option<&str> {
        self.headers
            .get(crate::cache::edge::CACHE_STATUS_HEADER)
            .and_then(|v| v.to_str().ok())
    }
}

/// Drive one request through the full router.
pub async fn send(state: &AppState, method: Method, uri: &str) -> TestResponse {
    let request = axum::http::Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let response = router(state.clone()).oneshot(request).await.unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();

    TestResponse {
        status,
        headers,
        body: String::from_utf8(body.to_vec()).unwrap(),
    }
}

pub async fn get(state: &AppState, uri: &str) -> TestResponse {
    send(state, Method::GET, uri).await
}

/// Repository record as the GitHub API returns it.
pub fn repo_json(id: u64, full_name: &str, stars: u64) -> Value {
    let (owner, name) = full_name.split_once('/').unwrap();
    json!({
        "id": id,
        "node_id": format!("R_{}", id),
        "name": name,
        "full_name": full_name,
        "private": false,
        "owner": {
            "login": owner,
            "id": id + 1000,
            "avatar_url": format!("https://avatars.githubusercontent.com/u/{}", id + 1000),
            "html_url": format!("https://github.com/{}", owner),
            "type": "User"
        },
        "description": "A WordPress plugin",
        "html_url": format!("https://github.com/{}", full_name),
        "clone_url": format!("https://github.com/{}.git", full_name),
        "homepage": null,
        "stargazers_count": stars,
        "watchers_count": stars,
        "forks_count": 3,
        "open_issues_count": 1,
        "topics": ["wordpress-plugin"],
        "default_branch": "main",
        "created_at": "2023-05-01T10:00:00Z",
        "pushed_at": "2024-06-01T12:30:00Z"
    })
}

/// Headers GitHub sends when the quota is exhausted.
pub fn rate_limited_headers() -> [(&'static str, &'static str); 3] {
    [
        ("x-ratelimit-limit", "5000"),
        ("x-ratelimit-remaining", "0"),
        ("x-ratelimit-reset", "1700000000"),
    ]
}
