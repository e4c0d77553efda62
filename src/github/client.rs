// GitHub API HTTP client.
// Handles authentication, rate limit reporting, and status-to-error mapping.

use std::time::Duration;

use reqwest::{
    Client, Response,
    header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT},
};

use crate::error::{ProxyError, Result};

use super::types::RateLimit;

pub const GITHUB_API_BASE: &str = "https://api.github.com";
const GITHUB_API_VERSION: &str = "2022-11-28";
const JSON_MEDIA_TYPE: &str = "application/vnd.github.v3+json";

/// GitHub API client with a fixed credential and header set.
///
/// Holds no per-request state, so one instance is shared by every handler.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: Client,
    base_url: String,
}

impl GitHubClient {
    /// Create a new GitHub client with the given token and API base URL.
    pub fn new(token: &str, base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut headers = HeaderMap::new();

        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| ProxyError::Config(e.to_string()))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static(JSON_MEDIA_TYPE));
        headers.insert(
            "x-github-api-version",
            HeaderValue::from_static(GITHUB_API_VERSION),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static("hubproxy"));

        let mut builder = Client::builder().default_headers(headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(ProxyError::Http)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Base URL all endpoints are resolved against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Make a GET request to the GitHub API.
    pub async fn get(&self, endpoint: &str) -> Result<Response> {
        self.get_with_accept(endpoint, JSON_MEDIA_TYPE).await
    }

    /// Make a GET request with a specific `Accept` media type.
    pub async fn get_with_accept(&self, endpoint: &str, accept: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url, endpoint);
        let response = self
            .client
            .get(&url)
            .header(ACCEPT, accept)
            .send()
            .await?;

        self.check_response(endpoint, response)
    }

    /// Make a GET request with query parameters.
    pub async fn get_with_params<T: serde::Serialize + ?Sized>(
        &self,
        endpoint: &str,
        params: &T,
    ) -> Result<Response> {
        let url = format!("{}{}", self.base_url, endpoint);
        let response = self.client.get(&url).query(params).send().await?;

        self.check_response(endpoint, response)
    }

    /// Check response status and convert errors.
    fn check_response(&self, endpoint: &str, response: Response) -> Result<Response> {
        let status = response.status();
        let rate_limit = RateLimit::from_headers(response.headers());

        tracing::debug!(
            endpoint,
            status = status.as_u16(),
            remaining = rate_limit.remaining.as_deref().unwrap_or("?"),
            limit = rate_limit.limit.as_deref().unwrap_or("?"),
            reset = %rate_limit.reset_iso(),
            "GitHub API call"
        );

        if status.is_success() {
            return Ok(response);
        }

        tracing::warn!(endpoint, status = status.as_u16(), "GitHub API error");

        if status == reqwest::StatusCode::FORBIDDEN {
            return Err(ProxyError::RateLimited { rate_limit });
        }

        Err(ProxyError::Upstream {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
        })
    }
}
