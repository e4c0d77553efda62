// GitHub API response types.
// Defines structs for deserializing GitHub REST API responses.

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// GitHub user or organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Owner {
    pub id: u64,
    pub login: String,
    pub avatar_url: Option<String>,
    pub html_url: Option<String>,
    /// Remaining upstream fields, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// GitHub repository, as returned by search and by-id lookups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    pub owner: Owner,
    pub description: Option<String>,
    pub html_url: String,
    pub clone_url: Option<String>,
    pub homepage: Option<String>,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub watchers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
    #[serde(default)]
    pub open_issues_count: u64,
    #[serde(default)]
    pub topics: Vec<String>,
    pub default_branch: Option<String>,
    pub created_at: DateTime<Utc>,
    pub pushed_at: Option<DateTime<Utc>>,
    /// Remaining upstream fields, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Repository search response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResults {
    pub total_count: u64,
    #[serde(default)]
    pub incomplete_results: bool,
    pub items: Vec<Repository>,
}

/// File returned by the contents and readme endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentFile {
    pub path: String,
    #[serde(default)]
    pub encoding: String,
    #[serde(default)]
    pub content: String,
}

/// Published release.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Release {
    pub tag_name: String,
    pub name: Option<String>,
    pub body: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub html_url: String,
}

/// Rate limit information from response headers.
///
/// `limit` and `remaining` are kept as the raw header text so they can be
/// echoed back to the caller; `reset` is the epoch second the window resets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateLimit {
    pub limit: Option<String>,
    pub remaining: Option<String>,
    pub reset: i64,
}

impl RateLimit {
    /// Read the `x-ratelimit-*` headers. Missing or malformed values are left empty.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let text = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.to_string())
        };

        Self {
            limit: text("x-ratelimit-limit"),
            remaining: text("x-ratelimit-remaining"),
            reset: text("x-ratelimit-reset")
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
        }
    }

    /// Reset time as an ISO-8601 timestamp with millisecond precision.
    pub fn reset_iso(&self) -> String {
        DateTime::from_timestamp(self.reset, 0)
            .unwrap_or_default()
            .to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn to_json(&self) -> Value {
        json!({
            "remaining": self.remaining,
            "reset": self.reset_iso(),
            "limit": self.limit,
        })
    }
}
