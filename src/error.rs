// Error types for the proxy.
// Maps upstream failures, caller mistakes, and internal faults onto HTTP responses.

use axum::{
    Json,
    extract::rejection::QueryRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value, json};
use thiserror::Error;

use crate::github::RateLimit;

#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Not found")]
    NotFound,

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("GitHub API rate limit exceeded")]
    RateLimited { rate_limit: RateLimit },

    #[error("Failed to fetch data from GitHub")]
    Upstream { status: u16, status_text: String },

    #[error("Failed to fetch data from GitHub")]
    Http(#[from] reqwest::Error),

    #[error("Missing GITHUB_PAT environment variable")]
    MissingToken,

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, ProxyError>;

impl ProxyError {
    /// Status code returned to the caller for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ProxyError::NotFound => StatusCode::NOT_FOUND,
            ProxyError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ProxyError::RateLimited { .. } => StatusCode::FORBIDDEN,
            ProxyError::Upstream { .. } | ProxyError::Http(_) => StatusCode::BAD_GATEWAY,
            ProxyError::MissingToken
            | ProxyError::Config(_)
            | ProxyError::Json(_)
            | ProxyError::Io(_)
            | ProxyError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the upstream answered with a non-success status that is not a
    /// rate limit. Readme lookups treat this as "try the next source".
    pub fn is_upstream_status(&self) -> bool {
        matches!(self, ProxyError::Upstream { .. })
    }

    /// JSON body in the `{error, ...extra}` shape the front-end expects.
    pub fn body(&self) -> Value {
        let mut body = Map::new();
        body.insert("error".into(), Value::String(self.to_string()));

        match self {
            ProxyError::RateLimited { rate_limit } => {
                body.insert("rateLimit".into(), rate_limit.to_json());
            }
            ProxyError::Upstream {
                status,
                status_text,
            } => {
                body.insert("status".into(), json!(status));
                body.insert("statusText".into(), json!(status_text));
            }
            _ => {}
        }

        Value::Object(body)
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "Request failed");
        } else {
            tracing::warn!(error = %self, status = status.as_u16(), "Request rejected");
        }

        (status, Json(self.body())).into_response()
    }
}

/// Malformed query strings become a JSON 400 like every other caller error.
impl From<QueryRejection> for ProxyError {
    fn from(rejection: QueryRejection) -> Self {
        ProxyError::BadRequest(rejection.body_text())
    }
}

impl From<base64::DecodeError> for ProxyError {
    fn from(err: base64::DecodeError) -> Self {
        ProxyError::Internal(format!("Invalid base64 content: {}", err))
    }
}
