// Changelog endpoint.
// GET /v1/changelog - a repository's releases as changelog entries.

use axum::{
    extract::{Query, State, rejection::QueryRejection},
    response::Response,
};
use serde::Deserialize;

use crate::catalog::ChangelogEntry;
use crate::error::Result;

use super::{AppState, json_response, require_repo_id};

#[derive(Debug, Deserialize)]
pub struct ChangelogParams {
    pub id: Option<String>,
}

/// GET /v1/changelog?id=<repository id>
pub async fn changelog(
    State(state): State<AppState>,
    query: std::result::Result<Query<ChangelogParams>, QueryRejection>,
) -> Result<Response> {
    let Query(params) = query?;
    let id = require_repo_id(params.id.as_deref())?;
    let cache_key = format!("changelog:{}", id);

    if let Some(cached) = state.kv.get(&cache_key).await {
        return Ok(json_response(cached));
    }

    let repo = state.github.get_repository(id).await?;
    let releases = state
        .github
        .get_releases(&repo.owner.login, &repo.name)
        .await?;

    tracing::debug!(repo = %repo.full_name, releases = releases.len(), "Fetched releases");

    let entries: Vec<ChangelogEntry> = releases.into_iter().map(ChangelogEntry::from).collect();
    let body = serde_json::to_string(&entries)?;
    state.kv.put(&cache_key, &body).await;
    Ok(json_response(body))
}
