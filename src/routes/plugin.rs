// Plugin detail endpoint.
// GET /v1/plugin - repository, readme in both renderings, and compatibility headers.

use axum::{
    extract::{Query, State, rejection::QueryRejection},
    response::Response,
};
use serde::Deserialize;

use crate::catalog::{FALLBACK_BRANCH, PluginDetail, extract_headers};
use crate::error::{ProxyError, Result};

use super::{AppState, json_response, require_repo_id};

/// Conventional WordPress readme file names, tried before the generic readme.
const README_FILENAMES: [&str; 2] = ["readme.txt", "README.txt"];

#[derive(Debug, Deserialize)]
pub struct DetailParams {
    pub id: Option<String>,
}

/// GET /v1/plugin?id=<repository id>
pub async fn detail(
    State(state): State<AppState>,
    query: std::result::Result<Query<DetailParams>, QueryRejection>,
) -> Result<Response> {
    let Query(params) = query?;
    let id = require_repo_id(params.id.as_deref())?;
    let cache_key = format!("plugin-detail:{}", id);

    if let Some(cached) = state.kv.get(&cache_key).await {
        return Ok(json_response(cached));
    }

    let repo = state.github.get_repository(id).await?;
    let (readme, readme_html) = tokio::try_join!(
        readme_text(&state, &repo.owner.login, &repo.name),
        readme_html(&state, &repo.owner.login, &repo.name),
    )?;

    let headers = readme.as_deref().map(extract_headers).unwrap_or_default();
    tracing::info!(
        repo = %repo.full_name,
        has_readme = readme.is_some(),
        stable_tag = %headers.stable_tag,
        "Assembled plugin detail"
    );

    let detail = PluginDetail {
        download_url: state.github.zipball_url(&repo.full_name),
        main_branch: repo
            .default_branch
            .clone()
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| FALLBACK_BRANCH.into()),
        is_compatible: headers.is_compatible(),
        headers,
        readme: readme.unwrap_or_default(),
        readme_html: readme_html.unwrap_or_default(),
        repo,
    };

    let body = serde_json::to_string(&detail)?;
    state.kv.put(&cache_key, &body).await;
    Ok(json_response(body))
}

/// Raw readme text: `readme.txt`, then `README.txt`, then the default readme.
///
/// An upstream error status on one source moves on to the next. Rate limits
/// and transport failures abort.
async fn readme_text(state: &AppState, owner: &str, repo: &str) -> Result<Option<String>> {
    let cache_key = format!("readme:{}/{}", owner, repo);
    if let Some(cached) = state.kv.get(&cache_key).await {
        return Ok(Some(cached));
    }

    for filename in README_FILENAMES {
        match state.github.get_file_text(owner, repo, filename).await {
            Ok(text) => {
                state.kv.put(&cache_key, &text).await;
                return Ok(Some(text));
            }
            Err(e) if e.is_upstream_status() => {
                tracing::debug!(owner, repo, filename, error = %e, "Readme file not available");
            }
            Err(e) => return Err(e),
        }
    }

    match state.github.get_readme_text(owner, repo).await {
        Ok(text) => {
            state.kv.put(&cache_key, &text).await;
            Ok(Some(text))
        }
        Err(e) if e.is_upstream_status() => {
            tracing::debug!(owner, repo, error = %e, "Repository has no readme");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Readme rendered to HTML by GitHub.
async fn readme_html(state: &AppState, owner: &str, repo: &str) -> Result<Option<String>> {
    let cache_key = format!("readme_html:{}/{}", owner, repo);
    if let Some(cached) = state.kv.get(&cache_key).await {
        return Ok(Some(cached));
    }

    match state.github.get_readme_html(owner, repo).await {
        Ok(html) => {
            state.kv.put(&cache_key, &html).await;
            Ok(Some(html))
        }
        Err(ProxyError::Upstream { status, .. }) => {
            tracing::debug!(owner, repo, status, "Rendered readme not available");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
