// Catalog listing endpoint.
// GET /v1/plugins - search or featured listing, cached per parameter set.

use axum::{
    extract::{Query, State, rejection::QueryRejection},
    response::Response,
};

use crate::catalog::{ListParams, ListRequest};
use crate::error::Result;

use super::{AppState, json_response};

/// GET /v1/plugins?page&per_page&q&author&filter
pub async fn list(
    State(state): State<AppState>,
    query: std::result::Result<Query<ListParams>, QueryRejection>,
) -> Result<Response> {
    let Query(params) = query?;
    let request = ListRequest::from(params);
    let cache_key = request.cache_key();

    if let Some(cached) = state.kv.get(&cache_key).await {
        return Ok(json_response(cached));
    }

    let search = request.search_query(&state.featured);
    tracing::info!(
        q = %search.q,
        featured = search.featured,
        page = request.page,
        per_page = request.per_page,
        "Searching plugins"
    );

    let mut results = state
        .github
        .search_repositories(&search.q, request.page, request.per_page)
        .await?;

    if search.featured {
        results.items = state.featured.reorder(results.items);
    }

    let body = serde_json::to_string(&results)?;
    state.kv.put(&cache_key, &body).await;
    Ok(json_response(body))
}
