// hubproxy - caching proxy for a GitHub-hosted WordPress plugin catalog.
// Loads configuration, builds the cache tiers, and serves the /v1 API.

mod cache;
mod catalog;
mod config;
mod error;
mod github;
mod routes;
mod tasks;
#[cfg(test)]
mod testing;

use std::net::SocketAddr;

use config::Config;
use routes::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,hubproxy=debug,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;

    tracing::info!(
        port = config.port,
        allowed_origin = %config.allowed_origin,
        github_api_url = %config.github_api_url,
        cache_backend = ?config.cache_backend,
        cache_dir = %config.cache_dir.display(),
        cache_ttl_secs = config.cache_ttl.as_secs(),
        edge_cache = config.edge_cache_enabled,
        "Starting hubproxy"
    );

    let state = AppState::from_config(&config).await?;
    tracing::info!(featured = state.featured.repos().len(), "Loaded featured list");

    let app = routes::router(state.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Let detached cache writes finish before the runtime goes away.
    state.tasks.drain().await;
    tracing::info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
