//! Server startup.

use std::sync::Arc;
use std::time::Duration;

use armature_build::Bundler;
use armature_cache::CacheManager;
use armature_core::ArmatureConfig;
use armature_hmr::write_client_script;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::error::ServerError;
use crate::routes::create_router;
use crate::state::AppState;

/// Start the server and run until Ctrl-C.
///
/// With HMR enabled this also writes `hmr.js` into the build dir and starts
/// the file watcher.
pub async fn serve(config: ArmatureConfig, bundler: Arc<dyn Bundler>) -> Result<(), ServerError> {
    let state = AppState::new(config, bundler);
    let config = state.config.clone();

    let _watcher = if config.hmr.enabled {
        write_client_script(&config.hmr, state.builds.build_dir()).await?;
        Some(state.hmr_service().spawn()?)
    } else {
        None
    };
    let _sweeper = spawn_cache_sweeper(state.cache().clone(), config.cache.route_ttl());

    let addr = config.server.addr();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;
    tracing::info!(addr = %addr, routes = %config.routes_dir().display(), "armature listening");

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ServerError::Serve)
}

/// Periodically drop expired cache entries.
pub fn spawn_cache_sweeper(cache: Arc<CacheManager>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every.max(Duration::from_secs(1)));
        interval.tick().await;
        loop {
            interval.tick().await;
            let removed = cache.sweep_expired();
            if removed > 0 {
                tracing::debug!(removed, "swept expired cache entries");
            }
        }
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
