//! Route configuration.

use axum::routing::get;
use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Create the application router.
///
/// - `<public_prefix>/{*path}` serves compiled artifacts (and `hmr.js`)
/// - the HMR endpoint streams change events when HMR is enabled
/// - everything else is a public file if one exists, otherwise a page
pub fn create_router(state: AppState) -> Router {
    let artifacts = format!(
        "{}/{{*path}}",
        state.config.build.public_prefix.trim_end_matches('/')
    );
    let mut router = Router::new().route(&artifacts, get(handlers::artifact));

    if state.config.hmr.enabled {
        router = router.route(&state.config.hmr.endpoint, get(handlers::hmr_stream));
    }

    let public = ServeDir::new(state.config.public_dir())
        .fallback(get(handlers::page).with_state(state.clone()));

    router
        .fallback_service(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
