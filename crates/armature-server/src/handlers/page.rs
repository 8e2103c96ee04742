//! Page rendering.

use std::convert::Infallible;

use armature_core::{LifecyclePhase, RequestId, TimingContext};
use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, Uri};
use axum::response::Response;

use crate::error::{ApiError, ApiResult};
use crate::shell::PageShell;
use crate::state::AppState;

/// Request id header.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Build cache status header.
pub const CACHE_HEADER: &str = "x-armature-cache";

/// Resolve, build, then stream the page for the request path.
pub async fn page(State(state): State<AppState>, headers: HeaderMap, uri: Uri) -> ApiResult<Response> {
    let request_id = headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(RequestId::from_string)
        .unwrap_or_else(RequestId::generate);
    let mut timing = TimingContext::new();
    let path = uri.path();

    let route = state.resolver.resolve(path).await?;
    timing.mark_phase(&LifecyclePhase::Resolved);
    if !route.is_found() {
        return Err(ApiError::NotFound(path.to_string()));
    }

    let (build, status) = state.builds.build_route(&route).await?;
    timing.mark_phase(&LifecyclePhase::Built);

    let shell =
        PageShell::new(&state.config, &build).map_err(|e| ApiError::Internal(e.to_string()))?;
    let mount = shell
        .render_mount(&route.params)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    let chunks = vec![
        shell.render_opening(),
        mount,
        shell.render_entry(),
        shell.render_closing(),
    ];
    timing.mark_phase(&LifecyclePhase::ShellSent);

    let body = Body::from_stream(futures::stream::iter(
        chunks.into_iter().map(Ok::<_, Infallible>),
    ));
    let header_id = HeaderValue::from_str(request_id.as_str())
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let response = Response::builder()
        .header(header::CONTENT_TYPE, "text/html; charset=utf-8")
        .header(header::CACHE_CONTROL, "no-cache")
        .header(REQUEST_ID_HEADER, header_id)
        .header(CACHE_HEADER, status.as_str())
        .body(body)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    timing.mark_phase(&LifecyclePhase::Completion);

    tracing::debug!(
        request_id = %request_id.as_str(),
        path = %path,
        component_id = %build.component_id,
        cache = %status,
        resolve = ?timing.time_to_resolve(),
        build = ?timing.build_duration(),
        shell = ?timing.time_to_shell(),
        total = ?timing.total(),
        "page ready"
    );
    Ok(response)
}
