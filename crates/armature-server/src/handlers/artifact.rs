//! Compiled artifact serving.

use std::io::ErrorKind;
use std::path::{Component, Path as FsPath, PathBuf};

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Serve a file from the build directory.
///
/// Paths that leave the build directory or touch dot-directories (generated
/// entry modules) are not found.
pub async fn artifact(State(state): State<AppState>, Path(path): Path<String>) -> ApiResult<Response> {
    let Some(relative) = safe_relative(&path) else {
        return Err(ApiError::NotFound(path));
    };
    let file = state.builds.build_dir().join(&relative);

    match tokio::fs::metadata(&file).await {
        Ok(meta) if meta.is_file() => {}
        Ok(_) => return Err(ApiError::NotFound(path)),
        Err(e) if e.kind() == ErrorKind::NotFound => return Err(ApiError::NotFound(path)),
        Err(e) => return Err(ApiError::Internal(format!("{}: {}", file.display(), e))),
    }
    let bytes = tokio::fs::read(&file)
        .await
        .map_err(|e| ApiError::Internal(format!("{}: {}", file.display(), e)))?;

    Ok((
        [
            (header::CONTENT_TYPE, content_type(&relative)),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        bytes,
    )
        .into_response())
}

fn safe_relative(path: &str) -> Option<PathBuf> {
    let mut relative = PathBuf::new();
    for component in FsPath::new(path).components() {
        match component {
            Component::Normal(part) if !part.to_string_lossy().starts_with('.') => relative.push(part),
            _ => return None,
        }
    }
    (!relative.as_os_str().is_empty()).then_some(relative)
}

fn content_type(path: &FsPath) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("js" | "mjs") => "application/javascript",
        Some("css") => "text/css",
        Some("map" | "json") => "application/json",
        _ => "application/octet-stream",
    }
}
