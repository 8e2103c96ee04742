//! Server errors.

use armature_build::BuildError;
use armature_hmr::HmrError;
use armature_router::ResolveError;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};

use crate::shell::error_page;

/// Error returned by request handlers.
///
/// Responds with an HTML page rendered through the runtime's error boundary.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("route resolution failed: {0}")]
    Resolve(#[from] ResolveError),

    #[error("build failed: {0}")]
    Build(#[from] BuildError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Resolve(_) => "resolve_error",
            Self::Build(_) => "build_error",
            Self::Internal(_) => "internal_error",
        }
    }

    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Resolve(_) | Self::Build(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "request failed");
        }
        let detail = match &self {
            Self::NotFound(path) => Some(path.as_str()),
            _ => None,
        };
        (
            status,
            [(header::CACHE_CONTROL, "no-store")],
            Html(error_page(status, detail)),
        )
            .into_response()
    }
}

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors that stop the server from starting or running.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),

    #[error(transparent)]
    Hmr(#[from] HmrError),
}
