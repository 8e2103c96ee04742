//! Routing errors.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while resolving routes.
///
/// A route that does not exist is not an error; see `RouteInfo::not_found`.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// The file system refused a read (permissions, broken mounts, ...).
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path being read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// An href was requested without a value for one of its parameters.
    #[error("Missing parameter '{name}' for route {pattern}")]
    MissingParam {
        /// Route pattern.
        pattern: String,
        /// Parameter name.
        name: String,
    },

    /// No route with the given pattern exists.
    #[error("Route not found: {0}")]
    UnknownRoute(String),
}

impl ResolveError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
