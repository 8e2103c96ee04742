//! Build errors.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

/// Errors raised while compiling a route.
///
/// Build failures are never retried automatically.
#[derive(Error, Debug)]
pub enum BuildError {
    /// The bundler ran and reported a failure.
    #[error("Bundler exited with status {status}: {stderr}")]
    Bundler {
        /// Exit code, or -1 if killed by a signal.
        status: i32,
        /// Full diagnostic output.
        stderr: String,
    },

    /// The bundler could not be started.
    #[error("Failed to start bundler: {0}")]
    Spawn(#[source] std::io::Error),

    /// Reading or writing a build file failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The route has no module to build.
    #[error("Route has no module to build")]
    NoRoute,

    /// The bundler produced no output for the entry module.
    #[error("No entry output produced for {0}")]
    MissingEntry(PathBuf),

    /// The route module does not export a default component.
    #[error("Route module has no default export: {0}")]
    MissingDefaultExport(PathBuf),

    /// The bundle manifest was unreadable or inconsistent.
    #[error("Invalid bundle manifest: {0}")]
    Manifest(String),

    /// A name could not be emitted as a JavaScript identifier.
    #[error("Invalid JavaScript identifier: {0}")]
    InvalidIdent(String),

    /// Failure of a build this caller joined while it was in flight.
    #[error(transparent)]
    Shared(Arc<BuildError>),
}

impl BuildError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Bundler diagnostic output, if this is (or wraps) a bundler failure.
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            Self::Bundler { stderr, .. } => Some(stderr),
            Self::Shared(inner) => inner.diagnostic(),
            _ => None,
        }
    }
}
