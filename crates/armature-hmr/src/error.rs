//! HMR errors.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised by the watcher and client script setup.
#[derive(Error, Debug)]
pub enum HmrError {
    /// The file system watcher could not be created or attached.
    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),

    /// Reading or writing an HMR file failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

impl HmrError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
