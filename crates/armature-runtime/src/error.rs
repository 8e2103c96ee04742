//! Runtime error types.

use thiserror::Error;

/// Errors raised while rendering.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// A value with no HTML representation reached the serializer.
    #[error("Serialization error: cannot render {0}")]
    Serialization(String),

    /// A component failed while producing its view.
    #[error("Component error: {0}")]
    Component(String),

    /// Client rendering was requested without an attached document.
    #[error("No document attached")]
    NoDocument,
}

/// Errors raised by durable storage.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The store refused the write because it is full.
    #[error("Storage quota exceeded writing key: {0}")]
    QuotaExceeded(String),

    /// The store is not usable.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised by signal writes and persistent signals.
#[derive(Error, Debug)]
pub enum ReactiveError {
    /// A bound view failed to re-render during DOM patching.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// Mirroring a persistent value to storage failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A persistent signal was requested but no storage is attached.
    #[error("No storage attached for persistent signal: {0}")]
    NoStorage(String),

    /// A persistent value could not be encoded.
    #[error("Failed to encode persistent signal {key}: {source}")]
    Encode {
        /// Storage key.
        key: String,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
}
