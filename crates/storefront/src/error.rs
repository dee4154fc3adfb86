//! Storage error type.
//!
//! Only the store backends and the watcher return these. Cart and theme
//! operations log them and carry on; see [`crate::context`].

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by key-value backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem operation failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A record could not be serialized.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Key contains characters the backend cannot store.
    #[error("Invalid store key: {0:?}")]
    InvalidKey(String),

    /// Filesystem watcher could not be started.
    #[error("Watcher error: {0}")]
    Watch(#[from] notify::Error),

    /// A writer panicked while holding the store lock.
    #[error("Store lock poisoned")]
    Poisoned,
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for `StoreError`.
pub type Result<T> = std::result::Result<T, StoreError>;
