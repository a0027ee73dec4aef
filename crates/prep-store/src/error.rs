//! Store error types.

use std::path::PathBuf;

use prep_model::ModelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// File I/O error.
    #[error("failed to {operation} {path}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The temp file could not be moved over the target.
    #[error("failed to replace {target_path}")]
    AtomicWriteFailed {
        temp_path: PathBuf,
        target_path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize {kind} '{id}'")]
    Serialization {
        kind: String,
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to deserialize {kind} '{id}'")]
    Deserialization {
        kind: String,
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid {kind} id '{id}'")]
    InvalidId { kind: String, id: String },

    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    #[error("store lock is poisoned")]
    Poisoned,

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl StoreError {
    /// Whether retrying the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Io { .. } | Self::AtomicWriteFailed { .. } | Self::Poisoned
        )
    }

    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io {
            operation,
            path,
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
