//! Error types raised by the JSON file backend.

use std::path::PathBuf;

use thiserror::Error;

use crate::dao::storage::StorageError;

/// Convenient result alias returning [`FileDaoError`] failures.
pub type FileResult<T> = Result<T, FileDaoError>;

/// Failures that can occur while reading or writing the snapshot file.
#[derive(Debug, Error)]
pub enum FileDaoError {
    /// The directory holding the snapshot could not be created or inspected.
    #[error("snapshot directory `{path}` is not usable")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Reading the snapshot failed.
    #[error("failed to read snapshot `{path}`")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Writing or renaming the snapshot failed.
    #[error("failed to write snapshot `{path}`")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The snapshot could not be encoded.
    #[error("failed to encode snapshot")]
    Encode {
        #[source]
        source: serde_json::Error,
    },
    /// The snapshot on disk is not valid JSON for the current model.
    #[error("failed to decode snapshot `{path}`")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl From<FileDaoError> for StorageError {
    fn from(err: FileDaoError) -> Self {
        let message = err.to_string();
        match err {
            FileDaoError::Decode { .. } => StorageError::corrupt(message, err),
            _ => StorageError::unavailable(message, err),
        }
    }
}
