use std::error::Error;
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed backend failure.
pub type BoxedSource = Box<dyn Error + Send + Sync>;

/// Error raised by storage backends regardless of where the snapshot lives.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be reached or refused the operation.
    #[error("storage unavailable: {message}")]
    Unavailable {
        /// What the backend was doing.
        message: String,
        /// Underlying failure.
        #[source]
        source: BoxedSource,
    },
    /// A stored snapshot exists but cannot be decoded. Retrying will not help.
    #[error("stored snapshot is corrupt: {message}")]
    Corrupt {
        /// Which snapshot failed to decode.
        message: String,
        /// Decoder failure.
        #[source]
        source: BoxedSource,
    },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }

    /// Construct a corrupt-snapshot error from a decoder failure.
    pub fn corrupt(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Corrupt {
            message,
            source: Box::new(source),
        }
    }

    /// Whether reconnecting could make the operation succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, StorageError::Unavailable { .. })
    }
}
