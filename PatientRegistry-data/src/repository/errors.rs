use std::path::PathBuf;
use std::sync::PoisonError;
use thiserror::Error;

/// Error type for registry storage operations
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// The backing file could not be read or written
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The registry document is not valid JSON of the expected shape
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Lock error
    #[error("Lock error: {0}")]
    Lock(String),

    /// The blocking write task panicked or was cancelled
    #[error("Write task failed: {0}")]
    Task(String),
}

impl RepositoryError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RepositoryError::Io {
            path: path.into(),
            source,
        }
    }
}

impl<T> From<PoisonError<T>> for RepositoryError {
    fn from(error: PoisonError<T>) -> Self {
        RepositoryError::Lock(error.to_string())
    }
}
