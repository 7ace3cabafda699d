use thiserror::Error;

/// Errors produced by the file store boundary operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// The client-supplied name has no usable final segment
    #[error("Invalid file name: {name:?}")]
    InvalidName { name: String },

    /// The upload request did not carry usable content
    #[error("{message}")]
    BadInput { message: String },

    /// The resolved file does not exist
    #[error("File {name} not found")]
    NotFound { name: String },

    /// The storage directory or a file in it could not be read or written
    #[error("Failed to {operation}: {source}")]
    Unavailable {
        operation: String,
        #[source]
        source: std::io::Error,
    },
}

impl StorageError {
    /// Builds a mapper for `map_err` that wraps an I/O failure as [`StorageError::Unavailable`].
    pub(crate) fn unavailable(operation: &str) -> impl FnOnce(std::io::Error) -> Self + '_ {
        move |source| StorageError::Unavailable {
            operation: operation.to_string(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, StorageError>;
