use crate::storage::StorageError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Invalid request data, e.g. a malformed multipart body
    #[error("{message}")]
    BadRequest { message: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// File store operation error
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Storage(storage_err) => match storage_err {
                StorageError::InvalidName { .. } => StatusCode::BAD_REQUEST,
                StorageError::BadInput { .. } => StatusCode::BAD_REQUEST,
                StorageError::NotFound { .. } => StatusCode::NOT_FOUND,
                StorageError::Unavailable { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Returns a user-safe error message, without leaking paths or OS error details
    pub fn user_message(&self) -> String {
        match self {
            Error::BadRequest { message } => message.clone(),
            Error::Internal { .. } => "Internal server error".to_string(),
            Error::Storage(storage_err) => match storage_err {
                StorageError::InvalidName { .. } => "Invalid file name".to_string(),
                StorageError::BadInput { message } => message.clone(),
                StorageError::NotFound { .. } => "File not found".to_string(),
                StorageError::Unavailable { operation, .. } => format!("Could not {operation}"),
            },
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Full details only go to the log
        match &self {
            Error::Storage(StorageError::Unavailable { .. }) | Error::Internal { .. } => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Storage(_) | Error::BadRequest { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        (self.status_code(), self.user_message()).into_response()
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;
