//! Blob storage client errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BlobError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid connection string: {0}")]
    InvalidConnectionString(String),

    #[error("Invalid account key: {0}")]
    InvalidAccountKey(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Blob not found: {container}/{blob}")]
    NotFound { container: String, blob: String },

    #[error("Write precondition failed")]
    PreconditionFailed,

    #[error("Storage API error: {status} {code:?} - {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },
}

impl BlobError {
    /// Whether this error is the storage service's not-found signal.
    pub fn is_not_found(&self) -> bool {
        matches!(self, BlobError::NotFound { .. })
    }
}
