use thiserror::Error;

/// Failures reported by the object store or the record store.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BackendError {
    #[error("No matching row: {0}")]
    NotFound(String),
    /// The backend refused the request; the message is shown to the user as-is.
    #[error("{0}")]
    Rejected(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Could not decode backend response: {0}")]
    Decode(String),
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

/// What a form action can fail with, phrased for the user.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FormError {
    #[error("{0}")]
    Validation(String),
    #[error("Image upload error: {0}")]
    Upload(BackendError),
    #[error("Insert error: {0}")]
    Insert(BackendError),
    #[error("Update failed: {0}")]
    Update(BackendError),
    #[error("User not found")]
    NotFound,
}

impl FormError {
    pub fn validation(msg: impl Into<String>) -> Self {
        FormError::Validation(msg.into())
    }
}
