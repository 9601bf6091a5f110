//! Error types for the SLA monitor.

use crate::core::types::OrderId;
use thiserror::Error;

/// Result type alias for SLA monitor operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while monitoring SLA compliance.
#[derive(Error, Debug)]
pub enum Error {
    // Caller errors
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    // Durability errors
    #[error("Storage failure: {0}")]
    StorageFailure(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for a validation failure.
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    /// Whether the caller can fix this by changing the request.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::Validation(_) | Error::OrderNotFound(_))
    }

    /// Whether retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::StorageFailure(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}
