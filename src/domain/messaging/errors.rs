//! Messaging-specific error types.

use crate::domain::foundation::{DomainError, ErrorCode, ValidationError};

/// Errors surfaced by the messaging handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessagingError {
    /// The message shape or content is invalid; nothing was persisted.
    ValidationFailed { field: String, message: String },
    /// The addressed recipient or message does not exist.
    NotFound(String),
    /// A pagination cursor could not be parsed.
    InvalidCursor(String),
    /// The outbox failed.
    Storage(String),
}

impl MessagingError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        MessagingError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }
    pub fn not_found(what: impl Into<String>) -> Self {
        MessagingError::NotFound(what.into())
    }
    pub fn invalid_cursor(message: impl Into<String>) -> Self {
        MessagingError::InvalidCursor(message.into())
    }
    pub fn storage(message: impl Into<String>) -> Self {
        MessagingError::Storage(message.into())
    }
    pub fn code(&self) -> ErrorCode {
        match self {
            MessagingError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            MessagingError::NotFound(_) => ErrorCode::RecipientNotFound,
            MessagingError::InvalidCursor(_) => ErrorCode::InvalidCursor,
            MessagingError::Storage(_) => ErrorCode::DatabaseError,
        }
    }
    pub fn message(&self) -> String {
        match self {
            MessagingError::ValidationFailed { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            MessagingError::NotFound(what) => format!("Not found: {}", what),
            MessagingError::InvalidCursor(msg) => format!("Invalid cursor: {}", msg),
            MessagingError::Storage(msg) => format!("Storage error: {}", msg),
        }
    }
}

impl std::fmt::Display for MessagingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for MessagingError {}

impl From<ValidationError> for MessagingError {
    fn from(err: ValidationError) -> Self {
        MessagingError::ValidationFailed {
            field: err.field().to_string(),
            message: err.to_string(),
        }
    }
}

impl From<DomainError> for MessagingError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::RecipientNotFound => MessagingError::NotFound(err.message),
            ErrorCode::InvalidCursor => MessagingError::InvalidCursor(err.message),
            ErrorCode::ValidationFailed => MessagingError::ValidationFailed {
                field: err
                    .details
                    .get("field")
                    .cloned()
                    .unwrap_or_else(|| "unknown".to_string()),
                message: err.message,
            },
            ErrorCode::DatabaseError => MessagingError::Storage(err.to_string()),
        }
    }
}
