use axum::http::StatusCode;
use thiserror::Error;

use super::AppError;
use crate::models::ConversionError;

/// Errors raised while talking to the document store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Could not reach the document store: {message}")]
    Connection { message: String },

    #[error("Operation rejected by the document store: {message}")]
    Rejected { message: String },

    #[error("Document store query failed: {message}")]
    Query { message: String },

    #[error("Value cannot be represented as a document field: {reason}")]
    Unrepresentable { reason: String },

    #[error("Operation '{operation}' is not implemented")]
    NotImplemented { operation: &'static str },
}

impl AppError for StoreError {
    fn status_code(&self) -> StatusCode {
        match self {
            StoreError::Connection { .. } => StatusCode::SERVICE_UNAVAILABLE,
            StoreError::Rejected { .. } => StatusCode::BAD_REQUEST,
            StoreError::Query { .. } | StoreError::Unrepresentable { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            StoreError::NotImplemented { .. } => StatusCode::NOT_IMPLEMENTED,
        }
    }

    fn user_message(&self) -> String {
        match self {
            StoreError::Connection { .. } => "The database is unavailable".to_string(),
            StoreError::Rejected { message } => format!("The database rejected the request: {}", message),
            StoreError::Query { .. } => "An internal error occurred".to_string(),
            StoreError::Unrepresentable { .. } => "A stored value could not be displayed".to_string(),
            StoreError::NotImplemented { operation } => format!("'{}' is not implemented", operation),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            StoreError::Connection { .. } => "STORE_CONNECTION",
            StoreError::Rejected { .. } => "STORE_REJECTED",
            StoreError::Query { .. } => "STORE_QUERY",
            StoreError::Unrepresentable { .. } => "STORE_UNREPRESENTABLE",
            StoreError::NotImplemented { .. } => "STORE_NOT_IMPLEMENTED",
        }
    }
}

impl_into_response!(StoreError);

impl StoreError {
    pub fn rejected<S: Into<String>>(message: S) -> Self {
        Self::Rejected { message: message.into() }
    }
}

impl From<ConversionError> for StoreError {
    fn from(error: ConversionError) -> Self {
        StoreError::Unrepresentable { reason: error.to_string() }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(error: serde_json::Error) -> Self {
        StoreError::Unrepresentable { reason: error.to_string() }
    }
}
