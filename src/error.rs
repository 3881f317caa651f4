//! Error types for the loan approval service

use crate::preprocessing::EncodeError;
use thiserror::Error;

/// Result type alias for loan approval operations
pub type Result<T> = std::result::Result<T, LoanError>;

/// Main error type for the model lifecycle and its collaborators
#[derive(Error, Debug)]
pub enum LoanError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("Preprocessing error: {0}")]
    PreprocessingError(String),

    #[error("Encoding error: {0}")]
    Encoding(#[from] EncodeError),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Inference error: {0}")]
    InferenceError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Store error: {0}")]
    StoreError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<polars::error::PolarsError> for LoanError {
    fn from(err: polars::error::PolarsError) -> Self {
        LoanError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for LoanError {
    fn from(err: serde_json::Error) -> Self {
        LoanError::SerializationError(err.to_string())
    }
}

impl From<bincode::Error> for LoanError {
    fn from(err: bincode::Error) -> Self {
        LoanError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for LoanError {
    fn from(err: ndarray::ShapeError) -> Self {
        LoanError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}

impl From<tempfile::PersistError> for LoanError {
    fn from(err: tempfile::PersistError) -> Self {
        LoanError::IoError(err.error)
    }
}

impl From<sqlx::Error> for LoanError {
    fn from(err: sqlx::Error) -> Self {
        LoanError::StoreError(err.to_string())
    }
}
