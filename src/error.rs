//! Error types for regforge

use thiserror::Error;

/// Result type alias for regforge operations
pub type Result<T> = std::result::Result<T, RegforgeError>;

/// Main error type for model selection and training
#[derive(Error, Debug)]
pub enum RegforgeError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("No adequate model: best candidate '{best_name}' scored {best_score:.4}, below threshold {threshold}")]
    NoAdequateModel {
        best_name: String,
        best_score: f64,
        threshold: f64,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Computation error: {0}")]
    ComputationError(String),

    #[error("Model not fitted")]
    ModelNotFitted,
}

impl From<bincode::Error> for RegforgeError {
    fn from(err: bincode::Error) -> Self {
        RegforgeError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for RegforgeError {
    fn from(err: ndarray::ShapeError) -> Self {
        RegforgeError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
