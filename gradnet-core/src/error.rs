use thiserror::Error;

/// Custom error type for the GradNet framework.
#[derive(Error, Debug, PartialEq, Clone)] // PartialEq for easier testing
pub enum GradNetError {
    #[error("Shape mismatch: expected {expected:?}, got {actual:?} during operation {operation}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
        operation: String,
    },

    #[error("Row {row} has {actual} entries, expected {expected}")]
    RowLengthMismatch {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Empty input during operation {operation}")]
    EmptyInput { operation: String },

    #[error("Target vector has {actual} entries, expected {expected}")]
    TargetLengthMismatch { expected: usize, actual: usize },

    #[error("{0} not implemented. Choose from ['cross_entropy', 'squared_error', 'mean_squared_error']")]
    UnknownLoss(String),

    #[error("Cannot fit a classifier with no layers")]
    NoLayers,

    #[error("Classifier must be fitted before calling {operation}")]
    NotFitted { operation: String },

    #[error("Internal error: {0}")]
    InternalError(String),
}
