use thiserror::Error;

// ---------------------------------------------------------------------------
// PredictorError – everything the pipeline can surface to a caller
// ---------------------------------------------------------------------------

/// Errors surfaced by the training pipeline.
///
/// Every variant carries enough context (the offending name plus the valid
/// alternatives) for a caller to correct the request without re-running.
#[derive(Debug, Error)]
pub enum PredictorError {
    #[error("Label column '{column}' not found in data. Available columns: {available:?}")]
    ColumnNotFound {
        column: String,
        available: Vec<String>,
    },

    #[error("Model '{name}' not supported. Available models: {available:?}")]
    UnsupportedModel {
        name: String,
        available: Vec<String>,
    },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Expected {expected} column names for the data but {found} were supplied")]
    ColumnCountMismatch { expected: usize, found: usize },

    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    #[error("Estimator failure: {0}")]
    Estimator(String),

    /// Only ever produced inside the evaluator, which downgrades it to a
    /// missing plot section.
    #[error("Plot rendering failed: {0}")]
    Plot(String),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PredictorError>;

impl PredictorError {
    pub(crate) fn estimator(msg: impl Into<String>) -> Self {
        PredictorError::Estimator(msg.into())
    }

    pub(crate) fn insufficient(msg: impl Into<String>) -> Self {
        PredictorError::InsufficientData(msg.into())
    }
}
