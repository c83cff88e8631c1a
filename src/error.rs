//! Error types for the irradiance forecasting pipeline

use thiserror::Error;

/// Result type alias for forecasting operations
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Fatal pipeline errors.
///
/// Any of these aborts the whole run. A horizon that cannot be trained is
/// not an error; it is reported as a [`crate::training::SkippedHorizon`].
#[derive(Error, Debug)]
pub enum ForecastError {
    #[error("Missing required time column: {0}")]
    MissingColumn(String),

    #[error("Time column '{column}' has a non-integer value {value:?} at row {row}")]
    InvalidCalendarValue {
        column: String,
        row: usize,
        value: Option<String>,
    },

    #[error("Neither GHI nor Clearsky GHI found. Add one of these columns.")]
    TargetNotFound,

    #[error("Target column '{0}' has no valid values.")]
    EmptyTarget(String),

    #[error("No valid features available after processing. Ensure input CSV has predictor columns.")]
    NoFeatures,

    #[error("Insufficient data: {rows} rows after feature engineering. Started with {original} rows. Need at least {required} rows to train models.")]
    InsufficientData {
        rows: usize,
        original: usize,
        required: usize,
    },

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },
}

impl From<polars::error::PolarsError> for ForecastError {
    fn from(err: polars::error::PolarsError) -> Self {
        ForecastError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for ForecastError {
    fn from(err: serde_json::Error) -> Self {
        ForecastError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for ForecastError {
    fn from(err: ndarray::ShapeError) -> Self {
        ForecastError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
