//! Error types for the anomaly forecaster.

use thiserror::Error;

/// Result type alias for forecast operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Errors that can occur while preparing data, fitting models or forecasting.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// The local anomaly table does not exist.
    #[error("data file not found: {0}")]
    DataFileNotFound(String),

    /// A data source could not be read or fetched.
    #[error("data unavailable: {0}")]
    DataUnavailable(String),

    /// A data source was read but its content is unusable.
    #[error("malformed data: {0}")]
    DataMalformed(String),

    /// No candidate model could be fitted.
    #[error("no viable model: {0}")]
    NoViableModel(String),

    /// A backtest window has too little training data.
    #[error("insufficient history: need at least {needed} months, got {got}")]
    InsufficientHistory { needed: usize, got: usize },

    /// The target month is not after the last observation.
    #[error("target month {target} is not after the last observation {last}")]
    HorizonMismatch { last: String, target: String },

    /// Invalid configuration value.
    #[error("configuration error: {0}")]
    Config(String),

    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// Insufficient data points for the operation.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Dimension mismatch between data structures.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Timestamp-related error.
    #[error("timestamp error: {0}")]
    TimestampError(String),

    /// Computation error (e.g., numerical issues).
    #[error("computation error: {0}")]
    ComputationError(String),
}

impl ForecastError {
    /// Whether the user can fix the problem and simply rerun.
    ///
    /// Only a missing local data file qualifies; everything else ends the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ForecastError::DataFileNotFound(_))
    }

    /// Whether the error comes from acquiring or parsing input data.
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            ForecastError::DataFileNotFound(_)
                | ForecastError::DataUnavailable(_)
                | ForecastError::DataMalformed(_)
        )
    }
}
