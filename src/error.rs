//! Error types for encoding operations.

/// Error type for fitting, applying and persisting encodings.
#[derive(Debug, thiserror::Error)]
pub enum EncodingError {
    /// Invalid hyperparameter, weight or outcome for the requested mode.
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// A category value does not match the kind the table was trained on.
    #[error("Schema error: expected {expected} categories, got {got}")]
    Schema { expected: String, got: String },
    /// A column named by the configuration is absent from the frame.
    #[error("Missing column: {0}")]
    MissingColumn(String),
    /// A column exists but holds the wrong type of values.
    #[error("Column {column} has type {got}, expected {expected}")]
    ColumnType {
        column: String,
        expected: String,
        got: String,
    },
    /// Columns of one frame disagree on their row count.
    #[error("Length mismatch: column {column} has {got} rows, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        got: usize,
    },
    /// An estimate produced outside the analytical core was NaN or infinite.
    #[error("Non-finite estimate: {0}")]
    NonFiniteEstimate(String),
    /// Serialization or deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(String),
    /// Malformed CSV input.
    #[error("CSV error: {0}")]
    Csv(String),
}

impl EncodingError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        EncodingError::Configuration(msg.into())
    }
}

impl From<std::io::Error> for EncodingError {
    fn from(err: std::io::Error) -> Self {
        EncodingError::Io(err.to_string())
    }
}

impl From<bincode::Error> for EncodingError {
    fn from(err: bincode::Error) -> Self {
        EncodingError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for EncodingError {
    fn from(err: serde_json::Error) -> Self {
        EncodingError::Serialization(err.to_string())
    }
}

impl From<csv::Error> for EncodingError {
    fn from(err: csv::Error) -> Self {
        EncodingError::Csv(err.to_string())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, EncodingError>;
