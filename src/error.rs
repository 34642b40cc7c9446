use std::fmt;

/// Result type for mlcourse operations
pub type Result<T> = std::result::Result<T, MlError>;

/// Main error type for the mlcourse library
#[derive(Debug, Clone)]
pub enum MlError {
    /// Invalid dimensions for operations
    DimensionMismatch {
        expected: String,
        actual: String,
    },

    /// Invalid parameter value
    InvalidParameter {
        name: String,
        reason: String,
    },

    /// A packed array file lacks some of the arrays a workflow needs
    MissingArrays {
        path: String,
        missing: Vec<String>,
        found: Vec<String>,
    },

    /// Training history whose metric sequences disagree in length
    InconsistentHistory(String),

    /// IO errors (file operations)
    IoError(String),

    /// Serialization/deserialization errors
    SerializationError(String),

    /// Malformed tabular input
    CsvError(String),

    /// Bayesian network inference failures
    InferenceError(String),

    /// Invalid action
    InvalidAction {
        action: usize,
        max_actions: usize,
    },

    /// Environment used outside its episode lifecycle
    EnvironmentError(String),

    /// Chart rendering failures
    PlotError(String),

    /// Training error
    TrainingError(String),
}

impl fmt::Display for MlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MlError::DimensionMismatch { expected, actual } => {
                write!(f, "Dimension mismatch: expected {}, got {}", expected, actual)
            }
            MlError::InvalidParameter { name, reason } => {
                write!(f, "Invalid parameter '{}': {}", name, reason)
            }
            MlError::MissingArrays { path, missing, found } => {
                write!(
                    f,
                    "Missing keys in {}: {:?}. Found keys: {:?}",
                    path, missing, found
                )
            }
            MlError::InconsistentHistory(msg) => write!(f, "Inconsistent history: {}", msg),
            MlError::IoError(msg) => write!(f, "IO error: {}", msg),
            MlError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            MlError::CsvError(msg) => write!(f, "CSV error: {}", msg),
            MlError::InferenceError(msg) => write!(f, "Inference error: {}", msg),
            MlError::InvalidAction { action, max_actions } => {
                write!(f, "Invalid action {}: must be less than {}", action, max_actions)
            }
            MlError::EnvironmentError(msg) => write!(f, "Environment error: {}", msg),
            MlError::PlotError(msg) => write!(f, "Plot error: {}", msg),
            MlError::TrainingError(msg) => write!(f, "Training error: {}", msg),
        }
    }
}

impl std::error::Error for MlError {}

impl From<std::io::Error> for MlError {
    fn from(err: std::io::Error) -> Self {
        MlError::IoError(err.to_string())
    }
}

impl From<bincode::Error> for MlError {
    fn from(err: bincode::Error) -> Self {
        MlError::SerializationError(err.to_string())
    }
}

impl From<serde_json::Error> for MlError {
    fn from(err: serde_json::Error) -> Self {
        MlError::SerializationError(err.to_string())
    }
}

impl From<csv::Error> for MlError {
    fn from(err: csv::Error) -> Self {
        MlError::CsvError(err.to_string())
    }
}

impl From<ndarray_npy::ReadNpzError> for MlError {
    fn from(err: ndarray_npy::ReadNpzError) -> Self {
        MlError::SerializationError(err.to_string())
    }
}

// Helper functions for common error patterns
impl MlError {
    pub fn dimension_mismatch<E: Into<String>, A: Into<String>>(expected: E, actual: A) -> Self {
        MlError::DimensionMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn invalid_parameter<N: Into<String>, R: Into<String>>(name: N, reason: R) -> Self {
        MlError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Wrap any plotting backend error
    pub fn plot<E: fmt::Display>(err: E) -> Self {
        MlError::PlotError(err.to_string())
    }
}
