//! Error types, one enum per concern.

use std::path::PathBuf;

/// Failures raised by a scaler or classifier.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("model file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to load model: {reason}")]
    Load { reason: String },

    #[error("expected {expected} features, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("inference failed: {reason}")]
    Inference { reason: String },

    #[error("classifier does not provide class probabilities")]
    ProbabilityUnsupported,
}

/// A recoverable failure inside one stage of the prediction pipeline.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error("scaling failed: {0}")]
    Scale(#[source] ModelError),

    #[error("classification failed: {0}")]
    Classify(#[source] ModelError),

    #[error("probability unavailable: {0}")]
    Probability(#[source] ModelError),

    #[error("probability {value} outside [0, 1]")]
    InvalidProbability { value: f64 },
}

/// The only failure that leaves the prediction pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PredictError {
    #[error("{component} not loaded")]
    ServiceUnavailable { component: &'static str },
}

#[derive(Debug, thiserror::Error)]
pub enum ThresholdError {
    #[error("cannot read dataset {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("dataset has no header row")]
    EmptyDataset,

    #[error("malformed dataset: {0}")]
    Csv(#[from] csv::Error),

    #[error("column {column} missing from dataset")]
    MissingColumn { column: String },

    #[error("column {column} has no numeric values")]
    NoValues { column: String },
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("encryption failed")]
    Encrypt,

    #[error("decryption failed: {reason}")]
    Decrypt { reason: String },
}

/// Request fields outside their accepted range.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} must be within [{min}, {max}], got {value}")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },

    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },

    #[error("either name or user_id must be provided")]
    MissingIdentity,
}

/// Errors surfaced by the serving layer to its caller.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("invalid request: {0}")]
    Validation(#[from] ValidationError),

    #[error("service unavailable: {0}")]
    Unavailable(#[from] PredictError),
}

impl ServiceError {
    /// HTTP-equivalent status for the failure class.
    pub fn status_code(&self) -> u16 {
        match self {
            ServiceError::Validation(_) => 422,
            ServiceError::Unavailable(_) => 503,
        }
    }
}
