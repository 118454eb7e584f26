//! Error types for the analysis library.

use std::path::PathBuf;
use thiserror::Error;

/// Hard failures surfaced to the caller. Column-level problems never end up
/// here; they are recorded as omissions in the analysis result.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Source data could not be turned into a table.
    #[error("Ingestion error: {0}")]
    Ingestion(String),

    /// Invalid analysis configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for analysis operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;
