//! Error types for report output

use std::path::PathBuf;

/// Errors raised while rendering or writing a report
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// JSON serialisation failed
    #[error("json serialisation failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Writing the report failed
    #[error("cannot write report to {path}: {source}")]
    Io {
        /// Report destination
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ReportError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for report operations
pub type ReportResult<T> = Result<T, ReportError>;
