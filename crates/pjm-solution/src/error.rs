//! Error types for solution file handling
//!
//! Covers:
//! - Reading (missing file, IO, malformed text)
//! - Model invariants (duplicate identifiers)
//! - Project edits (unsupported project kinds)

use std::path::PathBuf;

/// Errors raised while reading, editing or writing a solution file
#[derive(Debug, thiserror::Error)]
pub enum SolutionError {
    /// Solution file does not exist
    #[error("solution file not found: {0}")]
    NotFound(PathBuf),

    /// Text does not follow the solution file grammar
    #[error("malformed solution file {path} (line {line}): {message}")]
    Malformed {
        /// Solution file path
        path: PathBuf,
        /// 1-based line number where parsing stopped
        line: usize,
        /// What was expected
        message: String,
    },

    /// IO error during read or write
    #[error("io error on {path}: {source}")]
    Io {
        /// Path being read or written
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Two project entries share an identifier
    #[error("duplicate project identifier {id} in {path}")]
    DuplicateProjectId {
        /// Solution file path
        path: PathBuf,
        /// The repeated identifier
        id: String,
    },

    /// Project file extension has no known project type
    #[error("cannot infer project type for {0}")]
    UnsupportedProjectType(PathBuf),
}

impl SolutionError {
    /// Create malformed-text error at a line
    pub fn malformed(path: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        Self::Malformed {
            path: path.into(),
            line,
            message: message.into(),
        }
    }

    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Check if the error comes from the file's content rather than the environment
    #[inline]
    #[must_use]
    pub fn is_content_error(&self) -> bool {
        matches!(self, Self::Malformed { .. } | Self::DuplicateProjectId { .. })
    }
}

/// Result type alias for solution operations
pub type SolutionResult<T> = Result<T, SolutionError>;
