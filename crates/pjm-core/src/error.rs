//! Error types for pjmigrate runs
//!
//! Provides error handling for:
//! - Input resolution (nothing to migrate, unreadable global settings)
//! - Environment failures of the converter and template collaborators
//! - Solution edits delegated to an external tool
//! - Backup collisions

use pjm_report::ReportError;
use pjm_solution::SolutionError;
use std::path::PathBuf;
use std::process::ExitStatus;

/// Errors from a solution manipulation capability
#[derive(Debug, thiserror::Error)]
pub enum ManipulationError {
    /// External tool exited unsuccessfully
    #[error("solution {operation} failed for {project} ({status})")]
    OperationFailed {
        /// `add` or `remove`
        operation: &'static str,
        /// Project file being added or removed
        project: PathBuf,
        /// Exit status of the tool
        status: ExitStatus,
    },

    /// External tool could not be started
    #[error("cannot run {program}: {source}")]
    Spawn {
        /// Program name
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Reading, editing or writing the solution failed
    #[error(transparent)]
    Solution(#[from] SolutionError),
}

/// Environment-level failure of the conversion capability
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    /// Converter could not be started
    #[error("cannot run converter {program}: {source}")]
    Spawn {
        /// Program name
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Template project file is missing
    #[error("template project not found: {0}")]
    TemplateMissing(PathBuf),
}

/// Template project provisioning failures
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// Scratch directory could not be created
    #[error("cannot create template scratch directory: {0}")]
    Scratch(#[source] std::io::Error),

    /// Scaffolding tool could not be started
    #[error("cannot run {program}: {source}")]
    Spawn {
        /// Program name
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Scaffolding tool exited unsuccessfully
    #[error("template creation failed ({status}): {stderr}")]
    CommandFailed {
        /// Exit status
        status: ExitStatus,
        /// Trimmed standard error output
        stderr: String,
    },

    /// Template file does not exist
    #[error("template project not found: {0}")]
    Missing(PathBuf),
}

/// Backup failures
#[derive(Debug, thiserror::Error)]
pub enum BackupError {
    /// Destination exists with different content
    #[error("backup destination {destination} already exists and differs from {source_path}")]
    Conflict {
        /// File being backed up
        source_path: PathBuf,
        /// Existing destination
        destination: PathBuf,
    },

    /// IO failure while moving
    #[error("io error on {path}: {source}")]
    Io {
        /// Path involved
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BackupError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Top-level run error
#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    /// Input resolved to no legacy descriptors
    #[error("no project.json found for {0}")]
    InputNotFound(PathBuf),

    /// Input is neither a descriptor, global settings file, solution nor directory
    #[error("invalid project argument {0}: expected a project.json, global.json, solution file or directory")]
    InvalidInput(PathBuf),

    /// Named descriptor does not exist
    #[error("project.json not found: {0}")]
    DescriptorNotFound(PathBuf),

    /// Named global settings file does not exist
    #[error("global.json not found: {0}")]
    GlobalSettingsNotFound(PathBuf),

    /// Global settings file is not valid JSON
    #[error("cannot read global.json {path}: {source}")]
    UnreadableGlobalSettings {
        /// Settings file
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Named solution file could not be read
    #[error(transparent)]
    Solution(#[from] SolutionError),

    /// Converter environment failure
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    /// Template provisioning failure
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// Solution edit failure
    #[error(transparent)]
    Manipulation(#[from] ManipulationError),

    /// Backup failure
    #[error(transparent)]
    Backup(#[from] BackupError),

    /// Report output failure
    #[error("report output failed: {0}")]
    ReportWrite(#[from] ReportError),

    /// IO failure outside the other categories
    #[error("io error on {path}: {source}")]
    Io {
        /// Path involved
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MigrateError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Check if the error is a user input error raised before any conversion
    #[must_use]
    pub fn is_user_input_error(&self) -> bool {
        match self {
            Self::InputNotFound(_)
            | Self::InvalidInput(_)
            | Self::DescriptorNotFound(_)
            | Self::GlobalSettingsNotFound(_)
            | Self::UnreadableGlobalSettings { .. } => true,
            Self::Solution(err) => err.is_content_error() || matches!(err, SolutionError::NotFound(_)),
            _ => false,
        }
    }
}

/// Result type alias for run operations
pub type MigrateResult<T> = Result<T, MigrateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_errors_are_classified() {
        assert!(MigrateError::InputNotFound(PathBuf::from("/w")).is_user_input_error());
        assert!(MigrateError::from(SolutionError::malformed("/w/A.sln", 3, "bad")).is_user_input_error());
        assert!(!MigrateError::from(BackupError::Conflict {
            source_path: PathBuf::from("/w/a"),
            destination: PathBuf::from("/w/backup/a"),
        })
        .is_user_input_error());
    }

    #[test]
    fn conflict_names_both_paths() {
        let err = BackupError::Conflict {
            source_path: PathBuf::from("/w/A/project.json"),
            destination: PathBuf::from("/w/backup/A/project.json"),
        };
        let text = err.to_string();
        assert!(text.contains("/w/A/project.json") && text.contains("/w/backup/A/project.json"));
    }
}
