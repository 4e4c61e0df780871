//! Per-project conversion capability
//!
//! The converter turns one `project.json` directory into a `.csproj`. Ordinary
//! conversion problems come back as errors inside the project report; only
//! environment failures are returned as [`ConversionError`].

use crate::error::ConversionError;
use pjm_report::ProjectMigrationReport;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Command;

/// Inputs for converting one project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    /// Directory holding `project.json`
    pub project_directory: PathBuf,
    /// Directory receiving the converted project
    pub output_directory: PathBuf,
    /// Template project the conversion starts from
    pub template_project: PathBuf,
    /// Legacy build descriptor to read settings from
    pub xproj_file: Option<PathBuf>,
    /// SDK package version to reference
    pub sdk_package_version: Option<String>,
    /// Do not follow project references
    pub skip_project_references: bool,
    /// Solution the project is being converted in, if any
    pub solution_file: Option<PathBuf>,
}

impl ConversionRequest {
    /// Display name used when the converter reports nothing usable
    #[must_use]
    pub fn fallback_project_name(&self) -> String {
        self.project_directory
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Converts one legacy project
#[cfg_attr(test, mockall::automock)]
pub trait ProjectConverter {
    /// Convert the project described by the request
    ///
    /// # Errors
    /// Returns error only for environment failures; conversion problems are
    /// reported through the returned report's errors.
    fn convert(&self, request: &ConversionRequest) -> Result<ProjectMigrationReport, ConversionError>;
}

/// Converter backed by an external program printing a JSON report on stdout
#[derive(Debug, Clone)]
pub struct CommandConverter {
    program: String,
    leading_args: Vec<OsString>,
}

impl CommandConverter {
    /// Create converter running `program`
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
        }
    }

    /// Prepend a fixed argument to every invocation
    #[must_use]
    pub fn with_arg(mut self, arg: impl Into<OsString>) -> Self {
        self.leading_args.push(arg.into());
        self
    }

    fn command(&self, request: &ConversionRequest) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.leading_args)
            .arg("--project-directory")
            .arg(&request.project_directory)
            .arg("--output-directory")
            .arg(&request.output_directory)
            .arg("--template-file")
            .arg(&request.template_project);
        if let Some(xproj) = &request.xproj_file {
            command.arg("--xproj-file").arg(xproj);
        }
        if let Some(version) = &request.sdk_package_version {
            command.arg("--sdk-package-version").arg(version);
        }
        if request.skip_project_references {
            command.arg("--skip-project-references");
        }
        if let Some(solution) = &request.solution_file {
            command.arg("--solution-file").arg(solution);
        }
        command
    }
}

fn failure(request: &ConversionRequest, message: String) -> ProjectMigrationReport {
    ProjectMigrationReport::failed(
        request.fallback_project_name(),
        request.project_directory.clone(),
        message,
    )
}

impl ProjectConverter for CommandConverter {
    fn convert(&self, request: &ConversionRequest) -> Result<ProjectMigrationReport, ConversionError> {
        if !request.template_project.is_file() {
            return Err(ConversionError::TemplateMissing(request.template_project.clone()));
        }
        tracing::debug!("Converting {}", request.project_directory.display());

        let output = self
            .command(request)
            .output()
            .map_err(|source| ConversionError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Ok(failure(
                request,
                format!("converter exited with {}: {}", output.status, stderr.trim()),
            ));
        }
        match serde_json::from_slice::<ProjectMigrationReport>(&output.stdout) {
            Ok(report) => Ok(report),
            Err(err) => Ok(failure(request, format!("unreadable converter report: {err}"))),
        }
    }
}
