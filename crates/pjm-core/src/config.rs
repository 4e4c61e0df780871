//! Run configuration

use pjm_report::ReportFormat;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default converter program
pub const DEFAULT_CONVERTER: &str = "pjconvert";
/// Default dotnet host program
pub const DEFAULT_DOTNET: &str = "dotnet";

/// How solution members are added and removed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolutionEditing {
    /// Edit the parsed model in process
    #[default]
    Direct,
    /// Delegate to `dotnet sln add|remove`
    External,
}

/// Migration run configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrateConfig {
    /// Descriptor, global settings file, solution file or directory
    pub input: PathBuf,
    /// Explicit template project; provisioned on demand when absent
    pub template_file: Option<PathBuf>,
    /// SDK package version handed to the converter
    pub sdk_package_version: Option<String>,
    /// Legacy build descriptor handed to the converter
    pub xproj_file: Option<PathBuf>,
    /// Report file destination
    pub report_file: Option<PathBuf>,
    /// Do not follow project references during conversion
    pub skip_project_references: bool,
    /// Report file format
    pub report_format: ReportFormat,
    /// Leave legacy artifacts in place
    pub skip_backup: bool,
    /// Colour the console report
    pub colored: bool,
    /// Converter program
    pub converter_program: String,
    /// dotnet host program (template scaffolding, external solution edits)
    pub dotnet_program: String,
    /// Solution edit strategy
    pub solution_editing: SolutionEditing,
}

impl MigrateConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With input path
    #[inline]
    #[must_use]
    pub fn with_input(mut self, input: impl Into<PathBuf>) -> Self {
        self.input = input.into();
        self
    }

    /// With explicit template project
    #[inline]
    #[must_use]
    pub fn with_template_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.template_file = Some(path.into());
        self
    }

    /// With SDK package version
    #[inline]
    #[must_use]
    pub fn with_sdk_package_version(mut self, version: impl Into<String>) -> Self {
        self.sdk_package_version = Some(version.into());
        self
    }

    /// With legacy build descriptor
    #[inline]
    #[must_use]
    pub fn with_xproj_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.xproj_file = Some(path.into());
        self
    }

    /// With report file
    #[inline]
    #[must_use]
    pub fn with_report_file(mut self, path: impl Into<PathBuf>, format: ReportFormat) -> Self {
        self.report_file = Some(path.into());
        self.report_format = format;
        self
    }

    /// With project reference skipping
    #[inline]
    #[must_use]
    pub fn with_skip_project_references(mut self, skip: bool) -> Self {
        self.skip_project_references = skip;
        self
    }

    /// With backup skipping
    #[inline]
    #[must_use]
    pub fn with_skip_backup(mut self, skip: bool) -> Self {
        self.skip_backup = skip;
        self
    }

    /// With console colour
    #[inline]
    #[must_use]
    pub fn with_colored(mut self, colored: bool) -> Self {
        self.colored = colored;
        self
    }

    /// With converter program
    #[inline]
    #[must_use]
    pub fn with_converter_program(mut self, program: impl Into<String>) -> Self {
        self.converter_program = program.into();
        self
    }

    /// With dotnet host program
    #[inline]
    #[must_use]
    pub fn with_dotnet_program(mut self, program: impl Into<String>) -> Self {
        self.dotnet_program = program.into();
        self
    }

    /// With solution edit strategy
    #[inline]
    #[must_use]
    pub fn with_solution_editing(mut self, editing: SolutionEditing) -> Self {
        self.solution_editing = editing;
        self
    }
}

impl Default for MigrateConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("."),
            template_file: None,
            sdk_package_version: None,
            xproj_file: None,
            report_file: None,
            skip_project_references: false,
            report_format: ReportFormat::Text,
            skip_backup: false,
            colored: false,
            converter_program: DEFAULT_CONVERTER.to_string(),
            dotnet_program: DEFAULT_DOTNET.to_string(),
            solution_editing: SolutionEditing::Direct,
        }
    }
}
