//! Solution member add/remove capability

use crate::error::ManipulationError;
use pjm_solution::{EditOutcome, SolutionFile};
use std::ffi::OsString;
use std::path::Path;
use std::process::Command;

/// Adds and removes member projects of a solution
///
/// Both operations are idempotent.
pub trait SolutionManipulator {
    /// Add `project` unless already listed
    ///
    /// # Errors
    /// Returns error if the edit cannot be applied
    fn add_project(&self, solution: &mut SolutionFile, project: &Path) -> Result<EditOutcome, ManipulationError>;

    /// Remove `project` if listed
    ///
    /// # Errors
    /// Returns error if the edit cannot be applied
    fn remove_project(&self, solution: &mut SolutionFile, project: &Path) -> Result<EditOutcome, ManipulationError>;

    /// Check if edits go through the file on disk
    ///
    /// When true the caller persists pending model edits before delegating
    /// and the model is re-read after every edit.
    fn writes_through(&self) -> bool {
        false
    }
}

/// Edits the parsed model in process
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectManipulator;

impl SolutionManipulator for DirectManipulator {
    fn add_project(&self, solution: &mut SolutionFile, project: &Path) -> Result<EditOutcome, ManipulationError> {
        Ok(solution.add_project(project)?)
    }

    fn remove_project(&self, solution: &mut SolutionFile, project: &Path) -> Result<EditOutcome, ManipulationError> {
        Ok(solution.remove_project(project))
    }
}

/// Delegates to `dotnet sln <solution> add|remove <project>`
#[derive(Debug, Clone)]
pub struct DotnetSlnManipulator {
    program: String,
    leading_args: Vec<OsString>,
}

impl DotnetSlnManipulator {
    /// Create manipulator running `program`
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

    fn run(
        &self,
        operation: &'static str,
        solution: &mut SolutionFile,
        project: &Path,
    ) -> Result<EditOutcome, ManipulationError> {
        tracing::debug!("Running {} sln {} for {}", self.program, operation, project.display());
        let status = Command::new(&self.program)
            .args(&self.leading_args)
            .arg("sln")
            .arg(solution.path())
            .arg(operation)
            .arg(project)
            .status()
            .map_err(|source| ManipulationError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        if !status.success() {
            return Err(ManipulationError::OperationFailed {
                operation,
                project: project.to_path_buf(),
                status,
            });
        }
        *solution = SolutionFile::read(solution.path())?;
        Ok(EditOutcome::Applied)
    }
}

impl SolutionManipulator for DotnetSlnManipulator {
    fn add_project(&self, solution: &mut SolutionFile, project: &Path) -> Result<EditOutcome, ManipulationError> {
        if solution.contains_project(project) {
            return Ok(EditOutcome::Unchanged);
        }
        self.run("add", solution, project)
    }

    fn remove_project(&self, solution: &mut SolutionFile, project: &Path) -> Result<EditOutcome, ManipulationError> {
        if !solution.contains_project(project) {
            return Ok(EditOutcome::Unchanged);
        }
        self.run("remove", solution, project)
    }

    fn writes_through(&self) -> bool {
        true
    }
}
