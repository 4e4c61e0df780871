//! Template project provisioning
//!
//! A [`TemplateProject`] owns the scratch directory it lives in (if any); the
//! directory is deleted when the value is dropped, on every exit path.

use crate::error::TemplateError;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Name of the scaffolded template project
const TEMPLATE_PROJECT_NAME: &str = "p";

/// Template project file used as the starting point of every conversion
#[derive(Debug)]
pub struct TemplateProject {
    path: PathBuf,
    _scratch: Option<TempDir>,
}

impl TemplateProject {
    /// Use an existing template file
    ///
    /// # Errors
    /// Returns error if the file does not exist
    pub fn existing(path: impl Into<PathBuf>) -> Result<Self, TemplateError> {
        let path = path.into();
        if !path.is_file() {
            return Err(TemplateError::Missing(path));
        }
        Ok(Self {
            path,
            _scratch: None,
        })
    }

    /// Template file path
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Produces a template project for the run
pub trait TemplateProvisioner {
    /// Provision the template
    ///
    /// # Errors
    /// Returns error if the template cannot be produced
    fn provision(&self) -> Result<TemplateProject, TemplateError>;
}

/// Template named by the caller
#[derive(Debug, Clone)]
pub struct ExistingTemplate(pub PathBuf);

impl TemplateProvisioner for ExistingTemplate {
    fn provision(&self) -> Result<TemplateProject, TemplateError> {
        TemplateProject::existing(self.0.clone())
    }
}

/// Template scaffolded with `dotnet new console` into a scratch directory
#[derive(Debug, Clone)]
pub struct DotnetNewTemplate {
    program: String,
    leading_args: Vec<OsString>,
}

impl DotnetNewTemplate {
    /// Create provisioner running `program`
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
        }
    }

    /// Prepend a fixed argument to the invocation
    #[must_use]
    pub fn with_arg(mut self, arg: impl Into<OsString>) -> Self {
        self.leading_args.push(arg.into());
        self
    }
}

impl TemplateProvisioner for DotnetNewTemplate {
    fn provision(&self) -> Result<TemplateProject, TemplateError> {
        let scratch = tempfile::Builder::new()
            .prefix("pjmigrate-template-")
            .tempdir()
            .map_err(TemplateError::Scratch)?;
        let project_dir = scratch.path().join(TEMPLATE_PROJECT_NAME);
        std::fs::create_dir_all(&project_dir).map_err(TemplateError::Scratch)?;

        tracing::debug!("Scaffolding template project in {}", project_dir.display());
        let output = Command::new(&self.program)
            .args(&self.leading_args)
            .args(["new", "console", "-o"])
            .arg(&project_dir)
            .arg("--debug:ephemeral-hive")
            .output()
            .map_err(|source| TemplateError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        if !output.status.success() {
            return Err(TemplateError::CommandFailed {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let path = project_dir.join(format!("{TEMPLATE_PROJECT_NAME}.csproj"));
        if !path.is_file() {
            return Err(TemplateError::Missing(path));
        }
        Ok(TemplateProject {
            path,
            _scratch: Some(scratch),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn existing_template_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("t.csproj");
        assert!(matches!(
            ExistingTemplate(missing.clone()).provision(),
            Err(TemplateError::Missing(p)) if p == missing
        ));

        std::fs::write(&missing, "<Project />").unwrap();
        let template = ExistingTemplate(missing.clone()).provision().unwrap();
        assert_eq!(template.path(), missing);
        drop(template);
        // caller-owned templates survive the run
        assert!(missing.is_file());
    }

    #[test]
    fn spawn_failure_is_reported() {
        let err = DotnetNewTemplate::new("/nonexistent/pjmigrate-test-dotnet")
            .provision()
            .unwrap_err();
        assert!(matches!(err, TemplateError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn scaffolded_template_is_removed_on_drop() {
        let scripts = tempfile::tempdir().unwrap();
        let script = scripts.path().join("dotnet.sh");
        // args: new console -o <dir> --debug:ephemeral-hive
        std::fs::write(&script, "printf '<Project />' > \"$4/p.csproj\"\n").unwrap();

        let template = DotnetNewTemplate::new("sh").with_arg(&script).provision().unwrap();
        let path = template.path().to_path_buf();
        assert!(path.is_file());
        assert_eq!(path.file_name().unwrap(), "p.csproj");
        drop(template);
        assert!(!path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn failed_scaffolding_carries_stderr() {
        let scripts = tempfile::tempdir().unwrap();
        let script = scripts.path().join("dotnet.sh");
        std::fs::write(&script, "echo 'template not installed' >&2\nexit 2\n").unwrap();

        let err = DotnetNewTemplate::new("sh").with_arg(&script).provision().unwrap_err();
        assert!(matches!(
            err,
            TemplateError::CommandFailed { ref stderr, .. } if stderr == "template not installed"
        ));
    }

    #[cfg(unix)]
    #[test]
    fn successful_run_without_project_file_is_missing() {
        let scripts = tempfile::tempdir().unwrap();
        let script = scripts.path().join("dotnet.sh");
        std::fs::write(&script, "exit 0\n").unwrap();

        let err = DotnetNewTemplate::new("sh").with_arg(&script).provision().unwrap_err();
        assert!(matches!(err, TemplateError::Missing(_)));
    }
}
