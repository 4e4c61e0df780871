//! Testing utilities for pjmigrate workspace
//!
//! Fixture solutions, on-disk workspace builders and in-process fakes of every
//! run capability.

#![allow(missing_docs)]

use pjm_core::{
    ConversionError, ConversionRequest, DirectManipulator, ManipulationError, ProjectConverter,
    SolutionManipulator, TemplateError, TemplateProject, TemplateProvisioner,
};
use pjm_report::ProjectMigrationReport;
use pjm_solution::{EditOutcome, SolutionFile};
use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub const CSHARP: &str = "{FAE04EC0-301F-11D3-BF4B-00C04F79EFBC}";
pub const DNX: &str = "{8BB2217D-0F2D-49D1-97BC-3654ED321F3B}";
pub const FOLDER: &str = "{2150E333-8FDC-42A3-9474-1A3956D46DE8}";

/// Header of a solution written by an old toolchain
pub const LEGACY_HEADER: &str = "\r\nMicrosoft Visual Studio Solution File, Format Version 12.00\r\n# Visual Studio 14\r\nVisualStudioVersion = 14.0.25420.1\r\nMinimumVisualStudioVersion = 10.0.40219.1\r\n";

/// Header of a solution already at the current toolchain
pub const CURRENT_HEADER: &str = "\r\nMicrosoft Visual Studio Solution File, Format Version 12.00\r\n# Visual Studio 15\r\nVisualStudioVersion = 15.0.26114.2\r\nMinimumVisualStudioVersion = 10.0.40219.1\r\n";

/// Solution with two xproj members and a solution items folder holding `global.json`
pub fn legacy_solution() -> String {
    format!(
        "{LEGACY_HEADER}\
Project(\"{DNX}\") = \"App\", \"src\\App\\App.xproj\", \"{{00000000-0000-0000-0000-00000000000A}}\"\r\n\
EndProject\r\n\
Project(\"{DNX}\") = \"Lib\", \"src\\Lib\\Lib.xproj\", \"{{00000000-0000-0000-0000-00000000000B}}\"\r\n\
EndProject\r\n\
Project(\"{FOLDER}\") = \"Solution Items\", \"Solution Items\", \"{{00000000-0000-0000-0000-0000000000F1}}\"\r\n\
\tProjectSection(SolutionItems) = preProject\r\n\
\t\tglobal.json = global.json\r\n\
\tEndProjectSection\r\n\
EndProject\r\n\
Global\r\n\
\tGlobalSection(SolutionConfigurationPlatforms) = preSolution\r\n\
\t\tDebug|Any CPU = Debug|Any CPU\r\n\
\t\tRelease|Any CPU = Release|Any CPU\r\n\
\tEndGlobalSection\r\n\
\tGlobalSection(ProjectConfigurationPlatforms) = postSolution\r\n\
\t\t{{00000000-0000-0000-0000-00000000000A}}.Debug|Any CPU.ActiveCfg = Debug|Any CPU\r\n\
\t\t{{00000000-0000-0000-0000-00000000000A}}.Debug|Any CPU.Build.0 = Debug|Any CPU\r\n\
\t\t{{00000000-0000-0000-0000-00000000000B}}.Debug|Any CPU.ActiveCfg = Debug|Any CPU\r\n\
\t\t{{00000000-0000-0000-0000-00000000000B}}.Debug|Any CPU.Build.0 = Debug|Any CPU\r\n\
\tEndGlobalSection\r\n\
\tGlobalSection(SolutionProperties) = preSolution\r\n\
\t\tHideSolutionNode = FALSE\r\n\
\tEndGlobalSection\r\n\
EndGlobal\r\n"
    )
}

/// Current-toolchain solution listing `src\A\A.csproj` only
pub fn solution_with_converted_a() -> String {
    format!(
        "{CURRENT_HEADER}\
Project(\"{CSHARP}\") = \"A\", \"src\\A\\A.csproj\", \"{{00000000-0000-0000-0000-0000000000A1}}\"\r\n\
EndProject\r\n\
Global\r\n\
\tGlobalSection(SolutionConfigurationPlatforms) = preSolution\r\n\
\t\tDebug|Any CPU = Debug|Any CPU\r\n\
\tEndGlobalSection\r\n\
EndGlobal\r\n"
    )
}

/// Temporary on-disk workspace
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn join(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.dir.path().join(relative)
    }

    pub fn read(&self, relative: impl AsRef<Path>) -> String {
        fs::read_to_string(self.join(relative)).unwrap()
    }

    pub fn exists(&self, relative: impl AsRef<Path>) -> bool {
        self.join(relative).exists()
    }

    pub fn solution(&self, relative: impl AsRef<Path>) -> SolutionFile {
        SolutionFile::read(self.join(relative)).unwrap()
    }
}

/// Builds a [`Workspace`] file by file
#[derive(Default)]
pub struct WorkspaceBuilder {
    files: Vec<(PathBuf, String)>,
}

impl WorkspaceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Any file
    pub fn file(mut self, relative: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.files.push((relative.into(), content.into()));
        self
    }

    /// `project.json` in `directory`
    pub fn project(self, directory: impl AsRef<Path>) -> Self {
        let path = directory.as_ref().join("project.json");
        self.file(path, "{\n  \"version\": \"1.0.0-*\"\n}\n")
    }

    /// `project.json` plus `<name>.xproj` in `directory`, named after the directory
    pub fn xproj_project(self, directory: impl AsRef<Path>) -> Self {
        let directory = directory.as_ref();
        let name = directory
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.project(directory)
            .file(directory.join(format!("{name}.xproj")), "<Project />\n")
    }

    pub fn global_json(self, content: impl Into<String>) -> Self {
        self.file("global.json", content)
    }

    pub fn solution(self, name: &str, content: impl Into<String>) -> Self {
        self.file(name, content)
    }

    pub fn build(self) -> Workspace {
        let dir = tempfile::tempdir().unwrap();
        for (relative, content) in self.files {
            let path = dir.path().join(relative);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(path, content).unwrap();
        }
        Workspace { dir }
    }
}

/// How the scripted converter answers for one project directory name
#[derive(Debug, Clone, Default)]
pub struct Script {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub dependencies: Vec<PathBuf>,
}

impl Script {
    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            errors: vec![error.into()],
            ..Self::default()
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn with_dependency(mut self, path: impl Into<PathBuf>) -> Self {
        self.dependencies.push(path.into());
        self
    }
}

/// Converter answering from a script keyed by project directory name
///
/// Successful conversions write `<name>.csproj` next to `project.json`.
/// Clones share the request log.
#[derive(Debug, Clone, Default)]
pub struct ScriptedConverter {
    scripts: HashMap<String, Script>,
    requests: Arc<Mutex<Vec<ConversionRequest>>>,
}

impl ScriptedConverter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(mut self, directory_name: &str, script: Script) -> Self {
        self.scripts.insert(directory_name.to_string(), script);
        self
    }

    pub fn failing(self, directory_name: &str, error: &str) -> Self {
        self.script(directory_name, Script::fail(error))
    }

    pub fn requests(&self) -> Vec<ConversionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl ProjectConverter for ScriptedConverter {
    fn convert(&self, request: &ConversionRequest) -> Result<ProjectMigrationReport, ConversionError> {
        if !request.template_project.is_file() {
            return Err(ConversionError::TemplateMissing(request.template_project.clone()));
        }
        self.requests.lock().unwrap().push(request.clone());

        let name = request.fallback_project_name();
        let script = self.scripts.get(&name).cloned().unwrap_or_default();
        let mut report = ProjectMigrationReport::new(name, request.project_directory.clone());
        for warning in script.warnings {
            report = report.with_warning(warning);
        }
        for error in script.errors {
            report = report.with_error(error);
        }
        for dependency in script.dependencies {
            report = report.with_dependency(dependency);
        }
        if report.succeeded() {
            fs::write(report.converted_project_path(), "<Project Sdk=\"Microsoft.NET.Sdk\" />\n")
                .map_err(|source| ConversionError::Spawn {
                    program: "scripted".to_string(),
                    source,
                })?;
        }
        Ok(report)
    }
}

/// Template provisioner handing out a fixed file and counting calls
#[derive(Debug, Clone)]
pub struct StaticTemplate {
    path: PathBuf,
    provisioned: Arc<AtomicUsize>,
}

impl StaticTemplate {
    /// Write a template project into `directory` and serve it
    pub fn in_dir(directory: &Path) -> Self {
        let path = directory.join("template.csproj");
        fs::write(&path, "<Project Sdk=\"Microsoft.NET.Sdk\" />\n").unwrap();
        Self::at(path)
    }

    /// Serve `path`, which may not exist
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            provisioned: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn provision_count(&self) -> usize {
        self.provisioned.load(Ordering::SeqCst)
    }
}

impl TemplateProvisioner for StaticTemplate {
    fn provision(&self) -> Result<TemplateProject, TemplateError> {
        self.provisioned.fetch_add(1, Ordering::SeqCst);
        TemplateProject::existing(self.path.clone())
    }
}

/// One recorded manipulation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManipulatorCall {
    Add(PathBuf),
    Remove(PathBuf),
}

/// Records every request and applies it in process
///
/// Clones share the call log.
#[derive(Debug, Clone, Default)]
pub struct RecordingManipulator {
    calls: Arc<Mutex<Vec<ManipulatorCall>>>,
}

impl RecordingManipulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<ManipulatorCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl SolutionManipulator for RecordingManipulator {
    fn add_project(&self, solution: &mut SolutionFile, project: &Path) -> Result<EditOutcome, ManipulationError> {
        self.calls.lock().unwrap().push(ManipulatorCall::Add(project.to_path_buf()));
        DirectManipulator.add_project(solution, project)
    }

    fn remove_project(&self, solution: &mut SolutionFile, project: &Path) -> Result<EditOutcome, ManipulationError> {
        self.calls.lock().unwrap().push(ManipulatorCall::Remove(project.to_path_buf()));
        DirectManipulator.remove_project(solution, project)
    }
}

/// Console sink whose clones share one buffer
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
