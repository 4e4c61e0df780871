//! Solution file: load, query, store

use crate::error::{SolutionError, SolutionResult};
use crate::header::SolutionHeader;
use crate::model::{ProjectEntry, ProjectId, Section};
use crate::path::{normalize, resolve_member, MemberPath};
use std::path::{Path, PathBuf};

/// Product description written into new solution files
pub const CURRENT_PRODUCT_DESCRIPTION: &str = "Visual Studio 15";
/// Tool version written into new solution files
pub const CURRENT_TOOL_VERSION: &str = "15.0.26114.2";
/// Minimum tool version written into new solution files
pub const CURRENT_MINIMUM_TOOL_VERSION: &str = "10.0.40219.1";

/// Line terminator used for structured emission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    /// `\r\n`
    #[default]
    CrLf,
    /// `\n`
    Lf,
}

impl LineEnding {
    /// Terminator text
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CrLf => "\r\n",
            Self::Lf => "\n",
        }
    }

    /// First terminator found in text, or the default
    #[must_use]
    pub fn detect(text: &str) -> Self {
        match text.find('\n') {
            Some(i) if i > 0 && text.as_bytes()[i - 1] == b'\r' => Self::CrLf,
            Some(_) => Self::Lf,
            None => Self::default(),
        }
    }
}

/// The `Global` ... `EndGlobal` block
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GlobalBlock {
    pub(crate) sections: Vec<Section>,
    pub(crate) raw_open: Option<String>,
    pub(crate) raw_close: Option<String>,
    pub(crate) leading_trivia: String,
    pub(crate) trailing_trivia: String,
}

/// Parsed solution file
#[derive(Debug, Clone)]
pub struct SolutionFile {
    path: PathBuf,
    base_directory: PathBuf,
    pub(crate) line_ending: LineEnding,
    pub(crate) header: SolutionHeader,
    pub(crate) projects: Vec<ProjectEntry>,
    pub(crate) global: Option<GlobalBlock>,
    pub(crate) trailer: String,
}

impl SolutionFile {
    pub(crate) fn from_parts(
        path: &Path,
        line_ending: LineEnding,
        header: SolutionHeader,
        projects: Vec<ProjectEntry>,
        global: Option<GlobalBlock>,
        trailer: String,
    ) -> Self {
        let path = normalize(path);
        let base_directory = path
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        Self {
            path,
            base_directory,
            line_ending,
            header,
            projects,
            global,
            trailer,
        }
    }

    /// Create an empty solution file (not yet written)
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        let line_ending = LineEnding::default();
        let header = SolutionHeader::fresh(
            line_ending.as_str(),
            CURRENT_PRODUCT_DESCRIPTION,
            CURRENT_TOOL_VERSION,
            CURRENT_MINIMUM_TOOL_VERSION,
        );
        Self::from_parts(
            path.as_ref(),
            line_ending,
            header,
            Vec::new(),
            Some(GlobalBlock::default()),
            String::new(),
        )
    }

    /// Read and parse a solution file
    ///
    /// # Errors
    /// Returns error if the file is missing, unreadable or malformed
    pub fn read(path: impl AsRef<Path>) -> SolutionResult<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(SolutionError::NotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path).map_err(|e| SolutionError::io_error(path, e))?;
        Self::parse(&text, path)
    }

    /// Parse solution text as if read from `path`
    ///
    /// # Errors
    /// Returns error if the text does not follow the solution grammar
    pub fn parse(text: &str, path: impl AsRef<Path>) -> SolutionResult<Self> {
        crate::parser::parse(text, path.as_ref())
    }

    /// Write back to the path the file was read from
    ///
    /// # Errors
    /// Returns error on IO failure
    pub fn write(&self) -> SolutionResult<()> {
        self.write_to(&self.path)
    }

    /// Write to another path
    ///
    /// # Errors
    /// Returns error on IO failure
    pub fn write_to(&self, path: impl AsRef<Path>) -> SolutionResult<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_text()).map_err(|e| SolutionError::io_error(path, e))
    }

    /// Serialise to text
    #[must_use]
    pub fn to_text(&self) -> String {
        crate::writer::render(self)
    }

    /// Path of the solution file
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory member paths are relative to
    #[inline]
    #[must_use]
    pub fn base_directory(&self) -> &Path {
        &self.base_directory
    }

    /// Line terminator used for new lines
    #[inline]
    #[must_use]
    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    /// Header metadata
    #[inline]
    #[must_use]
    pub fn header(&self) -> &SolutionHeader {
        &self.header
    }

    /// Mutable header metadata
    #[inline]
    pub fn header_mut(&mut self) -> &mut SolutionHeader {
        &mut self.header
    }

    /// Project entries in file order
    #[inline]
    #[must_use]
    pub fn projects(&self) -> &[ProjectEntry] {
        &self.projects
    }

    /// Mutable project entries
    pub fn projects_mut(&mut self) -> impl Iterator<Item = &mut ProjectEntry> {
        self.projects.iter_mut()
    }

    /// Entry by identifier
    #[must_use]
    pub fn project(&self, id: &ProjectId) -> Option<&ProjectEntry> {
        self.projects.iter().find(|p| p.id() == id)
    }

    /// Absolute location of an entry's member file
    #[must_use]
    pub fn resolve(&self, entry: &ProjectEntry) -> PathBuf {
        resolve_member(&self.base_directory, entry.relative_file_path())
    }

    /// Resolve a path given on the command line or by a report against the base directory
    #[must_use]
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        MemberPath::from_path(&self.base_directory)
            .join(&MemberPath::from_path(path))
            .to_path_buf()
    }

    /// First non-folder entry resolving to `path`
    #[must_use]
    pub fn find_project_by_path(&self, path: &Path) -> Option<&ProjectEntry> {
        let target = self.resolve_path(path);
        self.projects
            .iter()
            .filter(|p| !p.is_solution_folder())
            .find(|p| self.resolve(p) == target)
    }

    /// Check if any entry resolves to `path`
    #[inline]
    #[must_use]
    pub fn contains_project(&self, path: &Path) -> bool {
        self.find_project_by_path(path).is_some()
    }

    /// Append an entry
    ///
    /// # Errors
    /// Returns error if the identifier is already used
    pub fn push_project(&mut self, entry: ProjectEntry) -> SolutionResult<()> {
        if self.project(entry.id()).is_some() {
            return Err(SolutionError::DuplicateProjectId {
                path: self.path.clone(),
                id: entry.id().to_string(),
            });
        }
        self.projects.push(entry);
        Ok(())
    }

    /// Remove entries matching the predicate, returning them in file order
    ///
    /// Comments and blank lines above a removed entry move to the node that
    /// follows it.
    pub fn remove_projects_where(
        &mut self,
        mut matches: impl FnMut(&Self, &ProjectEntry) -> bool,
    ) -> Vec<ProjectEntry> {
        let this: &Self = self;
        let doomed: Vec<bool> = this.projects.iter().map(|p| matches(this, p)).collect();
        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(self.projects.len());
        let mut orphaned = String::new();
        for (mut entry, remove) in std::mem::take(&mut self.projects).into_iter().zip(doomed) {
            if remove {
                orphaned.push_str(&std::mem::take(&mut entry.leading_trivia));
                removed.push(entry);
            } else {
                if !orphaned.is_empty() {
                    entry.leading_trivia.insert_str(0, &std::mem::take(&mut orphaned));
                }
                kept.push(entry);
            }
        }
        self.projects = kept;
        if !orphaned.is_empty() {
            match &mut self.global {
                Some(global) => global.leading_trivia.insert_str(0, &orphaned),
                None => self.trailer.insert_str(0, &orphaned),
            }
        }
        removed
    }

    /// Global sections in file order
    #[must_use]
    pub fn global_sections(&self) -> &[Section] {
        match &self.global {
            Some(global) => &global.sections,
            None => &[],
        }
    }

    /// Mutable global sections
    pub fn global_sections_mut(&mut self) -> impl Iterator<Item = &mut Section> {
        self.global.iter_mut().flat_map(|g| g.sections.iter_mut())
    }

    /// Global section by name
    #[must_use]
    pub fn global_section(&self, name: &str) -> Option<&Section> {
        self.global_sections().iter().find(|s| s.name() == name)
    }

    /// Mutable global section by name
    pub fn global_section_mut(&mut self, name: &str) -> Option<&mut Section> {
        self.global
            .as_mut()?
            .sections
            .iter_mut()
            .find(|s| s.name() == name)
    }

    /// Append a global section, creating the global block if needed
    pub fn push_global_section(&mut self, section: Section) -> &mut Section {
        let global = self.global.get_or_insert_with(GlobalBlock::default);
        global.sections.push(section);
        let last = global.sections.len() - 1;
        &mut global.sections[last]
    }

    /// Remove a global section by name
    pub fn remove_global_section(&mut self, name: &str) -> Option<Section> {
        let global = self.global.as_mut()?;
        let index = global.sections.iter().position(|s| s.name() == name)?;
        Some(global.sections.remove(index))
    }

    /// Drop global sections that are empty and were edited
    pub(crate) fn remove_emptied_global_sections(&mut self) {
        if let Some(global) = self.global.as_mut() {
            global.sections.retain(|s| !(s.is_modified() && s.is_empty()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ProjectTypeId, SectionPosition};

    #[test]
    fn line_ending_detection() {
        assert_eq!(LineEnding::detect("a\r\nb\n"), LineEnding::CrLf);
        assert_eq!(LineEnding::detect("a\nb\r\n"), LineEnding::Lf);
        assert_eq!(LineEnding::detect("no newline"), LineEnding::CrLf);
    }

    #[test]
    fn new_file_has_current_header() {
        let sln = SolutionFile::new("/work/App.sln");
        assert_eq!(sln.base_directory(), Path::new("/work"));
        assert_eq!(sln.header().tool_version(), Some(CURRENT_TOOL_VERSION));
        assert!(sln.to_text().contains("Global\r\nEndGlobal\r\n"));
    }

    #[test]
    fn find_by_path_ignores_separator_style() {
        let mut sln = SolutionFile::new("/work/App.sln");
        sln.push_project(ProjectEntry::new(
            ProjectId::generate(),
            ProjectTypeId::CSHARP,
            "Lib",
            "src\\Lib\\Lib.csproj",
        ))
        .unwrap();
        assert!(sln.contains_project(Path::new("/work/src/Lib/Lib.csproj")));
        assert!(sln.contains_project(Path::new("src/Lib/./Lib.csproj")));
        assert!(!sln.contains_project(Path::new("/work/src/Lib/Other.csproj")));
    }

    #[test]
    fn duplicate_identifier_is_rejected() {
        let mut sln = SolutionFile::new("/work/App.sln");
        let id = ProjectId::generate();
        sln.push_project(ProjectEntry::new(id.clone(), ProjectTypeId::CSHARP, "A", "A.csproj"))
            .unwrap();
        let err = sln
            .push_project(ProjectEntry::new(id, ProjectTypeId::CSHARP, "B", "B.csproj"))
            .unwrap_err();
        assert!(matches!(err, SolutionError::DuplicateProjectId { .. }));
    }

    #[test]
    fn global_section_lifecycle() {
        let mut sln = SolutionFile::new("/work/App.sln");
        sln.push_global_section(Section::new("NestedProjects", SectionPosition::PreSolution))
            .properties_mut()
            .insert("{A}", "{B}");
        assert_eq!(sln.global_section("NestedProjects").map(Section::is_empty), Some(false));
        assert!(sln.remove_global_section("NestedProjects").is_some());
        assert!(sln.global_section("NestedProjects").is_none());
    }

    #[test]
    fn read_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = SolutionFile::read(dir.path().join("nope.sln")).unwrap_err();
        assert!(matches!(err, SolutionError::NotFound(_)));
    }
}
