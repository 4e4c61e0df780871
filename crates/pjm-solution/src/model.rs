//! Solution model nodes
//!
//! Every node that comes from a parsed file keeps its source text. Mutating
//! accessors drop that text so the writer falls back to structured emission
//! for that node only.

use indexmap::IndexMap;
use std::borrow::Cow;
use std::fmt::{self, Display, Formatter};

/// Stable project identifier (`{UPPER-CASE-GUID}`)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProjectId(String);

impl ProjectId {
    /// Generate a fresh random identifier
    #[must_use]
    pub fn generate() -> Self {
        let uuid = uuid::Uuid::new_v4().hyphenated().to_string().to_uppercase();
        Self(format!("{{{uuid}}}"))
    }

    /// Wrap an identifier read from a file (upper-cased)
    #[must_use]
    pub fn parse(text: &str) -> Self {
        Self(text.trim().to_uppercase())
    }

    /// Identifier text
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check if a property key or value names this project
    ///
    /// Matches the bare identifier and the `ID.Config|Platform...` key form used
    /// by configuration sections, ignoring case.
    #[must_use]
    pub fn is_referenced_by(&self, text: &str) -> bool {
        let text = text.trim();
        if text.eq_ignore_ascii_case(&self.0) {
            return true;
        }
        text.len() > self.0.len()
            && text.as_bytes()[self.0.len()] == b'.'
            && text[..self.0.len()].eq_ignore_ascii_case(&self.0)
    }
}

impl Display for ProjectId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Project kind identifier, compared by equality only
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectTypeId(Cow<'static, str>);

impl ProjectTypeId {
    /// C# project (`.csproj`)
    pub const CSHARP: Self = Self(Cow::Borrowed("{FAE04EC0-301F-11D3-BF4B-00C04F79EFBC}"));
    /// Visual Basic project (`.vbproj`)
    pub const VISUAL_BASIC: Self = Self(Cow::Borrowed("{F184B08F-C81C-45F6-A57F-5ABD9991F28F}"));
    /// F# project (`.fsproj`)
    pub const FSHARP: Self = Self(Cow::Borrowed("{F2A71F9B-5D33-465A-A702-920D77279786}"));
    /// Legacy DNX project (`.xproj`)
    pub const DNX: Self = Self(Cow::Borrowed("{8BB2217D-0F2D-49D1-97BC-3654ED321F3B}"));
    /// Solution folder
    pub const SOLUTION_FOLDER: Self = Self(Cow::Borrowed("{2150E333-8FDC-42A3-9474-1A3956D46DE8}"));

    /// Wrap a type identifier read from a file (upper-cased)
    #[must_use]
    pub fn parse(text: &str) -> Self {
        Self(Cow::Owned(text.trim().to_uppercase()))
    }

    /// Infer the project kind from a project file extension
    #[must_use]
    pub fn for_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "csproj" => Some(Self::CSHARP),
            "vbproj" => Some(Self::VISUAL_BASIC),
            "fsproj" => Some(Self::FSHARP),
            "xproj" => Some(Self::DNX),
            _ => None,
        }
    }

    /// Check if this is the solution-folder kind
    #[inline]
    #[must_use]
    pub fn is_solution_folder(&self) -> bool {
        *self == Self::SOLUTION_FOLDER
    }

    /// Identifier text
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ProjectTypeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered string-to-string property map
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PropertySet {
    entries: IndexMap<String, String>,
}

impl PropertySet {
    /// Create empty set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Value for key
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Check if key is present
    #[inline]
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert or replace a value; a new key goes last
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.entries.insert(key.into(), value.into())
    }

    /// Remove a key, keeping the order of the others
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.shift_remove(key)
    }

    /// Keep only entries matching the predicate
    pub fn retain(&mut self, mut keep: impl FnMut(&str, &str) -> bool) {
        self.entries.retain(|k, v| keep(k, v));
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check for zero entries
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PropertySet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Load position of a section (`preProject`, `postSolution`, ...)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionPosition {
    PreProject,
    PostProject,
    PreSolution,
    PostSolution,
    /// Anything else, kept as written
    Other(String),
}

impl SectionPosition {
    /// Parse position keyword
    #[must_use]
    pub fn parse(text: &str) -> Self {
        match text {
            "preProject" => Self::PreProject,
            "postProject" => Self::PostProject,
            "preSolution" => Self::PreSolution,
            "postSolution" => Self::PostSolution,
            other => Self::Other(other.to_string()),
        }
    }

    /// Keyword as written in files
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::PreProject => "preProject",
            Self::PostProject => "postProject",
            Self::PreSolution => "preSolution",
            Self::PostSolution => "postSolution",
            Self::Other(text) => text,
        }
    }
}

/// Named property section inside a project entry or the global block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    name: String,
    position: SectionPosition,
    properties: PropertySet,
    pub(crate) raw: Option<String>,
    pub(crate) leading_trivia: String,
}

impl Section {
    /// Create a section with no source text
    #[must_use]
    pub fn new(name: impl Into<String>, position: SectionPosition) -> Self {
        Self {
            name: name.into(),
            position,
            properties: PropertySet::new(),
            raw: None,
            leading_trivia: String::new(),
        }
    }

    pub(crate) fn parsed(
        name: String,
        position: SectionPosition,
        properties: PropertySet,
        raw: String,
        leading_trivia: String,
    ) -> Self {
        Self {
            name,
            position,
            properties,
            raw: Some(raw),
            leading_trivia,
        }
    }

    /// Section name (`SolutionItems`, `NestedProjects`, ...)
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Load position
    #[inline]
    #[must_use]
    pub fn position(&self) -> &SectionPosition {
        &self.position
    }

    /// Properties
    #[inline]
    #[must_use]
    pub fn properties(&self) -> &PropertySet {
        &self.properties
    }

    /// Mutable properties; the section is re-emitted from the model afterwards
    #[inline]
    pub fn properties_mut(&mut self) -> &mut PropertySet {
        self.raw = None;
        &mut self.properties
    }

    /// Remove properties matching the predicate, returning how many went
    ///
    /// The section keeps its source text when nothing matches.
    pub fn remove_properties_where(&mut self, mut matches: impl FnMut(&str, &str) -> bool) -> usize {
        let doomed = self.properties.iter().filter(|(k, v)| matches(k, v)).count();
        if doomed > 0 {
            self.properties_mut().retain(|k, v| !matches(k, v));
        }
        doomed
    }

    /// Check for zero properties
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Check if the section will be written from the model
    #[inline]
    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.raw.is_none()
    }
}

/// One member-project record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectEntry {
    id: ProjectId,
    type_id: ProjectTypeId,
    name: String,
    relative_file_path: String,
    pub(crate) sections: Vec<Section>,
    pub(crate) raw_open: Option<String>,
    pub(crate) raw_close: Option<String>,
    pub(crate) leading_trivia: String,
    pub(crate) trailing_trivia: String,
}

impl ProjectEntry {
    /// Create an entry with no source text
    #[must_use]
    pub fn new(
        id: ProjectId,
        type_id: ProjectTypeId,
        name: impl Into<String>,
        relative_file_path: impl Into<String>,
    ) -> Self {
        Self {
            id,
            type_id,
            name: name.into(),
            relative_file_path: relative_file_path.into(),
            sections: Vec::new(),
            raw_open: None,
            raw_close: None,
            leading_trivia: String::new(),
            trailing_trivia: String::new(),
        }
    }

    pub(crate) fn with_source(mut self, raw_open: String, leading_trivia: String) -> Self {
        self.raw_open = Some(raw_open);
        self.leading_trivia = leading_trivia;
        self
    }

    /// Identifier
    #[inline]
    #[must_use]
    pub fn id(&self) -> &ProjectId {
        &self.id
    }

    /// Project kind
    #[inline]
    #[must_use]
    pub fn type_id(&self) -> &ProjectTypeId {
        &self.type_id
    }

    /// Display name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Member path relative to the solution directory, as stored
    #[inline]
    #[must_use]
    pub fn relative_file_path(&self) -> &str {
        &self.relative_file_path
    }

    /// Replace the stored member path
    pub fn set_relative_file_path(&mut self, path: impl Into<String>) {
        self.relative_file_path = path.into();
        self.raw_open = None;
    }

    /// Check if this entry is a solution folder
    #[inline]
    #[must_use]
    pub fn is_solution_folder(&self) -> bool {
        self.type_id.is_solution_folder()
    }

    /// Sections in file order
    #[inline]
    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Mutable access to all sections
    pub fn sections_mut(&mut self) -> impl Iterator<Item = &mut Section> {
        self.sections.iter_mut()
    }

    /// Section by name
    #[must_use]
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// Mutable section by name
    pub fn section_mut(&mut self, name: &str) -> Option<&mut Section> {
        self.sections.iter_mut().find(|s| s.name == name)
    }

    /// Append a section
    pub fn push_section(&mut self, section: Section) {
        self.sections.push(section);
    }

    /// Remove a section by name
    pub fn remove_section(&mut self, name: &str) -> Option<Section> {
        let index = self.sections.iter().position(|s| s.name == name)?;
        Some(self.sections.remove(index))
    }

    /// Drop every section left without properties
    pub fn remove_empty_sections(&mut self) -> usize {
        let before = self.sections.len();
        self.sections.retain(|s| !s.is_empty());
        before - self.sections.len()
    }

    /// Check if the entry will be written entirely from source text
    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.raw_open.is_none() || self.sections.iter().any(Section::is_modified)
    }
}
