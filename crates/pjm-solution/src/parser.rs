//! Solution text parser
//!
//! Single forward pass over the lines. Each node records the exact text it was
//! built from so that [`crate::writer`] can reproduce untouched nodes verbatim.

use crate::error::{SolutionError, SolutionResult};
use crate::file::{GlobalBlock, LineEnding, SolutionFile};
use crate::header::SolutionHeader;
use crate::model::{ProjectEntry, ProjectId, ProjectTypeId, PropertySet, Section, SectionPosition};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

static PROJECT_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^Project\(\s*"(?P<type>[^"]*)"\s*\)\s*=\s*"(?P<name>[^"]*)"\s*,\s*"(?P<path>[^"]*)"\s*,\s*"(?P<id>[^"]*)"$"#,
    )
    .expect("project line pattern is valid")
});

static SECTION_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<kind>ProjectSection|GlobalSection)\((?P<name>[^)]*)\)\s*=\s*(?P<position>\S+)$")
        .expect("section line pattern is valid")
});

/// Parse solution text read from `path`
pub(crate) fn parse(text: &str, path: &Path) -> SolutionResult<SolutionFile> {
    Parser::new(text, path).run()
}

struct Line<'a> {
    number: usize,
    raw: &'a str,
    /// Content without surrounding whitespace or byte-order mark
    content: &'a str,
}

struct Parser<'a> {
    path: PathBuf,
    line_ending: LineEnding,
    lines: std::iter::Peekable<Box<dyn Iterator<Item = Line<'a>> + 'a>>,
    last_line: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str, path: &Path) -> Self {
        let lines: Box<dyn Iterator<Item = Line<'a>> + 'a> =
            Box::new(text.split_inclusive('\n').enumerate().map(|(i, raw)| Line {
                number: i + 1,
                raw,
                content: raw.trim_start_matches('\u{feff}').trim(),
            }));
        Self {
            path: path.to_path_buf(),
            line_ending: LineEnding::detect(text),
            lines: lines.peekable(),
            last_line: 0,
        }
    }

    fn next_line(&mut self) -> Option<Line<'a>> {
        let line = self.lines.next()?;
        self.last_line = line.number;
        Some(line)
    }

    fn error(&self, line: usize, message: impl Into<String>) -> SolutionError {
        SolutionError::malformed(&self.path, line, message)
    }

    fn run(mut self) -> SolutionResult<SolutionFile> {
        let header = self.header()?;
        let mut projects: Vec<ProjectEntry> = Vec::new();
        let mut seen_ids = HashSet::new();
        let mut global: Option<GlobalBlock> = None;
        let mut trivia = String::new();

        while let Some(line) = self.next_line() {
            if line.content.starts_with("Project(") {
                if global.is_some() {
                    return Err(self.error(line.number, "project entry after Global block"));
                }
                let entry = self.project(&line, std::mem::take(&mut trivia))?;
                if !seen_ids.insert(entry.id().clone()) {
                    return Err(SolutionError::DuplicateProjectId {
                        path: self.path.clone(),
                        id: entry.id().to_string(),
                    });
                }
                projects.push(entry);
            } else if line.content == "Global" {
                if global.is_some() {
                    return Err(self.error(line.number, "second Global block"));
                }
                global = Some(self.global(&line, std::mem::take(&mut trivia))?);
            } else {
                trivia.push_str(line.raw);
            }
        }

        Ok(SolutionFile::from_parts(
            &self.path,
            self.line_ending,
            header,
            projects,
            global,
            trivia,
        ))
    }

    fn header(&mut self) -> SolutionResult<SolutionHeader> {
        let mut lines = Vec::new();
        while let Some(line) = self.lines.peek() {
            if line.content.starts_with("Project(") || line.content == "Global" {
                break;
            }
            if let Some(line) = self.next_line() {
                lines.push(line.raw.to_string());
            }
        }
        SolutionHeader::from_lines(lines, self.line_ending.as_str())
            .ok_or_else(|| self.error(1, "missing solution format version line"))
    }

    fn project(&mut self, open: &Line<'a>, leading_trivia: String) -> SolutionResult<ProjectEntry> {
        let caps = PROJECT_LINE
            .captures(open.content)
            .ok_or_else(|| self.error(open.number, "invalid Project line"))?;
        let mut entry = ProjectEntry::new(
            ProjectId::parse(&caps["id"]),
            ProjectTypeId::parse(&caps["type"]),
            &caps["name"],
            &caps["path"],
        )
        .with_source(open.raw.to_string(), leading_trivia);

        let mut trivia = String::new();
        loop {
            let Some(line) = self.next_line() else {
                return Err(self.error(self.last_line, "expected EndProject"));
            };
            if line.content == "EndProject" {
                entry.trailing_trivia = trivia;
                entry.raw_close = Some(line.raw.to_string());
                return Ok(entry);
            }
            if line.content.starts_with("ProjectSection(") {
                let section = self.section(&line, "EndProjectSection", std::mem::take(&mut trivia))?;
                entry.push_section(section);
            } else if line.content.starts_with("Project(") || line.content == "Global" {
                return Err(self.error(line.number, "expected EndProject"));
            } else {
                trivia.push_str(line.raw);
            }
        }
    }

    fn global(&mut self, open: &Line<'a>, leading_trivia: String) -> SolutionResult<GlobalBlock> {
        let mut block = GlobalBlock {
            raw_open: Some(open.raw.to_string()),
            leading_trivia,
            ..GlobalBlock::default()
        };
        let mut trivia = String::new();
        loop {
            let Some(line) = self.next_line() else {
                return Err(self.error(self.last_line, "expected EndGlobal"));
            };
            if line.content == "EndGlobal" {
                block.trailing_trivia = trivia;
                block.raw_close = Some(line.raw.to_string());
                return Ok(block);
            }
            if line.content.starts_with("GlobalSection(") {
                let section = self.section(&line, "EndGlobalSection", std::mem::take(&mut trivia))?;
                block.sections.push(section);
            } else {
                trivia.push_str(line.raw);
            }
        }
    }

    fn section(
        &mut self,
        open: &Line<'a>,
        terminator: &str,
        leading_trivia: String,
    ) -> SolutionResult<Section> {
        let caps = SECTION_LINE
            .captures(open.content)
            .ok_or_else(|| self.error(open.number, "invalid section line"))?;
        let mut raw = open.raw.to_string();
        let mut properties = PropertySet::new();
        loop {
            let Some(line) = self.next_line() else {
                return Err(self.error(self.last_line, format!("expected {terminator}")));
            };
            raw.push_str(line.raw);
            if line.content == terminator {
                break;
            }
            if line.content.is_empty() {
                continue;
            }
            let (key, value) = line
                .content
                .split_once('=')
                .ok_or_else(|| self.error(line.number, "property line without '='"))?;
            if let Some(previous) = properties.insert(key.trim(), value.trim()) {
                tracing::warn!(
                    "{}:{}: duplicate key `{}` in section {}, dropping value `{}`",
                    self.path.display(),
                    line.number,
                    key.trim(),
                    &caps["name"],
                    previous
                );
            }
        }
        Ok(Section::parsed(
            caps["name"].to_string(),
            SectionPosition::parse(&caps["position"]),
            properties,
            raw,
            leading_trivia,
        ))
    }
}
