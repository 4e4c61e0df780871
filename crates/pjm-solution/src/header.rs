//! Solution header block
//!
//! The header is kept as its source lines. Edits replace the one line that
//! carries the edited field and leave every other line alone.

use std::fmt::{self, Display, Formatter};

/// Marker line every solution file must carry
pub const FORMAT_MARKER: &str = "Microsoft Visual Studio Solution File, Format Version";

const TOOL_VERSION_KEY: &str = "VisualStudioVersion";
const MINIMUM_TOOL_VERSION_KEY: &str = "MinimumVisualStudioVersion";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Format,
    ProductDescription,
    ToolVersion,
    MinimumToolVersion,
}

/// Header metadata with its source lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolutionHeader {
    lines: Vec<String>,
    newline: String,
    modified: bool,
}

impl SolutionHeader {
    /// Header for a newly created solution file
    #[must_use]
    pub fn fresh(newline: &str, product: &str, tool: &str, minimum: &str) -> Self {
        let lines = vec![
            newline.to_string(),
            format!("{FORMAT_MARKER} 12.00{newline}"),
            format!("# {product}{newline}"),
            format!("{TOOL_VERSION_KEY} = {tool}{newline}"),
            format!("{MINIMUM_TOOL_VERSION_KEY} = {minimum}{newline}"),
        ];
        Self {
            lines,
            newline: newline.to_string(),
            modified: true,
        }
    }

    /// Build from the source lines preceding the first project or global block
    ///
    /// Returns `None` when the format marker line is missing.
    pub(crate) fn from_lines(lines: Vec<String>, newline: &str) -> Option<Self> {
        let header = Self {
            lines,
            newline: newline.to_string(),
            modified: false,
        };
        header.find(Field::Format)?;
        Some(header)
    }

    fn classify(&self, index: usize) -> Option<Field> {
        let line = self.lines[index].trim_start_matches('\u{feff}').trim();
        if line.starts_with(FORMAT_MARKER) {
            return Some(Field::Format);
        }
        if line.starts_with('#') {
            // only the first comment line carries the product description
            let first_comment = self.lines[..index]
                .iter()
                .all(|l| !l.trim_start_matches('\u{feff}').trim().starts_with('#'));
            return first_comment.then_some(Field::ProductDescription);
        }
        match line.split_once('=') {
            Some((key, _)) if key.trim() == TOOL_VERSION_KEY => Some(Field::ToolVersion),
            Some((key, _)) if key.trim() == MINIMUM_TOOL_VERSION_KEY => Some(Field::MinimumToolVersion),
            _ => None,
        }
    }

    fn find(&self, field: Field) -> Option<usize> {
        (0..self.lines.len()).find(|&i| self.classify(i) == Some(field))
    }

    fn value(&self, field: Field) -> Option<&str> {
        let line = self.lines[self.find(field)?].trim();
        match field {
            Field::ProductDescription => Some(line.trim_start_matches('#').trim()),
            Field::ToolVersion | Field::MinimumToolVersion => {
                line.split_once('=').map(|(_, value)| value.trim())
            }
            Field::Format => Some(line),
        }
    }

    fn set(&mut self, field: Field, rendered: String) {
        if let Some(index) = self.find(field) {
            let line = &self.lines[index];
            let terminator = &line[line.trim_end_matches(['\r', '\n']).len()..];
            let replacement = format!("{rendered}{terminator}");
            if *line == replacement {
                return;
            }
            self.lines[index] = replacement;
        } else {
            // insert after the closest preceding field that exists
            let preceding: &[Field] = match field {
                Field::Format | Field::ProductDescription => &[Field::Format],
                Field::ToolVersion => &[Field::ProductDescription, Field::Format],
                Field::MinimumToolVersion => &[
                    Field::ToolVersion,
                    Field::ProductDescription,
                    Field::Format,
                ],
            };
            let anchor = preceding.iter().find_map(|f| self.find(*f)).unwrap_or(0);
            if !self.lines[anchor].ends_with('\n') {
                self.lines[anchor].push_str(&self.newline);
            }
            let line = format!("{rendered}{}", self.newline);
            self.lines.insert(anchor + 1, line);
        }
        self.modified = true;
    }

    /// Product description (`# Visual Studio 14`)
    #[must_use]
    pub fn product_description(&self) -> Option<&str> {
        self.value(Field::ProductDescription)
    }

    /// Tool version string (`VisualStudioVersion`)
    #[must_use]
    pub fn tool_version(&self) -> Option<&str> {
        self.value(Field::ToolVersion)
    }

    /// Minimum tool version string (`MinimumVisualStudioVersion`)
    #[must_use]
    pub fn minimum_tool_version(&self) -> Option<&str> {
        self.value(Field::MinimumToolVersion)
    }

    /// Replace product description
    pub fn set_product_description(&mut self, value: &str) {
        self.set(Field::ProductDescription, format!("# {value}"));
    }

    /// Replace tool version
    pub fn set_tool_version(&mut self, value: &str) {
        self.set(Field::ToolVersion, format!("{TOOL_VERSION_KEY} = {value}"));
    }

    /// Replace minimum tool version
    pub fn set_minimum_tool_version(&mut self, value: &str) {
        self.set(
            Field::MinimumToolVersion,
            format!("{MINIMUM_TOOL_VERSION_KEY} = {value}"),
        );
    }

    /// Check if any header line was replaced or inserted
    #[inline]
    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub(crate) fn write_into(&self, out: &mut String) {
        for line in &self.lines {
            out.push_str(line);
        }
    }
}

/// Dotted numeric tool version (`14.0.25420.1`)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ToolVersion {
    components: Vec<u32>,
}

impl ToolVersion {
    /// Parse two to four dot-separated numeric components
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let components = text
            .trim()
            .split('.')
            .map(|part| part.parse::<u32>().ok())
            .collect::<Option<Vec<_>>>()?;
        (2..=4).contains(&components.len()).then_some(Self { components })
    }

    /// Major component
    #[inline]
    #[must_use]
    pub fn major(&self) -> u32 {
        self.components[0]
    }
}

impl Display for ToolVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.components.iter().map(u32::to_string).collect();
        f.write_str(&parts.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(text: &str) -> SolutionHeader {
        let lines = text.split_inclusive('\n').map(str::to_string).collect();
        SolutionHeader::from_lines(lines, "\r\n").unwrap()
    }

    fn text(header: &SolutionHeader) -> String {
        let mut out = String::new();
        header.write_into(&mut out);
        out
    }

    const VS14: &str = "\r\nMicrosoft Visual Studio Solution File, Format Version 12.00\r\n# Visual Studio 14\r\nVisualStudioVersion = 14.0.25420.1\r\nMinimumVisualStudioVersion = 10.0.40219.1\r\n";

    #[test]
    fn reads_fields() {
        let h = header(VS14);
        assert_eq!(h.product_description(), Some("Visual Studio 14"));
        assert_eq!(h.tool_version(), Some("14.0.25420.1"));
        assert_eq!(h.minimum_tool_version(), Some("10.0.40219.1"));
        assert!(!h.is_modified());
    }

    #[test]
    fn missing_format_line_is_rejected() {
        let lines = vec!["# Visual Studio 14\n".to_string()];
        assert!(SolutionHeader::from_lines(lines, "\n").is_none());
    }

    #[test]
    fn setting_same_value_keeps_header_untouched() {
        let mut h = header(VS14);
        h.set_tool_version("14.0.25420.1");
        assert!(!h.is_modified());
        assert_eq!(text(&h), VS14);
    }

    #[test]
    fn edit_replaces_only_that_line() {
        let mut h = header(VS14);
        h.set_tool_version("15.0.26114.2");
        assert_eq!(text(&h), VS14.replace("14.0.25420.1", "15.0.26114.2"));
    }

    #[test]
    fn missing_fields_are_inserted_in_order() {
        let mut h = header("Microsoft Visual Studio Solution File, Format Version 12.00\r\n# Visual Studio 2013\r\n");
        h.set_minimum_tool_version("10.0.40219.1");
        h.set_tool_version("15.0.26114.2");
        assert_eq!(
            text(&h),
            "Microsoft Visual Studio Solution File, Format Version 12.00\r\n# Visual Studio 2013\r\nVisualStudioVersion = 15.0.26114.2\r\nMinimumVisualStudioVersion = 10.0.40219.1\r\n"
        );
    }

    #[test]
    fn tool_version_parsing() {
        assert_eq!(ToolVersion::parse("14.0.25420.1").map(|v| v.major()), Some(14));
        assert_eq!(ToolVersion::parse(" 15.0 ").map(|v| v.major()), Some(15));
        assert!(ToolVersion::parse("15").is_none());
        assert!(ToolVersion::parse("1.2.3.4.5").is_none());
        assert!(ToolVersion::parse("fifteen.0").is_none());
        assert!(ToolVersion::parse("").is_none());
    }
}
