//! Report rendering (console text, report file text, JSON)

use crate::error::{ReportError, ReportResult};
use crate::report::{MigrationReport, ProjectMigrationReport};
use owo_colors::OwoColorize;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Next-steps text printed after the console report
pub const NEXT_STEPS: &str = "Migration done. Next steps:\n\
  1. Restore packages for the converted projects.\n\
  2. Build and run the tests to confirm the converted projects behave as before.\n\
  3. Review any warnings above; they point at settings that were not carried over.\n\
  4. Once satisfied, delete the backup directory.";

/// Report file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Human readable text
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
}

enum Tone {
    Warning,
    Failure,
    Success,
}

fn paint(text: &str, tone: Tone, colored: bool) -> String {
    if !colored {
        return text.to_string();
    }
    match tone {
        Tone::Warning => text.yellow().to_string(),
        Tone::Failure => text.red().to_string(),
        Tone::Success => text.green().to_string(),
    }
}

fn project_lines(project: &ProjectMigrationReport, colored: bool) -> Vec<String> {
    let dir = project.project_directory.display();
    let mut lines: Vec<String> = project
        .warnings
        .iter()
        .map(|w| paint(w, Tone::Warning, colored))
        .collect();
    if project.succeeded() {
        let line = format!("Project {} migration succeeded ({dir})", project.project_name);
        lines.push(paint(&line, Tone::Success, colored));
    } else {
        let line = format!("Project migration failed ({}, {dir})", project.project_name);
        lines.push(paint(&line, Tone::Failure, colored));
        lines.extend(project.errors.iter().map(|e| paint(e, Tone::Failure, colored)));
    }
    lines
}

fn summary_lines(report: &MigrationReport) -> [String; 4] {
    [
        "Summary".to_string(),
        format!("Total Projects: {}", report.total_count()),
        format!("Succeeded Projects: {}", report.succeeded_count()),
        format!("Failed Projects: {}", report.failed_count()),
    ]
}

/// Render the report as text
#[must_use]
pub fn render_text(report: &MigrationReport, colored: bool) -> String {
    let mut out = String::new();
    for project in report {
        for line in project_lines(project, colored) {
            out.push_str(&line);
            out.push('\n');
        }
    }
    out.push('\n');
    for line in summary_lines(report) {
        out.push_str(&line);
        out.push('\n');
    }
    out
}

#[derive(Serialize)]
struct ProjectView<'a> {
    #[serde(flatten)]
    project: &'a ProjectMigrationReport,
    succeeded: bool,
}

#[derive(Serialize)]
struct ReportView<'a> {
    projects: Vec<ProjectView<'a>>,
    total_count: usize,
    succeeded_count: usize,
    failed_count: usize,
}

/// Render the report as pretty-printed JSON, counts included
///
/// # Errors
/// Returns error if serialisation fails
pub fn render_json(report: &MigrationReport) -> ReportResult<String> {
    let view = ReportView {
        projects: report
            .projects()
            .iter()
            .map(|project| ProjectView {
                project,
                succeeded: project.succeeded(),
            })
            .collect(),
        total_count: report.total_count(),
        succeeded_count: report.succeeded_count(),
        failed_count: report.failed_count(),
    };
    Ok(serde_json::to_string_pretty(&view)?)
}

/// Render for a report file (never coloured)
///
/// # Errors
/// Returns error if JSON serialisation fails
pub fn render(report: &MigrationReport, format: ReportFormat) -> ReportResult<String> {
    match format {
        ReportFormat::Text => Ok(render_text(report, false)),
        ReportFormat::Json => render_json(report),
    }
}

/// Write the report file
///
/// # Errors
/// Returns error on serialisation or IO failure
pub fn write_report_file(report: &MigrationReport, path: &Path, format: ReportFormat) -> ReportResult<()> {
    let content = render(report, format)?;
    std::fs::write(path, content).map_err(|e| ReportError::io_error(path, e))
}

/// Write the console report followed by the next-steps text
///
/// # Errors
/// Returns error if the sink fails
pub fn write_console(report: &MigrationReport, sink: &mut dyn Write, colored: bool) -> ReportResult<()> {
    let text = render_text(report, colored);
    writeln!(sink, "{text}{NEXT_STEPS}").map_err(|e| ReportError::io_error(PathBuf::from("<console>"), e))
}

/// Check if console colour should be used
///
/// Colour needs an interactive stdout and an unset `NO_COLOR`.
#[must_use]
pub fn console_supports_color() -> bool {
    use std::io::IsTerminal;
    std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> MigrationReport {
        vec![
            ProjectMigrationReport::new("App", "/w/App").with_warning("MIGRATE20011: scripts dropped"),
            ProjectMigrationReport::failed("Lib", "/w/Lib", "MIGRATE1018: missing dependency"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn text_report_layout() {
        let expected = "MIGRATE20011: scripts dropped\n\
Project App migration succeeded (/w/App)\n\
Project migration failed (Lib, /w/Lib)\n\
MIGRATE1018: missing dependency\n\
\n\
Summary\n\
Total Projects: 2\n\
Succeeded Projects: 1\n\
Failed Projects: 1\n";
        assert_eq!(render_text(&sample(), false), expected);
    }

    #[test]
    fn coloured_text_carries_escape_codes() {
        let text = render_text(&sample(), true);
        assert!(text.contains("\u{1b}["));
        assert!(!render(&sample(), ReportFormat::Text).unwrap().contains('\u{1b}'));
    }

    #[test]
    fn json_includes_derived_fields() {
        let json: serde_json::Value = serde_json::from_str(&render_json(&sample()).unwrap()).unwrap();
        assert_eq!(json["total_count"], 2);
        assert_eq!(json["failed_count"], 1);
        assert_eq!(json["projects"][0]["project_name"], "App");
        assert_eq!(json["projects"][0]["succeeded"], true);
        assert_eq!(json["projects"][1]["succeeded"], false);
    }

    #[test]
    fn console_output_ends_with_next_steps() {
        let mut sink = Vec::new();
        write_console(&sample(), &mut sink, false).unwrap();
        let text = String::from_utf8(sink).unwrap();
        assert!(text.starts_with("MIGRATE20011"));
        assert!(text.trim_end().ends_with("delete the backup directory."));
    }

    #[test]
    fn report_file_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        write_report_file(&sample(), &path, ReportFormat::Json).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"failed_count\": 1"));
    }
}
