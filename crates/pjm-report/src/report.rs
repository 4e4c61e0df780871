//! Per-project and run-level migration reports
//!
//! [`MigrationReport`] is a plain ordered list of [`ProjectMigrationReport`]s.
//! Counts are always derived from that list. [`MigrationReport::merge`] with
//! [`MigrationReport::default`] as identity lets the conversion loop fold one
//! result at a time.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Extension of converted project files
pub const CONVERTED_PROJECT_EXTENSION: &str = "csproj";

/// Outcome of converting one project
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProjectMigrationReport {
    /// Project display name
    pub project_name: String,
    /// Directory holding the legacy descriptor
    pub project_directory: PathBuf,
    /// Converted project file, when the converter wrote one elsewhere
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_project_path: Option<PathBuf>,
    /// Non-fatal findings
    #[serde(default)]
    pub warnings: Vec<String>,
    /// Failures; a non-empty list marks the project as failed
    #[serde(default)]
    pub errors: Vec<String>,
    /// Already-converted dependency project files found during conversion
    #[serde(default)]
    pub pre_existing_converted_dependencies: BTreeSet<PathBuf>,
}

impl ProjectMigrationReport {
    /// Create a successful report with no findings
    pub fn new(project_name: impl Into<String>, project_directory: impl Into<PathBuf>) -> Self {
        Self {
            project_name: project_name.into(),
            project_directory: project_directory.into(),
            ..Self::default()
        }
    }

    /// Create a failed report carrying one error
    pub fn failed(
        project_name: impl Into<String>,
        project_directory: impl Into<PathBuf>,
        error: impl Into<String>,
    ) -> Self {
        Self::new(project_name, project_directory).with_error(error)
    }

    /// Add warning
    #[inline]
    #[must_use]
    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    /// Add error
    #[inline]
    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.errors.push(error.into());
        self
    }

    /// Add pre-existing converted dependency
    #[inline]
    #[must_use]
    pub fn with_dependency(mut self, path: impl Into<PathBuf>) -> Self {
        self.pre_existing_converted_dependencies.insert(path.into());
        self
    }

    /// Set converted project file location
    #[inline]
    #[must_use]
    pub fn with_output_project(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_project_path = Some(path.into());
        self
    }

    /// Check if conversion succeeded
    #[inline]
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.errors.is_empty()
    }

    /// File name of the converted project (`<name>.csproj`)
    #[must_use]
    pub fn converted_project_file_name(&self) -> String {
        format!("{}.{CONVERTED_PROJECT_EXTENSION}", self.project_name)
    }

    /// Converted project file path
    #[must_use]
    pub fn converted_project_path(&self) -> PathBuf {
        self.output_project_path
            .clone()
            .unwrap_or_else(|| self.project_directory.join(self.converted_project_file_name()))
    }

    /// Dependency paths resolved against the project directory
    pub fn resolved_dependencies(&self) -> impl Iterator<Item = PathBuf> + '_ {
        self.pre_existing_converted_dependencies
            .iter()
            .map(|dep| self.project_directory.join(dep))
    }
}

/// Run-level report over every attempted project
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MigrationReport {
    projects: Vec<ProjectMigrationReport>,
}

impl MigrationReport {
    /// Empty report (merge identity)
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Concatenate two reports, `self` first
    #[must_use]
    pub fn merge(mut self, other: Self) -> Self {
        self.projects.extend(other.projects);
        self
    }

    /// Append one project result
    pub fn push(&mut self, project: ProjectMigrationReport) {
        self.projects.push(project);
    }

    /// Per-project results in attempt order
    #[inline]
    #[must_use]
    pub fn projects(&self) -> &[ProjectMigrationReport] {
        &self.projects
    }

    /// Successful per-project results
    pub fn succeeded(&self) -> impl Iterator<Item = &ProjectMigrationReport> {
        self.projects.iter().filter(|p| p.succeeded())
    }

    /// Distinct project directories in first-seen order
    #[must_use]
    pub fn project_directories(&self) -> Vec<&Path> {
        let mut seen = BTreeSet::new();
        self.projects
            .iter()
            .map(|p| p.project_directory.as_path())
            .filter(|dir| seen.insert(*dir))
            .collect()
    }

    /// Number of attempted projects
    #[inline]
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.projects.len()
    }

    /// Number of successful projects
    #[must_use]
    pub fn succeeded_count(&self) -> usize {
        self.succeeded().count()
    }

    /// Number of failed projects
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.total_count() - self.succeeded_count()
    }

    /// Gate for solution reconciliation and backup
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed_count() == 0
    }
}

impl From<ProjectMigrationReport> for MigrationReport {
    fn from(project: ProjectMigrationReport) -> Self {
        Self {
            projects: vec![project],
        }
    }
}

impl FromIterator<ProjectMigrationReport> for MigrationReport {
    fn from_iter<I: IntoIterator<Item = ProjectMigrationReport>>(iter: I) -> Self {
        Self {
            projects: iter.into_iter().collect(),
        }
    }
}

impl Extend<ProjectMigrationReport> for MigrationReport {
    fn extend<I: IntoIterator<Item = ProjectMigrationReport>>(&mut self, iter: I) {
        self.projects.extend(iter);
    }
}

impl<'a> IntoIterator for &'a MigrationReport {
    type Item = &'a ProjectMigrationReport;
    type IntoIter = std::slice::Iter<'a, ProjectMigrationReport>;

    fn into_iter(self) -> Self::IntoIter {
        self.projects.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn outcome(name: &str, ok: bool) -> ProjectMigrationReport {
        let report = ProjectMigrationReport::new(name, format!("/w/{name}"));
        if ok {
            report
        } else {
            report.with_error("MIGRATE1011: boom")
        }
    }

    #[test]
    fn counts_are_derived() {
        let report: MigrationReport = vec![outcome("A", true), outcome("B", false), outcome("C", true)]
            .into_iter()
            .collect();
        assert_eq!(report.total_count(), 3);
        assert_eq!(report.succeeded_count(), 2);
        assert_eq!(report.failed_count(), 1);
        assert!(!report.is_success());
    }

    #[test]
    fn empty_report_passes_gate() {
        assert!(MigrationReport::new().is_success());
    }

    #[test]
    fn warnings_do_not_fail_a_project() {
        let report = ProjectMigrationReport::new("A", "/w/A").with_warning("old runtime");
        assert!(report.succeeded());
    }

    #[test]
    fn converted_path_defaults_to_project_directory() {
        let report = ProjectMigrationReport::new("TestApp", "/w/TestApp");
        assert_eq!(report.converted_project_path(), PathBuf::from("/w/TestApp/TestApp.csproj"));
        let moved = report.with_output_project("/out/TestApp.csproj");
        assert_eq!(moved.converted_project_path(), PathBuf::from("/out/TestApp.csproj"));
    }

    #[test]
    fn dependencies_resolve_against_project_directory() {
        let report = ProjectMigrationReport::new("App", "/w/App").with_dependency("../Lib/Lib.csproj");
        let deps: Vec<_> = report.resolved_dependencies().collect();
        assert_eq!(deps, vec![PathBuf::from("/w/App/../Lib/Lib.csproj")]);
    }

    #[test]
    fn project_directories_are_distinct() {
        let report: MigrationReport = vec![outcome("A", true), outcome("A", false), outcome("B", true)]
            .into_iter()
            .collect();
        assert_eq!(report.project_directories(), vec![Path::new("/w/A"), Path::new("/w/B")]);
    }

    #[test]
    fn deserializes_minimal_converter_output() {
        let report: ProjectMigrationReport =
            serde_json::from_str(r#"{"project_name":"A","project_directory":"/w/A"}"#).unwrap();
        assert!(report.succeeded());
        assert!(report.pre_existing_converted_dependencies.is_empty());
    }

    fn arb_report() -> impl Strategy<Value = MigrationReport> {
        proptest::collection::vec(("[A-Z][a-z]{0,4}", any::<bool>()), 0..5)
            .prop_map(|items| items.iter().map(|(n, ok)| outcome(n, *ok)).collect())
    }

    proptest! {
        #[test]
        fn prop_merge_is_associative(a in arb_report(), b in arb_report(), c in arb_report()) {
            let left = a.clone().merge(b.clone()).merge(c.clone());
            let right = a.merge(b.merge(c));
            prop_assert_eq!(left, right);
        }

        #[test]
        fn prop_default_is_merge_identity(a in arb_report()) {
            prop_assert_eq!(MigrationReport::default().merge(a.clone()), a.clone());
            prop_assert_eq!(a.clone().merge(MigrationReport::default()), a);
        }

        #[test]
        fn prop_counts_add_up(a in arb_report(), b in arb_report()) {
            let merged = a.clone().merge(b.clone());
            prop_assert_eq!(merged.failed_count(), a.failed_count() + b.failed_count());
            prop_assert_eq!(merged.succeeded_count() + merged.failed_count(), merged.total_count());
        }
    }
}
