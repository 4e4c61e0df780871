//! Solution reconciliation
//!
//! Brings a solution in line with a fully successful migration report:
//! 1. computes the converted projects to add and the legacy projects to remove,
//! 2. upgrades an old header,
//! 3. drops `global.json` from solution folders and sweeps emptied folders,
//! 4. applies the staged additions and removals through a [`SolutionManipulator`].
//!
//! Nothing happens when the report carries any failure.

use crate::error::ManipulationError;
use crate::manipulator::SolutionManipulator;
use pjm_report::MigrationReport;
use pjm_solution::{
    normalize, SolutionFile, SolutionHeader, ToolVersion, CURRENT_MINIMUM_TOOL_VERSION,
    CURRENT_PRODUCT_DESCRIPTION, CURRENT_TOOL_VERSION,
};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Headers with a lower major tool version are upgraded
pub const UPGRADE_THRESHOLD_MAJOR: u32 = 15;
/// Solution folder section listing loose files
pub const SOLUTION_ITEMS: &str = "SolutionItems";
/// Legacy global settings item removed from solution folders
pub const LEGACY_GLOBAL_SETTINGS_ITEM: &str = "global.json";
/// Legacy build descriptor extension
pub const LEGACY_PROJECT_EXTENSION: &str = "xproj";

/// Staged member edits
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    /// Converted project files to add, deduplicated by resolved path
    pub additions: BTreeSet<PathBuf>,
    /// Legacy project files to remove
    pub removals: BTreeSet<PathBuf>,
}

impl ReconcilePlan {
    /// Stage member edits for `report` against `solution`
    #[must_use]
    pub fn new(report: &MigrationReport, solution: &SolutionFile) -> Self {
        let mut plan = Self::default();
        for project in report.succeeded() {
            let converted = solution.resolve_path(&project.converted_project_path());
            if solution.contains_project(&converted) {
                tracing::debug!("{} already listed", converted.display());
            } else {
                plan.additions.insert(converted);
            }
            for dependency in project.resolved_dependencies() {
                plan.additions.insert(solution.resolve_path(&dependency));
            }
        }
        for directory in report.project_directories() {
            for legacy in legacy_projects(directory) {
                if solution.contains_project(&legacy) {
                    plan.removals.insert(normalize(&legacy));
                }
            }
        }
        plan
    }

    /// Check if nothing is staged
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.removals.is_empty()
    }
}

/// Legacy build descriptors physically present in `directory`, sorted
fn legacy_projects(directory: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(directory) else {
        tracing::warn!("Cannot list project directory {}", directory.display());
        return Vec::new();
    };
    let mut found: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case(LEGACY_PROJECT_EXTENSION))
        })
        .collect();
    found.sort();
    found
}

/// Check if the header predates the current tool version
#[must_use]
pub fn needs_header_upgrade(header: &SolutionHeader) -> bool {
    header
        .tool_version()
        .and_then(ToolVersion::parse)
        .map_or(true, |version| version.major() < UPGRADE_THRESHOLD_MAJOR)
}

/// Upgrade an old header to the current tool version, returning whether it changed
pub fn upgrade_header(header: &mut SolutionHeader) -> bool {
    if !needs_header_upgrade(header) {
        return false;
    }
    header.set_product_description(CURRENT_PRODUCT_DESCRIPTION);
    header.set_tool_version(CURRENT_TOOL_VERSION);
    header.set_minimum_tool_version(CURRENT_MINIMUM_TOOL_VERSION);
    true
}

/// Remove `global.json` from solution folders, then sweep emptied folders
///
/// Returns the number of items and folders removed.
pub fn remove_stale_folder_items(solution: &mut SolutionFile) -> (usize, usize) {
    let mut items = 0;
    for folder in solution.projects_mut().filter(|p| p.is_solution_folder()) {
        let Some(section) = folder.section_mut(SOLUTION_ITEMS) else {
            continue;
        };
        let removed = section.remove_properties_where(|key, _| key == LEGACY_GLOBAL_SETTINGS_ITEM);
        if removed > 0 && section.is_empty() {
            folder.remove_section(SOLUTION_ITEMS);
        }
        items += removed;
    }
    let folders = solution.remove_empty_solution_folders();
    (items, folders)
}

/// What reconciliation did to one solution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Solution file
    pub solution: PathBuf,
    /// Header was upgraded
    pub header_upgraded: bool,
    /// `global.json` items removed from folders
    pub folder_items_removed: usize,
    /// Solution folders removed
    pub folders_removed: usize,
    /// Projects actually added
    pub added: Vec<PathBuf>,
    /// Projects actually removed
    pub removed: Vec<PathBuf>,
}

impl ReconcileOutcome {
    /// Check if the solution changed
    #[must_use]
    pub fn changed(&self) -> bool {
        self.header_upgraded
            || self.folder_items_removed > 0
            || self.folders_removed > 0
            || !self.added.is_empty()
            || !self.removed.is_empty()
    }
}

/// Reconciliation engine bound to a manipulation capability
pub struct Reconciler<'a> {
    manipulator: &'a dyn SolutionManipulator,
}

impl<'a> Reconciler<'a> {
    /// Create engine delegating member edits to `manipulator`
    #[must_use]
    pub fn new(manipulator: &'a dyn SolutionManipulator) -> Self {
        Self { manipulator }
    }

    /// Reconcile `solution` with `report` and write it back when it changed
    ///
    /// Returns `None` without touching the solution when the report has failures.
    ///
    /// # Errors
    /// Returns error if a member edit or the final write fails
    pub fn reconcile(
        &self,
        report: &MigrationReport,
        solution: &mut SolutionFile,
    ) -> Result<Option<ReconcileOutcome>, ManipulationError> {
        if !report.is_success() {
            tracing::info!(
                "Skipping {}: {} projects failed",
                solution.path().display(),
                report.failed_count()
            );
            return Ok(None);
        }

        let plan = ReconcilePlan::new(report, solution);
        tracing::debug!(
            "Staged {} additions and {} removals for {}",
            plan.additions.len(),
            plan.removals.len(),
            solution.path().display()
        );

        let mut outcome = ReconcileOutcome {
            solution: solution.path().to_path_buf(),
            header_upgraded: upgrade_header(solution.header_mut()),
            ..ReconcileOutcome::default()
        };
        let (items, folders) = remove_stale_folder_items(solution);
        outcome.folder_items_removed = items;
        outcome.folders_removed = folders;

        let writes_through = self.manipulator.writes_through();
        if writes_through && outcome.changed() {
            solution.write()?;
        }

        for project in &plan.additions {
            if self.manipulator.add_project(solution, project)?.is_applied() {
                tracing::info!("Added {} to {}", project.display(), solution.path().display());
                outcome.added.push(project.clone());
            }
        }
        for project in &plan.removals {
            if self.manipulator.remove_project(solution, project)?.is_applied() {
                tracing::info!("Removed {} from {}", project.display(), solution.path().display());
                outcome.removed.push(project.clone());
            }
        }

        if !writes_through && outcome.changed() {
            solution.write()?;
        }
        Ok(Some(outcome))
    }
}
