//! In-model project edits
//!
//! Both edits are idempotent: adding a member that is already listed or
//! removing one that is not changes nothing and reports [`EditOutcome::Unchanged`].

use crate::error::{SolutionError, SolutionResult};
use crate::file::SolutionFile;
use crate::model::{ProjectEntry, ProjectId, ProjectTypeId, Section, SectionPosition};
use crate::path::container_relative;
use std::collections::HashSet;
use std::path::Path;

/// Section listing solution configurations (`Debug|Any CPU = Debug|Any CPU`)
pub const SOLUTION_CONFIGURATIONS: &str = "SolutionConfigurationPlatforms";
/// Section mapping project configurations
pub const PROJECT_CONFIGURATIONS: &str = "ProjectConfigurationPlatforms";
/// Section holding `child = parent` folder relations
pub const NESTED_PROJECTS: &str = "NestedProjects";

/// Result of an idempotent edit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// The model changed
    Applied,
    /// The model already matched
    Unchanged,
}

impl EditOutcome {
    /// Check if the model changed
    #[inline]
    #[must_use]
    pub fn is_applied(self) -> bool {
        self == Self::Applied
    }
}

impl SolutionFile {
    fn fresh_project_id(&self) -> ProjectId {
        loop {
            let id = ProjectId::generate();
            if self.project(&id).is_none() {
                return id;
            }
        }
    }

    /// Add a member project unless an entry already resolves to it
    ///
    /// # Errors
    /// Returns error if the project kind cannot be inferred from the extension
    pub fn add_project(&mut self, project_path: &Path) -> SolutionResult<EditOutcome> {
        let target = self.resolve_path(project_path);
        if self.contains_project(&target) {
            return Ok(EditOutcome::Unchanged);
        }
        let type_id = target
            .extension()
            .and_then(|ext| ProjectTypeId::for_extension(&ext.to_string_lossy()))
            .ok_or_else(|| SolutionError::UnsupportedProjectType(target.clone()))?;
        let name = target
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let id = self.fresh_project_id();
        let relative = container_relative(self.base_directory(), &target);

        tracing::debug!(project = %target.display(), %id, "adding solution entry");
        self.push_project(ProjectEntry::new(id.clone(), type_id, name, relative))?;
        self.add_configurations(&id);
        Ok(EditOutcome::Applied)
    }

    fn add_configurations(&mut self, id: &ProjectId) {
        let configurations: Vec<String> = match self.global_section(SOLUTION_CONFIGURATIONS) {
            Some(section) => section.properties().iter().map(|(k, _)| k.to_string()).collect(),
            None => return,
        };
        if configurations.is_empty() {
            return;
        }
        if self.global_section(PROJECT_CONFIGURATIONS).is_none() {
            self.push_global_section(Section::new(PROJECT_CONFIGURATIONS, SectionPosition::PostSolution));
        }
        let Some(section) = self.global_section_mut(PROJECT_CONFIGURATIONS) else {
            return;
        };
        let properties = section.properties_mut();
        for configuration in configurations {
            let build = configuration.split('|').next().unwrap_or_default();
            let mapped = format!("{build}|Any CPU");
            properties.insert(format!("{id}.{configuration}.ActiveCfg"), mapped.clone());
            properties.insert(format!("{id}.{configuration}.Build.0"), mapped);
        }
    }

    /// Remove every entry resolving to `project_path` and every section row naming it
    pub fn remove_project(&mut self, project_path: &Path) -> EditOutcome {
        let target = self.resolve_path(project_path);
        let removed = self.remove_projects_where(|file, entry| {
            !entry.is_solution_folder() && file.resolve(entry) == target
        });
        if removed.is_empty() {
            return EditOutcome::Unchanged;
        }
        for entry in &removed {
            tracing::debug!(project = %target.display(), id = %entry.id(), "removed solution entry");
            self.prune_references(entry.id());
        }
        self.remove_empty_solution_folders();
        EditOutcome::Applied
    }

    fn prune_references(&mut self, id: &ProjectId) {
        let names = |key: &str, value: &str| {
            id.is_referenced_by(key) || value.trim().eq_ignore_ascii_case(id.as_str())
        };
        for entry in self.projects_mut() {
            let mut pruned = false;
            for section in entry.sections_mut() {
                pruned |= section.remove_properties_where(names) > 0;
            }
            if pruned {
                entry.remove_emptied_sections();
            }
        }
        for section in self.global_sections_mut() {
            section.remove_properties_where(names);
        }
        self.remove_emptied_global_sections();
    }

    /// Remove solution folders with no content and no nested members, until none remain
    ///
    /// Returns the number of folders removed.
    pub fn remove_empty_solution_folders(&mut self) -> usize {
        let mut total = 0;
        loop {
            let parents: HashSet<String> = self
                .global_section(NESTED_PROJECTS)
                .map(|s| s.properties().iter().map(|(_, v)| v.to_uppercase()).collect())
                .unwrap_or_default();
            let removed = self.remove_projects_where(|_, entry| {
                entry.is_solution_folder()
                    && entry.sections().iter().all(Section::is_empty)
                    && !parents.contains(entry.id().as_str())
            });
            if removed.is_empty() {
                break;
            }
            let ids: Vec<&ProjectId> = removed.iter().map(ProjectEntry::id).collect();
            if let Some(nested) = self.global_section_mut(NESTED_PROJECTS) {
                nested.remove_properties_where(|key, _| ids.iter().any(|id| id.is_referenced_by(key)));
            }
            total += removed.len();
        }
        if total > 0 {
            tracing::debug!(count = total, "removed empty solution folders");
            self.remove_emptied_global_sections();
        }
        total
    }
}

impl ProjectEntry {
    /// Drop sections that were edited down to nothing
    pub(crate) fn remove_emptied_sections(&mut self) {
        self.sections.retain(|s| !(s.is_modified() && s.is_empty()));
    }
}
