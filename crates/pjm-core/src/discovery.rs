//! Input discovery
//!
//! Resolves the run's input into the ordered list of `project.json` files to
//! convert. A solution named as input is parsed here and handed on to
//! reconciliation as part of [`Discovery`].

use crate::error::{MigrateError, MigrateResult};
use pjm_solution::{normalize, resolve_member, SolutionFile};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Legacy descriptor file name
pub const DESCRIPTOR_FILE_NAME: &str = "project.json";
/// Legacy global settings file name
pub const GLOBAL_SETTINGS_FILE_NAME: &str = "global.json";
/// Solution file extension
pub const SOLUTION_EXTENSION: &str = "sln";

/// Resolved run input
#[derive(Debug)]
pub struct Discovery {
    /// Directory the run works in
    pub working_root: PathBuf,
    /// Descriptors to convert, first-seen order, no duplicates
    pub descriptors: Vec<PathBuf>,
    /// Solution named as input
    pub solution: Option<SolutionFile>,
}

fn absolute(path: &Path) -> MigrateResult<PathBuf> {
    if path.is_absolute() {
        return Ok(normalize(path));
    }
    let cwd = std::env::current_dir().map_err(|e| MigrateError::io_error(path, e))?;
    Ok(normalize(&cwd.join(path)))
}

fn ends_with_name(path: &Path, name: &str) -> bool {
    path.to_string_lossy().to_ascii_lowercase().ends_with(name)
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case(extension))
}

fn dedup(paths: impl IntoIterator<Item = PathBuf>) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    paths.into_iter().filter(|p| seen.insert(p.clone())).collect()
}

/// Resolve `input` into descriptors to convert
///
/// # Errors
/// Returns a user input error when nothing can be migrated from `input`
pub fn discover(input: &Path) -> MigrateResult<Discovery> {
    let input = absolute(input)?;
    let working_root = if input.is_file() {
        input.parent().map_or_else(|| input.clone(), Path::to_path_buf)
    } else {
        input.clone()
    };

    let mut solution = None;
    let descriptors = if ends_with_name(&input, DESCRIPTOR_FILE_NAME) {
        if !input.is_file() {
            return Err(MigrateError::DescriptorNotFound(input));
        }
        vec![input.clone()]
    } else if ends_with_name(&input, GLOBAL_SETTINGS_FILE_NAME) {
        from_global_settings(&input)?
    } else if input.is_file() && has_extension(&input, SOLUTION_EXTENSION) {
        let parsed = SolutionFile::read(&input)?;
        let found = from_solution(&parsed);
        solution = Some(parsed);
        found
    } else if input.is_dir() {
        from_directory(&input)
    } else {
        return Err(MigrateError::InvalidInput(input));
    };

    let descriptors = dedup(descriptors);
    if descriptors.is_empty() {
        return Err(MigrateError::InputNotFound(input));
    }
    tracing::info!("Discovered {} projects under {}", descriptors.len(), working_root.display());
    Ok(Discovery {
        working_root,
        descriptors,
        solution,
    })
}

fn from_global_settings(path: &Path) -> MigrateResult<Vec<PathBuf>> {
    if !path.is_file() {
        return Err(MigrateError::GlobalSettingsNotFound(path.to_path_buf()));
    }
    let text = std::fs::read_to_string(path).map_err(|e| MigrateError::io_error(path, e))?;
    let settings: serde_json::Value =
        serde_json::from_str(&text).map_err(|source| MigrateError::UnreadableGlobalSettings {
            path: path.to_path_buf(),
            source,
        })?;
    let directory = path.parent().unwrap_or_else(|| Path::new("."));

    let mut search_paths = vec![directory.to_path_buf()];
    if let Some(projects) = settings.get("projects").and_then(serde_json::Value::as_array) {
        search_paths.extend(
            projects
                .iter()
                .filter_map(serde_json::Value::as_str)
                .map(|p| normalize(&directory.join(p))),
        );
    }

    let mut found = Vec::new();
    for search_path in search_paths.iter().filter(|p| p.is_dir()) {
        let Ok(entries) = std::fs::read_dir(search_path) else {
            tracing::warn!("Cannot list search path {}", search_path.display());
            continue;
        };
        let mut project_dirs: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|p| p.is_dir())
            .collect();
        project_dirs.sort();
        found.extend(
            project_dirs
                .into_iter()
                .map(|dir| dir.join(DESCRIPTOR_FILE_NAME))
                .filter(|p| p.is_file()),
        );
    }
    Ok(found)
}

fn from_solution(solution: &SolutionFile) -> Vec<PathBuf> {
    solution
        .projects()
        .iter()
        .filter_map(|entry| {
            let member = resolve_member(solution.base_directory(), entry.relative_file_path());
            let descriptor = member.parent()?.join(DESCRIPTOR_FILE_NAME);
            descriptor.is_file().then_some(descriptor)
        })
        .collect()
}

/// Walks `directory` for descriptors, skipping backup trees left by earlier runs
fn from_directory(directory: &Path) -> Vec<PathBuf> {
    WalkDir::new(directory)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || !entry
                    .file_name()
                    .to_str()
                    .is_some_and(crate::backup::is_backup_directory_name)
        })
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file() && entry.file_name() == DESCRIPTOR_FILE_NAME)
        .map(walkdir::DirEntry::into_path)
        .collect()
}

/// Solutions directly inside `working_root`, sorted by name
///
/// Candidates that fail to parse are skipped.
#[must_use]
pub fn candidate_solutions(working_root: &Path) -> Vec<SolutionFile> {
    let Ok(entries) = std::fs::read_dir(working_root) else {
        return Vec::new();
    };
    let mut paths: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|p| p.is_file() && has_extension(p, SOLUTION_EXTENSION))
        .collect();
    paths.sort();

    paths
        .into_iter()
        .filter_map(|path| match SolutionFile::read(&path) {
            Ok(solution) => Some(solution),
            Err(err) => {
                tracing::warn!("Skipping solution {}: {}", path.display(), err);
                None
            }
        })
        .collect()
}
