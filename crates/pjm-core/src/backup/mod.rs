//! Backup of superseded legacy artifacts
//!
//! [`BackupPlan::new`] decides where everything goes without touching the
//! tree; [`BackupPlan::perform`] moves the files. A destination that already
//! holds the same bytes counts as done. One holding different bytes stops the
//! step with [`BackupError::Conflict`]; files moved before that stay moved.

pub mod digest;

use crate::error::BackupError;
use digest::FileDigest;
use pjm_solution::MemberPath;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Name of the backup directory under the common ancestor
pub const BACKUP_DIRECTORY_NAME: &str = "backup";
/// Suffix the converter gives files it replaced in place
pub const IN_PLACE_BACKUP_SUFFIX: &str = ".migration_in_place_backup";
/// Legacy global settings file
pub const GLOBAL_SETTINGS_FILE_NAME: &str = "global.json";

const LEGACY_SUFFIXES: &[&str] = &[".xproj", ".xproj.user", ".lock.json", IN_PLACE_BACKUP_SUFFIX];

/// One planned file move
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupMove {
    /// File in the active tree
    pub source: PathBuf,
    /// Location under the backup root
    pub destination: PathBuf,
}

/// Result of a performed backup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupOutcome {
    /// Backup root directory
    pub root: PathBuf,
    /// Files moved, in plan order
    pub moved: Vec<BackupMove>,
}

/// Planned backup of a run's legacy artifacts
#[derive(Debug, Clone)]
pub struct BackupPlan {
    root: PathBuf,
    moves: Vec<BackupMove>,
}

/// Check if a file name is a legacy artifact, returning its name in the backup
fn backup_name(file_name: &str) -> Option<String> {
    let lower = file_name.to_ascii_lowercase();
    if lower == crate::discovery::DESCRIPTOR_FILE_NAME {
        return Some(file_name.to_string());
    }
    if lower.ends_with(IN_PLACE_BACKUP_SUFFIX) {
        let restored = &file_name[..file_name.len() - IN_PLACE_BACKUP_SUFFIX.len()];
        return (!restored.is_empty()).then(|| restored.to_string());
    }
    LEGACY_SUFFIXES
        .iter()
        .any(|suffix| lower.ends_with(suffix) && lower.len() > suffix.len())
        .then(|| file_name.to_string())
}

/// Legacy artifacts directly inside `directory`, sorted by name
fn legacy_artifacts(directory: &Path) -> Result<Vec<(PathBuf, String)>, BackupError> {
    let entries = std::fs::read_dir(directory).map_err(|e| BackupError::io_error(directory, e))?;
    let mut found = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| BackupError::io_error(directory, e))?;
        if !entry.path().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if let Some(target) = backup_name(&name) {
            found.push((entry.path(), target));
        }
    }
    found.sort();
    Ok(found)
}

/// Check if a directory name is `backup` or `backup_<n>`
#[must_use]
pub fn is_backup_directory_name(name: &str) -> bool {
    match name.strip_prefix(BACKUP_DIRECTORY_NAME) {
        Some("") => true,
        Some(rest) => rest
            .strip_prefix('_')
            .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit())),
        None => false,
    }
}

/// First of `backup`, `backup_1`, `backup_2`, ... that does not exist under `parent`
fn free_backup_root(parent: &Path) -> PathBuf {
    let mut candidate = parent.join(BACKUP_DIRECTORY_NAME);
    let mut suffix = 1;
    while candidate.exists() {
        candidate = parent.join(format!("{BACKUP_DIRECTORY_NAME}_{suffix}"));
        suffix += 1;
    }
    candidate
}

impl BackupPlan {
    /// Plan the backup of `project_directories`
    ///
    /// Every directory is mirrored relative to the common ancestor the backup
    /// root sits under. When all directories lie inside `working_root` that
    /// ancestor is `working_root` itself.
    ///
    /// # Errors
    /// Returns error if a project directory cannot be listed
    pub fn new(project_directories: &[&Path], working_root: &Path) -> Result<Self, BackupError> {
        let working = MemberPath::from_path(working_root);
        let common = project_directories
            .iter()
            .map(|dir| MemberPath::from_path(dir))
            .fold(working.clone(), |acc, dir| acc.common_prefix(&dir));
        let root = free_backup_root(&common.to_path_buf());
        let mirror_of = |member: &MemberPath| {
            member
                .strip_prefix(&common)
                .map(|relative| relative.to_path_buf())
                .unwrap_or_default()
        };

        let mut moves = Vec::new();
        let mut seen = HashSet::new();
        for directory in project_directories {
            let destination_dir = root.join(mirror_of(&MemberPath::from_path(directory)));
            for (source, name) in legacy_artifacts(directory)? {
                if seen.insert(source.clone()) {
                    moves.push(BackupMove {
                        source,
                        destination: destination_dir.join(name),
                    });
                }
            }
        }

        let global_settings = working_root.join(GLOBAL_SETTINGS_FILE_NAME);
        if global_settings.is_file() && seen.insert(global_settings.clone()) {
            moves.push(BackupMove {
                source: global_settings,
                destination: root.join(mirror_of(&working)).join(GLOBAL_SETTINGS_FILE_NAME),
            });
        }

        tracing::debug!("Planned {} backup moves into {}", moves.len(), root.display());
        Ok(Self { root, moves })
    }

    /// Backup root directory
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Planned moves
    #[inline]
    #[must_use]
    pub fn moves(&self) -> &[BackupMove] {
        &self.moves
    }

    /// Move every planned file
    ///
    /// # Errors
    /// Returns error on the first conflicting destination or IO failure
    pub fn perform(&self) -> Result<BackupOutcome, BackupError> {
        let mut moved = Vec::with_capacity(self.moves.len());
        for planned in &self.moves {
            let BackupMove { source, destination } = planned;
            if let Some(parent) = destination.parent() {
                std::fs::create_dir_all(parent).map_err(|e| BackupError::io_error(parent, e))?;
            }
            if destination.exists() {
                let identical = digest::same_content(source, destination)
                    .map_err(|e| BackupError::io_error(destination, e))?;
                if !identical {
                    return Err(BackupError::Conflict {
                        source_path: source.clone(),
                        destination: destination.clone(),
                    });
                }
                let digest = FileDigest::of_file(destination)
                    .map_err(|e| BackupError::io_error(destination, e))?;
                tracing::debug!(
                    "{} already backed up as {} (blake3 {digest})",
                    source.display(),
                    destination.display()
                );
                std::fs::remove_file(source).map_err(|e| BackupError::io_error(source, e))?;
            } else {
                std::fs::rename(source, destination).map_err(|e| BackupError::io_error(source, e))?;
            }
            moved.push(planned.clone());
        }
        tracing::info!("Backed up {} files to {}", moved.len(), self.root.display());
        Ok(BackupOutcome {
            root: self.root.clone(),
            moved,
        })
    }
}
