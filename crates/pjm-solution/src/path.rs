//! Member paths for solution entries
//!
//! Provides [`MemberPath`], a lexically normalised path split into segments.
//! Solution files store member paths relative to their own directory with
//! `\` separators; every comparison goes through this type so that
//! `src\App\App.csproj`, `src/App/App.csproj` and `./src/x/../App/App.csproj`
//! resolve to the same location.

use std::fmt::{self, Display, Formatter};
use std::path::{Component, Path, PathBuf};

/// Separator used inside solution files
pub const CONTAINER_SEPARATOR: char = '\\';

/// Lexically normalised path
///
/// `anchor` holds the prefix and root (`/`, `C:\`) of absolute paths; relative
/// paths have an empty anchor. `..` segments only survive at the front of a
/// relative path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct MemberPath {
    anchor: String,
    segments: Vec<String>,
}

impl MemberPath {
    /// Normalise a filesystem path
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        let mut result = Self::default();
        for component in path.components() {
            match component {
                Component::Prefix(prefix) => {
                    result.anchor.push_str(&prefix.as_os_str().to_string_lossy());
                }
                Component::RootDir => result.anchor.push(std::path::MAIN_SEPARATOR),
                Component::CurDir => {}
                Component::ParentDir => result.pop_segment(),
                Component::Normal(segment) => {
                    result.segments.push(segment.to_string_lossy().into_owned());
                }
            }
        }
        result
    }

    /// Parse a path as written in a solution file
    ///
    /// Both `\` and `/` are accepted as separators.
    #[must_use]
    pub fn from_container(text: &str) -> Self {
        let mut result = Self::default();
        for segment in text.split(['\\', '/']) {
            match segment {
                "" | "." => {}
                ".." => result.pop_segment(),
                other => result.segments.push(other.to_string()),
            }
        }
        result
    }

    fn pop_segment(&mut self) {
        match self.segments.last() {
            Some(last) if last != ".." => {
                self.segments.pop();
            }
            // `..` above the root stays at the root
            _ if self.is_absolute() => {}
            _ => self.segments.push("..".to_string()),
        }
    }

    /// Check if path carries a root
    #[inline]
    #[must_use]
    pub fn is_absolute(&self) -> bool {
        !self.anchor.is_empty()
    }

    /// Path segments below the anchor
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Last segment (file or directory name)
    #[inline]
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Append a relative path; an absolute `other` replaces `self`
    #[must_use]
    pub fn join(&self, other: &Self) -> Self {
        if other.is_absolute() {
            return other.clone();
        }
        let mut joined = self.clone();
        for segment in &other.segments {
            if segment == ".." {
                joined.pop_segment();
            } else {
                joined.segments.push(segment.clone());
            }
        }
        joined
    }

    /// Check if this path is a prefix of another
    #[inline]
    #[must_use]
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        self.anchor == other.anchor
            && self.segments.len() <= other.segments.len()
            && self.segments == other.segments[..self.segments.len()]
    }

    /// Longest shared prefix of two paths
    ///
    /// Paths with different anchors share nothing; the result is the empty
    /// relative path.
    #[must_use]
    pub fn common_prefix(&self, other: &Self) -> Self {
        if self.anchor != other.anchor {
            return Self::default();
        }
        let segments = self
            .segments
            .iter()
            .zip(&other.segments)
            .take_while(|(a, b)| a == b)
            .map(|(a, _)| a.clone())
            .collect();
        Self {
            anchor: self.anchor.clone(),
            segments,
        }
    }

    /// Path of `self` below `ancestor`
    ///
    /// # Errors
    /// Returns error if `self` is not a descendant of `ancestor`
    pub fn strip_prefix(&self, ancestor: &Self) -> Result<Self, PathError> {
        if !ancestor.is_prefix_of(self) {
            return Err(PathError::NotDescendant {
                path: self.to_string(),
                ancestor: ancestor.to_string(),
            });
        }
        Ok(Self {
            anchor: String::new(),
            segments: self.segments[ancestor.segments.len()..].to_vec(),
        })
    }

    /// Relative path from directory `from` to `self`, climbing with `..`
    ///
    /// Returns `None` when the two paths do not share an anchor.
    #[must_use]
    pub fn relative_from(&self, from: &Self) -> Option<Self> {
        if self.anchor != from.anchor {
            return None;
        }
        let common = self.common_prefix(from).segments.len();
        let mut segments: Vec<String> = std::iter::repeat("..".to_string())
            .take(from.segments.len() - common)
            .collect();
        segments.extend(self.segments[common..].iter().cloned());
        Some(Self {
            anchor: String::new(),
            segments,
        })
    }

    /// Join segments with the solution file separator
    #[must_use]
    pub fn to_container_string(&self) -> String {
        let joined = self.segments.join(&CONTAINER_SEPARATOR.to_string());
        format!("{}{}", self.anchor, joined)
    }

    /// Convert back to a native path
    #[must_use]
    pub fn to_path_buf(&self) -> PathBuf {
        let mut path = PathBuf::from(&self.anchor);
        for segment in &self.segments {
            path.push(segment);
        }
        path
    }
}

impl Display for MemberPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.anchor, self.segments.join("/"))
    }
}

impl From<&Path> for MemberPath {
    fn from(path: &Path) -> Self {
        Self::from_path(path)
    }
}

/// Resolve a stored member path against the solution directory
#[must_use]
pub fn resolve_member(base_directory: &Path, stored: &str) -> PathBuf {
    MemberPath::from_path(base_directory)
        .join(&MemberPath::from_container(stored))
        .to_path_buf()
}

/// Express `target` relative to `base_directory` in solution file form
///
/// Falls back to the normalised absolute path when no relative form exists
/// (different drive prefixes).
#[must_use]
pub fn container_relative(base_directory: &Path, target: &Path) -> String {
    let target = MemberPath::from_path(target);
    target
        .relative_from(&MemberPath::from_path(base_directory))
        .unwrap_or(target)
        .to_container_string()
}

/// Lexically normalise a native path
#[must_use]
pub fn normalize(path: &Path) -> PathBuf {
    MemberPath::from_path(path).to_path_buf()
}

/// Errors related to member paths
#[derive(Debug, thiserror::Error)]
pub enum PathError {
    /// Not a descendant path
    #[error("path '{path}' is not below '{ancestor}'")]
    NotDescendant { path: String, ancestor: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_form_accepts_both_separators() {
        let a = MemberPath::from_container("src\\App\\App.csproj");
        let b = MemberPath::from_container("src/App/App.csproj");
        assert_eq!(a, b);
        assert_eq!(a.segments(), &["src", "App", "App.csproj"]);
    }

    #[test]
    fn dots_fold_lexically() {
        let path = MemberPath::from_container(".\\src\\Other\\..\\App\\App.csproj");
        assert_eq!(path.to_container_string(), "src\\App\\App.csproj");
    }

    #[test]
    fn leading_parent_segments_survive_on_relative_paths() {
        let path = MemberPath::from_container("..\\..\\Lib\\Lib.csproj");
        assert_eq!(path.segments(), &["..", "..", "Lib", "Lib.csproj"]);
    }

    #[test]
    fn parent_above_root_stays_at_root() {
        let path = MemberPath::from_path(Path::new("/../work"));
        assert_eq!(path.to_path_buf(), PathBuf::from("/work"));
    }

    #[test]
    fn resolve_joins_and_normalises() {
        let resolved = resolve_member(Path::new("/work/TestApp"), "..\\TestLibrary\\TestLibrary.csproj");
        assert_eq!(resolved, PathBuf::from("/work/TestLibrary/TestLibrary.csproj"));
    }

    #[test]
    fn relative_from_climbs_out_of_base() {
        let rel = container_relative(
            Path::new("/work/TestApp"),
            Path::new("/work/TestLibrary/TestLibrary.csproj"),
        );
        assert_eq!(rel, "..\\TestLibrary\\TestLibrary.csproj");
    }

    #[test]
    fn relative_from_descends_into_base() {
        let rel = container_relative(
            Path::new("/work/TestApp"),
            Path::new("/work/TestApp/src/subdir/subdir.csproj"),
        );
        assert_eq!(rel, "src\\subdir\\subdir.csproj");
    }

    #[test]
    fn common_prefix_of_siblings() {
        let a = MemberPath::from_path(Path::new("/work/a/b"));
        let b = MemberPath::from_path(Path::new("/work/a/c"));
        assert_eq!(a.common_prefix(&b).to_path_buf(), PathBuf::from("/work/a"));
    }

    #[test]
    fn strip_prefix_fails_outside_ancestor() {
        let path = MemberPath::from_path(Path::new("/work/a"));
        let other = MemberPath::from_path(Path::new("/elsewhere"));
        assert!(matches!(
            path.strip_prefix(&other),
            Err(PathError::NotDescendant { .. })
        ));
        let below = MemberPath::from_path(Path::new("/work/a/b/c"));
        assert_eq!(below.strip_prefix(&path).unwrap().segments(), &["b", "c"]);
    }
}
