//! Content digests for backup collision checks

use std::fmt::{self, Display, Formatter};
use std::io;
use std::path::Path;

/// Blake3 digest of a file's bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileDigest([u8; 32]);

impl FileDigest {
    /// Digest of in-memory data
    #[inline]
    #[must_use]
    pub fn compute(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Digest of a file, streamed
    ///
    /// # Errors
    /// Returns error if the file cannot be read
    pub fn of_file(path: &Path) -> io::Result<Self> {
        let mut file = std::fs::File::open(path)?;
        let mut hasher = blake3::Hasher::new();
        io::copy(&mut file, &mut hasher)?;
        Ok(Self(*hasher.finalize().as_bytes()))
    }
}

impl Display for FileDigest {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// Check if two files hold identical bytes
///
/// # Errors
/// Returns error if either file cannot be read
pub fn same_content(a: &Path, b: &Path) -> io::Result<bool> {
    if std::fs::metadata(a)?.len() != std::fs::metadata(b)?.len() {
        return Ok(false);
    }
    Ok(FileDigest::of_file(a)? == FileDigest::of_file(b)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_digest_matches_memory_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("project.json");
        std::fs::write(&path, b"{}").unwrap();
        assert_eq!(FileDigest::of_file(&path).unwrap(), FileDigest::compute(b"{}"));
        assert_eq!(FileDigest::compute(b"{}").to_string().len(), 64);
    }

    #[test]
    fn same_content_compares_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        let c = dir.path().join("c");
        std::fs::write(&a, "x").unwrap();
        std::fs::write(&b, "x").unwrap();
        std::fs::write(&c, "y").unwrap();
        assert!(same_content(&a, &b).unwrap());
        assert!(!same_content(&a, &c).unwrap());
    }
}
