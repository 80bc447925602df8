//! Artifact inspection and build folder housekeeping.

use std::path::{Path, PathBuf};

use bytesize::ByteSize;
use walkdir::WalkDir;

use crate::error::{BuildError, Result};

/// On-disk size of an artifact: file length, or the recursive sum for a
/// directory artifact. `None` when nothing exists at `path` or the directory
/// holds no files.
pub fn measure(path: &Path) -> Option<u64> {
    let meta = std::fs::metadata(path).ok()?;
    if meta.is_file() {
        return Some(meta.len());
    }
    let sizes: Vec<u64> = WalkDir::new(path)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.metadata().ok())
        .map(|meta| meta.len())
        .collect();
    if sizes.is_empty() {
        return None;
    }
    Some(sizes.iter().sum())
}

/// Find an artifact with extension `ext`.
///
/// `path` may be the artifact itself or a (versioned) directory holding it;
/// in a directory the first match in name order wins.
pub fn locate(path: &Path, ext: &str) -> Result<PathBuf> {
    if path.is_file() {
        if path.extension().and_then(|e| e.to_str()) == Some(ext) {
            return Ok(path.to_path_buf());
        }
        return Err(BuildError::ArtifactNotFound(path.to_path_buf()));
    }

    if path.is_dir() {
        let pattern = format!(
            "{}/*.{}",
            glob::Pattern::escape(&path.to_string_lossy()),
            ext
        );
        let mut matches: Vec<PathBuf> = glob::glob(&pattern)
            .map_err(|e| BuildError::Config(format!("invalid artifact pattern: {e}")))?
            .filter_map(|entry| entry.ok())
            .filter(|p| p.is_file())
            .collect();
        matches.sort();
        if let Some(first) = matches.into_iter().next() {
            return Ok(first);
        }
    }

    Err(BuildError::ArtifactNotFound(path.to_path_buf()))
}

/// Remove a build folder tree. Returns whether anything was there.
pub fn clean(root: &Path) -> Result<bool> {
    if !root.exists() {
        return Ok(false);
    }
    std::fs::remove_dir_all(root)?;
    Ok(true)
}

/// Binary-unit size string, e.g. `512 B`, `1.5 MiB`.
pub fn format_size(bytes: u64) -> String {
    ByteSize::b(bytes).to_string_as(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure_file_and_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("Game.apk");
        std::fs::write(&file, vec![0u8; 100]).unwrap();
        let nested = dir.path().join("Data");
        std::fs::create_dir(&nested).unwrap();
        std::fs::write(nested.join("level0"), vec![0u8; 28]).unwrap();

        assert_eq!(measure(&file), Some(100));
        assert_eq!(measure(dir.path()), Some(128));
        assert_eq!(measure(&dir.path().join("missing.aab")), None);
    }

    #[test]
    fn test_measure_empty_directory_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("Game");
        std::fs::create_dir_all(project.join("Classes")).unwrap();
        assert_eq!(measure(&project), None);

        std::fs::write(project.join("Classes/main.mm"), b"").unwrap();
        assert_eq!(measure(&project), Some(0));
    }

    #[test]
    fn test_locate_direct_file() {
        let dir = tempfile::tempdir().unwrap();
        let aab = dir.path().join("Game.aab");
        std::fs::write(&aab, b"bundle").unwrap();
        assert_eq!(locate(&aab, "aab").unwrap(), aab);
        assert!(locate(&aab, "apk").is_err());
    }

    #[test]
    fn test_locate_in_directory_picks_first_by_name() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.aab"), b"b").unwrap();
        std::fs::write(dir.path().join("a.aab"), b"a").unwrap();
        std::fs::write(dir.path().join("c.apk"), b"c").unwrap();
        assert_eq!(locate(dir.path(), "aab").unwrap(), dir.path().join("a.aab"));
    }

    #[test]
    fn test_locate_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = locate(dir.path(), "aab").unwrap_err();
        assert!(matches!(err, BuildError::ArtifactNotFound(_)));
        assert!(locate(&dir.path().join("nope"), "aab").is_err());
    }

    #[test]
    fn test_clean() {
        let dir = tempfile::tempdir().unwrap();
        let builds = dir.path().join("Builds");
        std::fs::create_dir_all(builds.join("Windows/1.0.0")).unwrap();
        assert!(clean(&builds).unwrap());
        assert!(!builds.exists());
        assert!(!clean(&builds).unwrap());
    }

    #[test]
    fn test_format_size_small_values() {
        assert_eq!(format_size(512), "512 B");
    }
}
