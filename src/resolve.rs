//! Upward path resolution
//!
//! Tests are often invoked from a build or source subdirectory, so a
//! project-relative path like `test/recordings` is searched for in the
//! working directory and every ancestor up to the filesystem root. The
//! first existing candidate wins.

use std::env;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{KeepsakeError, Result};

/// Search for `relative` in `start` and every ancestor of `start`.
///
/// An absolute `relative` bypasses the walk entirely and is returned as-is
/// if it exists.
///
/// # Errors
///
/// Returns [`KeepsakeError::PathResolution`] carrying the full ordered list
/// of attempted candidates if no ancestor yields a match.
pub fn find_upward_from(start: &Path, relative: &Path) -> Result<PathBuf> {
    if relative.is_absolute() {
        if relative.exists() {
            return Ok(relative.to_path_buf());
        }
        return Err(KeepsakeError::PathResolution {
            path: relative.to_path_buf(),
            searched: vec![relative.to_path_buf()],
        });
    }

    let mut searched = Vec::new();
    let mut current = Some(start);

    while let Some(dir) = current {
        let candidate = dir.join(relative);
        if candidate.exists() {
            debug!("Resolved {} to {}", relative.display(), candidate.display());
            return Ok(candidate);
        }
        searched.push(candidate);
        current = dir.parent();
    }

    Err(KeepsakeError::PathResolution {
        path: relative.to_path_buf(),
        searched,
    })
}

/// Search for `relative` upward from the current working directory.
///
/// # Errors
///
/// Returns [`KeepsakeError::PathResolution`] if no ancestor of the working
/// directory contains `relative`, or an I/O error if the working directory
/// cannot be determined.
pub fn find_upward(relative: &Path) -> Result<PathBuf> {
    let cwd = env::current_dir()?;
    find_upward_from(&cwd, relative)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_find_in_start_dir() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("target")).unwrap();

        let found = find_upward_from(temp_dir.path(), Path::new("target")).unwrap();
        assert_eq!(found, temp_dir.path().join("target"));
    }

    #[test]
    fn test_find_two_levels_up() {
        let temp_dir = TempDir::new().unwrap();
        let leaf = temp_dir.path().join("e").join("f");
        fs::create_dir_all(&leaf).unwrap();
        fs::create_dir(temp_dir.path().join("target")).unwrap();

        let found = find_upward_from(&leaf, Path::new("target")).unwrap();
        assert_eq!(found, temp_dir.path().join("target"));
    }

    #[test]
    fn test_not_found_carries_search_trail() {
        let temp_dir = TempDir::new().unwrap();
        let leaf = temp_dir.path().join("e").join("f");
        fs::create_dir_all(&leaf).unwrap();

        let err = find_upward_from(&leaf, Path::new("no_such_dir")).unwrap_err();
        match err {
            KeepsakeError::PathResolution { path, searched } => {
                assert_eq!(path, Path::new("no_such_dir"));
                // One candidate per directory from the leaf to the root
                assert_eq!(searched.len(), leaf.components().count());
                assert_eq!(searched[0], leaf.join("no_such_dir"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_absolute_path_bypasses_walk() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("target");
        fs::create_dir(&target).unwrap();

        // Start directory is irrelevant for absolute inputs
        let found = find_upward_from(Path::new("/nonexistent"), &target).unwrap();
        assert_eq!(found, target);
    }

    #[test]
    fn test_absolute_path_missing() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("missing");

        let err = find_upward_from(temp_dir.path(), &target).unwrap_err();
        assert!(matches!(err, KeepsakeError::PathResolution { .. }));
    }

    #[test]
    fn test_nearest_ancestor_wins() {
        let temp_dir = TempDir::new().unwrap();
        let leaf = temp_dir.path().join("e").join("f");
        fs::create_dir_all(&leaf).unwrap();
        fs::create_dir(temp_dir.path().join("target")).unwrap();
        fs::create_dir(temp_dir.path().join("e").join("target")).unwrap();

        let found = find_upward_from(&leaf, Path::new("target")).unwrap();
        assert_eq!(found, temp_dir.path().join("e").join("target"));
    }
}
