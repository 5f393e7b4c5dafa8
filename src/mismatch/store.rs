//! Numbered mismatch-directory allocation

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{KeepsakeError, Result};

/// Name prefix for mismatch artifact directories.
pub const MISMATCH_DIR_PREFIX: &str = "cppmismatch-";

/// Highest slot number probed before allocation gives up.
pub const MAX_SLOTS: usize = 4096;

/// Allocate the lowest free numbered directory under `root`.
///
/// Finds the lowest non-negative `n` such that `root/cppmismatch-<n>` does
/// not yet exist and creates it. The directory is deliberately left behind
/// when the process exits so a human can inspect the artifacts.
///
/// Existence is re-checked right before creation, which narrows but does
/// not eliminate the race against concurrent test runners sharing `root`.
///
/// # Errors
///
/// Returns [`KeepsakeError::DirAllocation`] if the directory cannot be
/// created or every slot up to [`MAX_SLOTS`] is taken. Creation failure is
/// fatal, never retried.
pub fn allocate_in(root: &Path) -> Result<PathBuf> {
    for n in 0..MAX_SLOTS {
        let dir = root.join(format!("{MISMATCH_DIR_PREFIX}{n}"));
        if dir.exists() {
            continue;
        }

        return match fs::create_dir(&dir) {
            Ok(()) => {
                debug!("Allocated mismatch directory: {}", dir.display());
                Ok(dir)
            }
            Err(e) => Err(KeepsakeError::DirAllocation {
                path: dir,
                reason: e.to_string(),
            }),
        };
    }

    Err(KeepsakeError::DirAllocation {
        path: root.to_path_buf(),
        reason: format!("all {MAX_SLOTS} slots are taken"),
    })
}

/// Allocate a mismatch directory under the system temp directory.
///
/// # Errors
///
/// Returns [`KeepsakeError::DirAllocation`] if no slot can be created.
pub fn allocate() -> Result<PathBuf> {
    allocate_in(&env::temp_dir())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_allocate_first_slot() {
        let temp_dir = TempDir::new().unwrap();

        let dir = allocate_in(temp_dir.path()).unwrap();
        assert_eq!(dir, temp_dir.path().join("cppmismatch-0"));
        assert!(dir.is_dir());
    }

    #[test]
    fn test_consecutive_allocations_are_distinct() {
        let temp_dir = TempDir::new().unwrap();

        let mut dirs = Vec::new();
        for n in 0..5 {
            let dir = allocate_in(temp_dir.path()).unwrap();
            assert_eq!(dir, temp_dir.path().join(format!("cppmismatch-{n}")));
            assert!(dir.is_dir());
            dirs.push(dir);
        }

        dirs.dedup();
        assert_eq!(dirs.len(), 5);
    }

    #[test]
    fn test_allocation_skips_taken_slots() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("cppmismatch-0")).unwrap();
        fs::create_dir(temp_dir.path().join("cppmismatch-1")).unwrap();

        let dir = allocate_in(temp_dir.path()).unwrap();
        assert_eq!(dir, temp_dir.path().join("cppmismatch-2"));
    }

    #[test]
    fn test_allocation_failure_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let missing_root = temp_dir.path().join("no_such_root");

        let err = allocate_in(&missing_root).unwrap_err();
        assert!(matches!(err, KeepsakeError::DirAllocation { .. }));
    }
}
