//! Folder diff engine: classifies relative paths into only-local,
//! only-backup, and in-both, with modification-time tie-breaking.

use crate::fs::walker::folder_listing;
use crate::utils::errors::{ReconcileError, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Filesystem timestamps carry resolution jitter; a local file counts as
/// newer than its backup copy only beyond this tolerance (seconds).
pub const MTIME_TOLERANCE_SECS: f64 = 0.1;

/// Backup-side file listing: either bare paths, or paths with mtimes
/// (sourced from the index manifest). Staleness refinement only applies
/// when mtimes are available.
#[derive(Debug, Clone)]
pub enum BackupListing {
    Paths(BTreeSet<String>),
    WithMtimes(BTreeMap<String, f64>),
}

impl From<BTreeMap<String, f64>> for BackupListing {
    fn from(files: BTreeMap<String, f64>) -> Self {
        BackupListing::WithMtimes(files)
    }
}

impl From<Vec<String>> for BackupListing {
    fn from(paths: Vec<String>) -> Self {
        BackupListing::Paths(paths.into_iter().collect())
    }
}

/// Result of one folder comparison. Derived, transient, recomputed on every
/// call; the three lists are disjoint, lexicographically sorted, and their
/// union covers every path seen on either side.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderDiff {
    pub only_local: Vec<String>,
    pub only_backup: Vec<String>,
    pub in_both: Vec<String>,
}

/// Compare the live contents of `local_path` against a backup-side listing.
///
/// "In both" means the backup copy is at least as fresh as the local one: a
/// path present on both sides whose local mtime exceeds the backup mtime by
/// more than [`MTIME_TOLERANCE_SECS`] is classified as only-local so it gets
/// synced again.
pub fn compare_folders(local_path: &Path, backup_files: &BackupListing) -> Result<FolderDiff> {
    if !local_path.exists() {
        return Err(ReconcileError::NotFound(local_path.to_path_buf()));
    }
    if !local_path.is_dir() {
        return Err(ReconcileError::NotADirectory(local_path.to_path_buf()));
    }

    let local_files = folder_listing(local_path);
    let local_paths: BTreeSet<&String> = local_files.keys().collect();

    let backup_paths: BTreeSet<&String> = match backup_files {
        BackupListing::Paths(paths) => paths.iter().collect(),
        BackupListing::WithMtimes(files) => files.keys().collect(),
    };

    let mut only_local: BTreeSet<&String> = local_paths.difference(&backup_paths).copied().collect();
    let only_backup: BTreeSet<&String> = backup_paths.difference(&local_paths).copied().collect();
    let mut in_both: BTreeSet<&String> = local_paths.intersection(&backup_paths).copied().collect();

    if let BackupListing::WithMtimes(backup_mtimes) = backup_files {
        let newer_locally: Vec<&String> = in_both
            .iter()
            .filter(|path| {
                let local_mtime = local_files.get(**path).copied().unwrap_or(0.0);
                let backup_mtime = backup_mtimes.get(**path).copied().unwrap_or(0.0);
                local_mtime > backup_mtime + MTIME_TOLERANCE_SECS
            })
            .copied()
            .collect();
        for path in newer_locally {
            in_both.remove(path);
            only_local.insert(path);
        }
    }

    Ok(FolderDiff {
        only_local: only_local.into_iter().cloned().collect(),
        only_backup: only_backup.into_iter().cloned().collect(),
        in_both: in_both.into_iter().cloned().collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn backup_with_mtimes(entries: &[(&str, f64)]) -> BackupListing {
        BackupListing::WithMtimes(
            entries
                .iter()
                .map(|(p, m)| (p.to_string(), *m))
                .collect(),
        )
    }

    #[test]
    fn test_missing_local_path() {
        let temp_dir = TempDir::new().unwrap();
        let err = compare_folders(
            &temp_dir.path().join("nope"),
            &BackupListing::Paths(BTreeSet::new()),
        )
        .unwrap_err();
        assert!(matches!(err, ReconcileError::NotFound(_)));
    }

    #[test]
    fn test_local_path_not_a_directory() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("f.txt");
        fs::write(&file, b"x").unwrap();
        let err = compare_folders(&file, &BackupListing::Paths(BTreeSet::new())).unwrap_err();
        assert!(matches!(err, ReconcileError::NotADirectory(_)));
    }

    #[test]
    fn test_three_way_classification() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("shared.txt"), b"s").unwrap();
        fs::write(temp_dir.path().join("local_only.txt"), b"l").unwrap();

        let now = crate::fs::walker::mtime_seconds(&temp_dir.path().join("shared.txt")).unwrap();
        let backup = backup_with_mtimes(&[("shared.txt", now), ("backup_only.txt", now)]);

        let diff = compare_folders(temp_dir.path(), &backup).unwrap();
        assert_eq!(diff.only_local, vec!["local_only.txt"]);
        assert_eq!(diff.only_backup, vec!["backup_only.txt"]);
        assert_eq!(diff.in_both, vec!["shared.txt"]);
    }

    #[test]
    fn test_sets_disjoint_and_union_complete() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.txt"), b"a").unwrap();
        fs::write(temp_dir.path().join("b.txt"), b"b").unwrap();

        let backup = backup_with_mtimes(&[("b.txt", 0.0), ("c.txt", 0.0)]);
        let diff = compare_folders(temp_dir.path(), &backup).unwrap();

        let mut all: Vec<&String> = diff
            .only_local
            .iter()
            .chain(diff.only_backup.iter())
            .chain(diff.in_both.iter())
            .collect();
        all.sort();
        let len_before = all.len();
        all.dedup();
        assert_eq!(all.len(), len_before, "classifications overlap");
        assert_eq!(len_before, 3);
    }

    #[test]
    fn test_newer_local_file_is_only_local() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("file1.txt");
        fs::write(&file, b"new").unwrap();
        let local_mtime = crate::fs::walker::mtime_seconds(&file).unwrap();

        // Backup copy is 0.2 s older than local: beyond tolerance.
        let backup = backup_with_mtimes(&[("file1.txt", local_mtime - 0.2)]);
        let diff = compare_folders(temp_dir.path(), &backup).unwrap();
        assert_eq!(diff.only_local, vec!["file1.txt"]);
        assert!(diff.in_both.is_empty());
    }

    #[test]
    fn test_equal_mtime_is_in_both() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("file1.txt");
        fs::write(&file, b"same").unwrap();
        let local_mtime = crate::fs::walker::mtime_seconds(&file).unwrap();

        let backup = backup_with_mtimes(&[("file1.txt", local_mtime)]);
        let diff = compare_folders(temp_dir.path(), &backup).unwrap();
        assert!(diff.only_local.is_empty());
        assert_eq!(diff.in_both, vec!["file1.txt"]);
    }

    #[test]
    fn test_jitter_within_tolerance_stays_in_both() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("file1.txt");
        fs::write(&file, b"x").unwrap();
        let local_mtime = crate::fs::walker::mtime_seconds(&file).unwrap();

        let backup = backup_with_mtimes(&[("file1.txt", local_mtime - 0.05)]);
        let diff = compare_folders(temp_dir.path(), &backup).unwrap();
        assert_eq!(diff.in_both, vec!["file1.txt"]);
    }

    #[test]
    fn test_plain_path_set_skips_staleness() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("file1.txt"), b"x").unwrap();

        // No backup mtimes available: presence alone decides.
        let backup = BackupListing::from(vec!["file1.txt".to_string()]);
        let diff = compare_folders(temp_dir.path(), &backup).unwrap();
        assert!(diff.only_local.is_empty());
        assert_eq!(diff.in_both, vec!["file1.txt"]);
    }

    #[test]
    fn test_output_sorted_and_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        for name in ["z.txt", "a.txt", "m.txt"] {
            fs::write(temp_dir.path().join(name), b"x").unwrap();
        }

        let backup = backup_with_mtimes(&[("q.txt", 0.0)]);
        let first = compare_folders(temp_dir.path(), &backup).unwrap();
        assert_eq!(first.only_local, vec!["a.txt", "m.txt", "z.txt"]);

        let second = compare_folders(temp_dir.path(), &backup).unwrap();
        assert_eq!(first, second);
    }
}
