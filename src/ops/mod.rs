//! Reconciliation orchestrator: drive verification, folder resolution, and
//! comparison packaging.
//!
//! One request runs the state machine: verify volume identity, validate the
//! local input, resolve the backup folder (index lookup first, injected
//! semantic matcher as fallback), then diff. The orchestrator performs no
//! mutation; syncing is a separate caller-driven step consuming the
//! comparison's resolved backup path and only-local list.

use crate::compare::{compare_folders, BackupListing, FolderDiff};
use crate::fs::volume::volume_label;
use crate::index::manifest;
use crate::semantic::FolderMatcher;
use crate::utils::errors::{ReconcileError, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Result of comparing one local folder with its backup counterpart.
///
/// Always constructed, never thrown: failures from any sub-step land in
/// `error` so callers receive a value from the top-level entry point. The
/// "no matching backup folder" condition is recognizable by the stable
/// [`crate::utils::errors::NO_MATCH_MARKER`] substring and usually means
/// "brand-new folder", not a hard failure.
#[derive(Debug, Clone)]
pub struct BackupComparison {
    pub local_path: PathBuf,
    pub backup_path: Option<PathBuf>,
    pub only_local: Vec<String>,
    pub only_backup: Vec<String>,
    pub in_both: Vec<String>,
    pub error: Option<String>,
}

impl BackupComparison {
    fn failed(local_path: &Path, error: String) -> Self {
        Self {
            local_path: local_path.to_path_buf(),
            backup_path: None,
            only_local: Vec::new(),
            only_backup: Vec::new(),
            in_both: Vec::new(),
            error: Some(error),
        }
    }
}

/// High-level operations against one backup index.
pub struct BackupOperations {
    index_path: PathBuf,
    matcher: Option<Box<dyn FolderMatcher>>,
    label_probe: fn(&Path) -> Option<String>,
}

impl BackupOperations {
    pub fn new(index_path: PathBuf) -> Self {
        Self {
            index_path,
            matcher: None,
            label_probe: volume_label,
        }
    }

    /// Attach a semantic folder matcher used when direct lookup fails.
    pub fn with_matcher(mut self, matcher: Box<dyn FolderMatcher>) -> Self {
        self.matcher = Some(matcher);
        self
    }

    /// Override the volume-label probe (tests, alternate platforms).
    pub fn with_label_probe(mut self, probe: fn(&Path) -> Option<String>) -> Self {
        self.label_probe = probe;
        self
    }

    /// Verify that the connected drive is the one the index was built for.
    ///
    /// Fails closed: a recorded label that differs from the currently probed
    /// label blocks comparison and sync; only an explicit re-scan (or a
    /// caller-level force) clears the conflict.
    pub fn verify_backup_drive(&self) -> Result<()> {
        let metadata = manifest::metadata(&self.index_path);
        let Some(root_path) = metadata.root_path else {
            return Err(ReconcileError::NoIndex);
        };
        if !root_path.exists() {
            return Err(ReconcileError::DriveNotConnected(root_path));
        }

        if let Some(expected) = metadata.label {
            if let Some(found) = (self.label_probe)(&root_path) {
                if found != expected {
                    return Err(ReconcileError::VolumeMismatch { expected, found });
                }
            }
        }
        Ok(())
    }

    /// Find the backup folder matching `local_path` and compare contents.
    pub fn find_and_compare(&self, local_path: &Path) -> BackupComparison {
        if let Err(e) = self.verify_backup_drive() {
            return BackupComparison::failed(local_path, e.to_string());
        }

        if !local_path.exists() {
            return BackupComparison::failed(
                local_path,
                format!("Local path does not exist: {}", local_path.display()),
            );
        }

        // Lookup token: the final path component, or the whole spelling for
        // a bare drive root.
        let folder_name = local_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| local_path.display().to_string());

        let mut backup_folder = manifest::find_folder(&folder_name, &self.index_path);

        if backup_folder.is_none() {
            if let Some(matcher) = &self.matcher {
                info!("No direct index match for {folder_name}, trying semantic search...");
                backup_folder = matcher
                    .resolve_folder(&folder_name)
                    .filter(|p| p.contains('/') || p.contains('\\'));
            }
        }

        let Some(backup_folder) = backup_folder else {
            return BackupComparison::failed(
                local_path,
                ReconcileError::NoMatchingFolder(folder_name).to_string(),
            );
        };

        let backup_files = manifest::files_under(&backup_folder, &self.index_path);
        let diff: FolderDiff =
            match compare_folders(local_path, &BackupListing::WithMtimes(backup_files)) {
                Ok(diff) => diff,
                Err(e) => {
                    warn!("Comparison failed for {}: {e}", local_path.display());
                    return BackupComparison::failed(local_path, e.to_string());
                }
            };

        BackupComparison {
            local_path: local_path.to_path_buf(),
            backup_path: Some(PathBuf::from(backup_folder)),
            only_local: diff.only_local,
            only_backup: diff.only_backup,
            in_both: diff.in_both,
            error: None,
        }
    }
}
