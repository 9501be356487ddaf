//! Sync executor: copies the missing files from a local root to the backup.

use crate::utils::errors::{ReconcileError, Result};
use filetime::FileTime;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Outcome of one sync request. Every input path lands in exactly one of
/// the two lists: `synced` in input order, or `errors` as
/// `(relative_path, message)`.
#[derive(Debug, Clone, Default)]
pub struct SyncOutcome {
    pub synced: Vec<String>,
    pub errors: Vec<(String, String)>,
}

/// Copy the given relative paths from `source_root` to `target_root`.
///
/// Intermediate target directories are created per file; the copy preserves
/// permission bits and modification time where the platform allows. One bad
/// file never aborts the batch: its error is recorded and iteration
/// continues with the next path.
pub fn sync_files(files_to_sync: &[String], source_root: &Path, target_root: &Path) -> Result<SyncOutcome> {
    sync_files_with_progress(files_to_sync, source_root, target_root, |_, _, _, _| {})
}

/// Like [`sync_files`], with a progress callback invoked exactly once per
/// input path as `(current_1_based, total, relative_path, error)` after that
/// path's outcome is known.
pub fn sync_files_with_progress<F>(
    files_to_sync: &[String],
    source_root: &Path,
    target_root: &Path,
    mut callback: F,
) -> Result<SyncOutcome>
where
    F: FnMut(usize, usize, &str, Option<&str>),
{
    if !source_root.exists() {
        return Err(ReconcileError::NotFound(source_root.to_path_buf()));
    }

    let total = files_to_sync.len();
    let mut outcome = SyncOutcome::default();

    for (i, rel_path) in files_to_sync.iter().enumerate() {
        let src = source_root.join(rel_path);
        let dst = target_root.join(rel_path);

        match copy_preserving_mtime(&src, &dst) {
            Ok(()) => {
                debug!("Synced {rel_path}");
                outcome.synced.push(rel_path.clone());
                callback(i + 1, total, rel_path, None);
            }
            Err(e) => {
                let message = e.to_string();
                warn!("Failed to sync {rel_path}: {message}");
                callback(i + 1, total, rel_path, Some(&message));
                outcome.errors.push((rel_path.clone(), message));
            }
        }
    }

    Ok(outcome)
}

/// Copy one file, creating parent directories and carrying the source mtime
/// over to the destination. Permission bits ride along with `fs::copy`.
fn copy_preserving_mtime(src: &Path, dst: &Path) -> std::io::Result<()> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(src, dst)?;

    let src_meta = fs::metadata(src)?;
    filetime::set_file_mtime(dst, FileTime::from_last_modification_time(&src_meta))?;
    Ok(())
}
