//! Live directory listings for comparison against the backup index.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::SystemTime;
use tracing::warn;
use walkdir::WalkDir;

/// Modification time of a file as float seconds since the Unix epoch.
///
/// Returns `None` if metadata cannot be read; downstream code treats a
/// missing mtime as 0.0 ("older than everything").
pub fn mtime_seconds(path: &Path) -> Option<f64> {
    let metadata = fs::metadata(path).ok()?;
    let modified = metadata.modified().ok()?;
    modified
        .duration_since(SystemTime::UNIX_EPOCH)
        .ok()
        .map(|d| d.as_secs_f64())
}

/// Recursively list all files under `folder`, keyed by path relative to it
/// (platform separator convention), mapped to mtime in float seconds.
///
/// A missing folder yields an empty listing. Unreadable entries are skipped;
/// unreadable mtimes are recorded as 0.0 rather than dropping the file.
pub fn folder_listing(folder: &Path) -> BTreeMap<String, f64> {
    let mut files = BTreeMap::new();
    if !folder.exists() {
        return files;
    }

    for entry in WalkDir::new(folder) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("Skipping unreadable entry under {}: {}", folder.display(), e);
                continue;
            }
        };

        if entry.file_type().is_dir() {
            continue;
        }

        let rel = entry
            .path()
            .strip_prefix(folder)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .to_string();
        let mtime = mtime_seconds(entry.path()).unwrap_or(0.0);
        files.insert(rel, mtime);
    }

    files
}
