//! Inventory scanner: walks a backup root and writes the index manifest.

use crate::fs::volume::volume_label;
use crate::fs::walker::mtime_seconds;
use crate::index::manifest::ManifestWriter;
use crate::utils::errors::{ReconcileError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Recursively scan `root_path` and write every directory and file, with
/// mtimes, into the manifest at `output_file`.
///
/// The root is canonicalized before being recorded so later prefix matching
/// is stable regardless of how the caller spelled the path. The previous
/// manifest, if any, is replaced atomically: the new one is written to a
/// temporary sibling and renamed into place only on success.
pub fn scan_backup(root_path: &Path, output_file: &Path) -> Result<()> {
    scan_backup_with_progress(root_path, output_file, |_, _| {})
}

/// Like [`scan_backup`], with a progress callback invoked as
/// `(directories_visited_so_far, current_directory)` once after each
/// directory's section is written.
pub fn scan_backup_with_progress<F>(
    root_path: &Path,
    output_file: &Path,
    mut callback: F,
) -> Result<()>
where
    F: FnMut(usize, &Path),
{
    if !root_path.exists() {
        return Err(ReconcileError::NotFound(root_path.to_path_buf()));
    }
    if !root_path.is_dir() {
        return Err(ReconcileError::NotADirectory(root_path.to_path_buf()));
    }
    let root_path = root_path.canonicalize()?;

    if let Some(parent) = output_file.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let label = volume_label(&root_path);
    let mut writer = ManifestWriter::create(output_file, &root_path, label.as_deref())?;

    let mut count = 0usize;
    scan_directory(&root_path, &mut writer, &mut count, &mut callback)?;

    writer.finish()?;
    info!(
        "Scanned {} directories under {} into {}",
        count,
        root_path.display(),
        output_file.display()
    );
    Ok(())
}

/// Write one section for `dir`, then recurse into its subdirectories in
/// lexicographic order.
fn scan_directory<F>(
    dir: &Path,
    writer: &mut ManifestWriter,
    count: &mut usize,
    callback: &mut F,
) -> Result<()>
where
    F: FnMut(usize, &Path),
{
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            // An unreadable directory is skipped, not fatal to the scan.
            warn!("Skipping unreadable directory {}: {}", dir.display(), e);
            return Ok(());
        }
    };

    let mut subdirs: Vec<PathBuf> = Vec::new();
    let mut files: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let Ok(entry) = entry else { continue };
        match entry.file_type() {
            Ok(ft) if ft.is_dir() => subdirs.push(entry.path()),
            Ok(_) => files.push(entry.path()),
            Err(e) => {
                warn!("Skipping entry {}: {}", entry.path().display(), e);
            }
        }
    }

    // Stable lexicographic order within each section, for diffable
    // manifests and deterministic tests.
    subdirs.sort_by_key(|p| p.file_name().map(|n| n.to_os_string()));
    files.sort_by_key(|p| p.file_name().map(|n| n.to_os_string()));

    writer.begin_section(dir)?;
    for sub in &subdirs {
        writer.dir_entry(sub)?;
    }
    for file in &files {
        // A file whose mtime cannot be read is still recorded, with no
        // suffix; readers treat that as mtime 0.0.
        writer.file_entry(file, mtime_seconds(file))?;
    }
    writer.end_section()?;

    *count += 1;
    callback(*count, dir);

    for sub in &subdirs {
        scan_directory(sub, writer, count, callback)?;
    }
    Ok(())
}
