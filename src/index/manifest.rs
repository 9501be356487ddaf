//! The backup index manifest: a flat text inventory of one full drive scan.
//!
//! Grammar (one persisted artifact, written wholesale by a scan and
//! read-only until the next scan):
//!
//! ```text
//! # Backup Index
//!
//! Root: <abs-root>[ (Label: <volume-label>)]
//!
//! ## <abs-directory>
//!
//! - <abs-child-directory>/
//! - <abs-file>[ | mtime:<float-seconds>]
//! ```
//!
//! Directory entries carry a trailing separator; file entries optionally a
//! mtime suffix. Parsers tolerate entries without the suffix (mtime 0.0) and
//! accept either separator convention, since a manifest may be produced on
//! one platform and read on another.
//!
//! Every query here re-parses the manifest from scratch; there is no cached
//! state, so a manifest rewritten on disk is picked up on the next call.

use crate::utils::errors::{ReconcileError, Result};
use crate::utils::paths::{final_component_lower, normalize_path, to_platform_separator};
use chrono::{DateTime, Local};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf, MAIN_SEPARATOR};

const HEADER_TITLE: &str = "# Backup Index";
const ROOT_PREFIX: &str = "Root: ";
const LABEL_MARKER: &str = " (Label: ";
const SECTION_PREFIX: &str = "## ";
const ENTRY_PREFIX: &str = "- ";
const MTIME_SEPARATOR: &str = " | mtime:";

/// One classified manifest line.
#[derive(Debug, Clone, PartialEq)]
pub enum ManifestLine<'a> {
    Root { path: &'a str, label: Option<&'a str> },
    Section(&'a str),
    DirEntry(&'a str),
    FileEntry { path: &'a str, mtime: f64 },
    Other,
}

/// Classify a single manifest line.
pub fn classify(line: &str) -> ManifestLine<'_> {
    let line = line.trim_end();

    if let Some(rest) = line.strip_prefix(ROOT_PREFIX) {
        let rest = rest.trim();
        if let Some(pos) = rest.find(LABEL_MARKER) {
            let path = rest[..pos].trim_end();
            let label = rest[pos + LABEL_MARKER.len()..]
                .trim_end_matches(')')
                .trim();
            return ManifestLine::Root {
                path,
                label: Some(label),
            };
        }
        return ManifestLine::Root {
            path: rest,
            label: None,
        };
    }

    if let Some(rest) = line.strip_prefix(SECTION_PREFIX) {
        return ManifestLine::Section(rest.trim());
    }

    if let Some(rest) = line.strip_prefix(ENTRY_PREFIX) {
        let content = rest.trim();
        if content.ends_with('/') || content.ends_with('\\') {
            return ManifestLine::DirEntry(content);
        }
        if let Some((path, mtime_str)) = content.rsplit_once(MTIME_SEPARATOR) {
            if let Ok(mtime) = mtime_str.trim().parse::<f64>() {
                return ManifestLine::FileEntry { path, mtime };
            }
        }
        // No suffix, or a malformed one: keep the entry with mtime 0.0.
        return ManifestLine::FileEntry {
            path: content,
            mtime: 0.0,
        };
    }

    ManifestLine::Other
}

/// Incremental manifest writer.
///
/// Writes to a temporary sibling of the destination and renames it into
/// place on [`finish`](Self::finish), so a concurrent reader never observes
/// a half-written manifest.
#[derive(Debug)]
pub struct ManifestWriter {
    writer: BufWriter<File>,
    tmp_path: PathBuf,
    final_path: PathBuf,
}

impl ManifestWriter {
    /// Open a writer for `path` and emit the header for `root`.
    pub fn create(path: &Path, root: &Path, label: Option<&str>) -> Result<Self> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "backup_index.md".to_string());
        let tmp_path = path.with_file_name(format!(".{file_name}.tmp"));

        let file = File::create(&tmp_path)
            .map_err(|_| ReconcileError::UnwritableDestination(path.to_path_buf()))?;
        let mut writer = BufWriter::new(file);

        writeln!(writer, "{HEADER_TITLE}")?;
        writeln!(writer)?;
        match label {
            Some(label) => writeln!(writer, "{ROOT_PREFIX}{} (Label: {label})", root.display())?,
            None => writeln!(writer, "{ROOT_PREFIX}{}", root.display())?,
        }
        writeln!(writer)?;

        Ok(Self {
            writer,
            tmp_path,
            final_path: path.to_path_buf(),
        })
    }

    /// Open the section for one visited directory.
    pub fn begin_section(&mut self, dir: &Path) -> std::io::Result<()> {
        writeln!(self.writer, "{SECTION_PREFIX}{}", dir.display())?;
        writeln!(self.writer)
    }

    /// Structural pointer to a child directory (own section elsewhere).
    pub fn dir_entry(&mut self, dir: &Path) -> std::io::Result<()> {
        writeln!(self.writer, "{ENTRY_PREFIX}{}{MAIN_SEPARATOR}", dir.display())
    }

    /// File entry; `None` mtime records the file without a suffix.
    pub fn file_entry(&mut self, file: &Path, mtime: Option<f64>) -> std::io::Result<()> {
        match mtime {
            Some(mtime) => writeln!(
                self.writer,
                "{ENTRY_PREFIX}{}{MTIME_SEPARATOR}{mtime}",
                file.display()
            ),
            None => writeln!(self.writer, "{ENTRY_PREFIX}{}", file.display()),
        }
    }

    pub fn end_section(&mut self) -> std::io::Result<()> {
        writeln!(self.writer)
    }

    /// Flush and atomically move the manifest into place.
    pub fn finish(self) -> Result<()> {
        let file = self.writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        drop(file);
        fs::rename(&self.tmp_path, &self.final_path)?;
        Ok(())
    }
}

/// Identity and age of the backup index, derived on demand.
#[derive(Debug, Clone, Default)]
pub struct IndexMetadata {
    pub root_path: Option<PathBuf>,
    pub label: Option<String>,
    pub mtime: Option<DateTime<Local>>,
    pub age_days: i64,
}

/// Root identity and age of the manifest at `index_path`.
///
/// A missing manifest is a normal "no index yet" state and yields the
/// all-`None` default, not an error.
pub fn metadata(index_path: &Path) -> IndexMetadata {
    let Ok(file_meta) = fs::metadata(index_path) else {
        return IndexMetadata::default();
    };
    let mtime = file_meta.modified().ok().map(DateTime::<Local>::from);
    let age_days = mtime
        .map(|m| (Local::now() - m).num_days())
        .unwrap_or(0);

    let Ok(content) = fs::read_to_string(index_path) else {
        return IndexMetadata::default();
    };

    let mut root_path = None;
    let mut label = None;
    for line in content.lines() {
        if let ManifestLine::Root { path, label: l } = classify(line) {
            root_path = Some(PathBuf::from(path));
            label = l.map(str::to_string);
            break;
        }
    }

    IndexMetadata {
        root_path,
        label,
        mtime,
        age_days,
    }
}

/// First section header whose final path component matches `folder_name`.
///
/// The comparison is case-insensitive and accepts a substring match
/// ("Finanzen" matches "Finanzen (Backup)"). Ties resolve by document
/// order, not by any ranking; callers get the first header, which is not
/// necessarily the best match.
pub fn find_folder(folder_name: &str, index_path: &Path) -> Option<String> {
    let Ok(content) = fs::read_to_string(index_path) else {
        return None;
    };

    // The token may itself be a full path from either platform.
    let clean_name = final_component_lower(&normalize_path(folder_name));

    for line in content.lines() {
        if let ManifestLine::Section(header) = classify(line) {
            let header_name = final_component_lower(&normalize_path(header));
            if clean_name == header_name || header_name.contains(&clean_name) {
                return Some(header.to_string());
            }
        }
    }
    None
}

/// All file entries that live under `backup_root`, keyed by path relative to
/// it (platform separator convention), mapped to mtime.
///
/// A file qualifies only if its normalized path equals the root or starts
/// with root + `/`, so a sibling like "Photos2" never matches a "Photos"
/// query. Directory markers are excluded.
pub fn files_under(backup_root: &str, index_path: &Path) -> BTreeMap<String, f64> {
    let mut files = BTreeMap::new();
    let Ok(content) = fs::read_to_string(index_path) else {
        return files;
    };

    let norm_root = normalize_path(backup_root);

    for line in content.lines() {
        let ManifestLine::FileEntry { path, mtime } = classify(line) else {
            continue;
        };
        let norm_file = path.replace('\\', "/");
        let Some(remainder) = norm_file.strip_prefix(&norm_root) else {
            continue;
        };
        if !remainder.is_empty() && !remainder.starts_with('/') {
            continue;
        }
        let rel = remainder.trim_start_matches('/');
        if !rel.is_empty() {
            files.insert(to_platform_separator(rel), mtime);
        }
    }

    files
}
