//! Custom error types for the backup reconciler.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Path does not exist: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Path is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Cannot write to output file: {}", .0.display())]
    UnwritableDestination(PathBuf),

    #[error("No valid backup index found")]
    NoIndex,

    #[error("The backup drive ({}) is not connected", .0.display())]
    DriveNotConnected(PathBuf),

    #[error(
        "Volume mismatch! Expected label: '{expected}', found label: '{found}'. \
         Connect the correct drive or rebuild the index."
    )]
    VolumeMismatch { expected: String, found: String },

    #[error("No matching backup folder found for {0}")]
    NoMatchingFolder(String),
}

/// Stable substring callers match on to treat a folder as brand-new
/// instead of failed (see `ops::BackupComparison`).
pub const NO_MATCH_MARKER: &str = "No matching backup folder found";

pub type Result<T> = std::result::Result<T, ReconcileError>;
