//! Backup Reconciler Library
//!
//! Indexes a backup drive into a flat text manifest and reconciles local
//! folders against it: scan, three-way diff with mtime staleness, and
//! copy-the-missing sync with per-file progress.

pub mod compare;
pub mod config;
pub mod fs;
pub mod index;
pub mod ops;
pub mod semantic;
pub mod sync;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use utils::errors::ReconcileError;
pub type Result<T> = std::result::Result<T, ReconcileError>;
