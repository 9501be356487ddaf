//! Backup index: manifest grammar, queries, and the inventory scanner.

pub mod manifest;
pub mod scanner;

pub use manifest::{files_under, find_folder, metadata, IndexMetadata, ManifestWriter};
pub use scanner::{scan_backup, scan_backup_with_progress};
