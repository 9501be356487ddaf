//! Utility modules for the backup reconciler.

pub mod errors;
pub mod logger;
pub mod paths;

pub use errors::{ReconcileError, Result};
