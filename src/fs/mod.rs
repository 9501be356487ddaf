//! Filesystem probes: live folder listings and volume identity.

pub mod volume;
pub mod walker;
