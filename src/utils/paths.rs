//! Path separator handling.
//!
//! Index manifests may be produced on one platform and read on another, so
//! entries can contain `\` or `/` regardless of the current OS. All internal
//! comparisons run on a single canonical separator (`/`); conversion to the
//! platform convention happens only at the output boundary.

use std::path::MAIN_SEPARATOR;

/// Normalize a path string to forward slashes with no trailing separator.
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/").trim_end_matches('/').to_string()
}

/// Convert a normalized (forward-slash) path to the platform separator.
pub fn to_platform_separator(path: &str) -> String {
    if MAIN_SEPARATOR == '/' {
        path.to_string()
    } else {
        path.replace('/', &MAIN_SEPARATOR.to_string())
    }
}

/// Final component of a normalized path, lowercased for case-insensitive
/// folder-name matching.
pub fn final_component_lower(normalized: &str) -> String {
    normalized
        .rsplit('/')
        .next()
        .unwrap_or(normalized)
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_backslashes() {
        assert_eq!(normalize_path("E:\\Backup\\Photos\\"), "E:/Backup/Photos");
    }

    #[test]
    fn test_normalize_trailing_slash() {
        assert_eq!(normalize_path("/media/backup/"), "/media/backup");
    }

    #[test]
    fn test_normalize_empty() {
        assert_eq!(normalize_path(""), "");
    }

    #[test]
    fn test_final_component() {
        assert_eq!(final_component_lower("E:/Backup/MP3 Archiv"), "mp3 archiv");
        assert_eq!(final_component_lower("Photos"), "photos");
    }

    #[test]
    #[cfg(unix)]
    fn test_platform_separator_is_identity_on_unix() {
        assert_eq!(to_platform_separator("a/b/c"), "a/b/c");
    }
}
