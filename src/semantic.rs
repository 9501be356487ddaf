//! Seam for the external semantic folder finder.
//!
//! The reconciliation core never embeds, retrieves, or calls a language
//! model itself. When direct name lookup in the index fails, the
//! orchestrator may delegate to an injected [`FolderMatcher`] as a fallback
//! oracle. Its answer is trusted only if it looks like a path (contains a
//! separator); anything else is treated as "no match".

/// Resolve a free-text folder-name token to a best-guess backup path.
pub trait FolderMatcher {
    fn resolve_folder(&self, folder_name: &str) -> Option<String>;
}

impl<F> FolderMatcher for F
where
    F: Fn(&str) -> Option<String>,
{
    fn resolve_folder(&self, folder_name: &str) -> Option<String> {
        self(folder_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_as_matcher() {
        let matcher = |name: &str| {
            if name == "Photos" {
                Some("/backup/Photos".to_string())
            } else {
                None
            }
        };
        assert_eq!(
            matcher.resolve_folder("Photos").as_deref(),
            Some("/backup/Photos")
        );
        assert!(matcher.resolve_folder("Music").is_none());
    }
}
