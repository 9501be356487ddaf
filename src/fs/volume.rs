//! Volume label probe for removable backup drives.
//!
//! Used as a safety check so a comparison or sync never silently runs
//! against the wrong physical drive after labels were swapped.

use std::path::Path;

/// Label of the volume containing `path`, or `None`.
///
/// Only Windows has a native label query here (`wmic logicaldisk`); on other
/// platforms, and on any probe failure, the answer is `None` rather than an
/// error. The probe is read-only and never panics.
#[cfg(windows)]
pub fn volume_label(path: &Path) -> Option<String> {
    use std::path::{Component, Prefix};
    use std::process::Command;

    let drive = match path.components().next()? {
        Component::Prefix(prefix) => match prefix.kind() {
            Prefix::Disk(letter) | Prefix::VerbatimDisk(letter) => {
                format!("{}:", letter as char)
            }
            _ => return None,
        },
        _ => return None,
    };

    let output = Command::new("wmic")
        .args([
            "logicaldisk",
            "where",
            &format!("name=\"{drive}\""),
            "get",
            "volumename",
        ])
        .output()
        .ok()?;

    // Expected output:
    //   VolumeName
    //   MyBackup
    let text = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    if lines.len() > 1 && lines[0].to_lowercase().starts_with("volumename") {
        Some(lines[1].to_string())
    } else {
        None
    }
}

#[cfg(not(windows))]
pub fn volume_label(_path: &Path) -> Option<String> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(windows))]
    fn test_no_label_on_non_windows() {
        assert_eq!(volume_label(Path::new("/media/backup")), None);
    }
}
