//! Configuration management for the backup reconciler.
//!
//! Loads configuration from a TOML file; every section falls back to
//! defaults so a partial file is fine.

use crate::utils::errors::{ReconcileError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backup: BackupConfig,

    #[serde(default)]
    pub sync: SyncConfig,

    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupConfig {
    /// Root of the backup drive/folder
    #[serde(default = "default_backup_drive")]
    pub drive: PathBuf,

    /// Where the index manifest is written and read
    #[serde(default = "default_index_path")]
    pub index_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SyncConfig {
    /// Local folders to reconcile against the backup
    #[serde(default)]
    pub source_folders: Vec<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_backup_drive() -> PathBuf {
    PathBuf::from("/media/backup")
}

fn default_index_path() -> PathBuf {
    PathBuf::from("data/backup_index.md")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            drive: default_backup_drive(),
            index_path: default_index_path(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backup: BackupConfig::default(),
            sync: SyncConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &PathBuf) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Check that the backup drive exists and accepts writes.
    pub fn validate_backup_drive(&self) -> Result<()> {
        if !self.backup.drive.exists() {
            return Err(ReconcileError::Config(format!(
                "Backup drive not found: {}",
                self.backup.drive.display()
            )));
        }

        let test_file = self.backup.drive.join(".backup_test");
        fs::write(&test_file, b"")
            .map_err(|_| ReconcileError::UnwritableDestination(self.backup.drive.clone()))?;
        let _ = fs::remove_file(&test_file);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.backup.drive, PathBuf::from("/media/backup"));
        assert_eq!(config.backup.index_path, PathBuf::from("data/backup_index.md"));
        assert!(config.sync.source_folders.is_empty());
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("backup_config.toml");
        fs::write(
            &path,
            r#"
[backup]
drive = "/mnt/usb"
index_path = "data/index.md"

[sync]
source_folders = ["/home/me/Documents", "/home/me/Photos"]
"#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.backup.drive, PathBuf::from("/mnt/usb"));
        assert_eq!(config.sync.source_folders.len(), 2);
        // Omitted [log] section falls back to defaults.
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_partial_file_uses_section_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("backup_config.toml");
        fs::write(&path, "[log]\nlevel = \"debug\"\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.log.level, "debug");
        assert_eq!(config.backup.drive, PathBuf::from("/media/backup"));
    }

    #[test]
    fn test_validate_missing_drive() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.backup.drive = temp_dir.path().join("nope");
        assert!(matches!(
            config.validate_backup_drive().unwrap_err(),
            ReconcileError::Config(_)
        ));
    }

    #[test]
    fn test_validate_writable_drive() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.backup.drive = temp_dir.path().to_path_buf();
        assert!(config.validate_backup_drive().is_ok());
        assert!(!temp_dir.path().join(".backup_test").exists());
    }
}
