//! Backup Reconciler - Main entry point
//!
//! Indexes a backup drive into a text manifest and syncs missing or newer
//! local files across, with a per-folder end-of-run protocol.

use anyhow::{bail, Context, Result};
use backup_reconciler::fs::volume::volume_label;
use backup_reconciler::fs::walker::folder_listing;
use backup_reconciler::index::{manifest, scanner};
use backup_reconciler::ops::BackupOperations;
use backup_reconciler::sync::sync_files_with_progress;
use backup_reconciler::utils::errors::NO_MATCH_MARKER;
use backup_reconciler::{utils, Config};
use clap::{Parser, Subcommand};
use indicatif::ProgressBar;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan a backup drive and write the index manifest
    Scan {
        /// Root of the backup drive/folder to scan
        #[arg(long)]
        path: PathBuf,

        /// Output manifest path (defaults to the configured index path)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Re-scan the drive and reconcile all configured local folders
    Sync {
        /// Backup drive root (overrides config)
        #[arg(long)]
        backup_path: Option<PathBuf>,

        /// Proceed even if the drive label mismatches the existing index
        #[arg(long)]
        force: bool,
    },

    /// Compare one local folder against the index without copying
    Compare {
        /// Local folder to compare
        #[arg(long)]
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    let log_level = cli.log_level.as_deref().unwrap_or(&config.log.level);
    utils::logger::init(log_level)?;

    match cli.command {
        Command::Scan { path, output } => {
            let output = output.unwrap_or_else(|| config.backup.index_path.clone());
            run_scan(&path, &output)
        }
        Command::Sync { backup_path, force } => run_sync(config, backup_path, force),
        Command::Compare { path } => run_compare(&config, &path),
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => {
            let default_path = PathBuf::from("backup_config.toml");
            if default_path.exists() {
                Config::from_file(&default_path)
            } else {
                Ok(Config::default())
            }
        }
    }
}

fn run_scan(path: &PathBuf, output: &PathBuf) -> Result<()> {
    let spinner = ProgressBar::new_spinner();
    scanner::scan_backup_with_progress(path, output, |count, dir| {
        spinner.set_message(format!("{count} directories, at {}", dir.display()));
        spinner.tick();
    })?;
    spinner.finish_and_clear();

    let metadata = manifest::metadata(output);
    if let Some(root) = metadata.root_path {
        info!("Index written to {} (root: {})", output.display(), root.display());
    }
    Ok(())
}

fn run_sync(mut config: Config, backup_path: Option<PathBuf>, force: bool) -> Result<()> {
    if let Some(path) = backup_path {
        config.backup.drive = path;
    }
    config.validate_backup_drive()?;

    // Safety check: never overwrite an index that belongs to another drive.
    if config.backup.index_path.exists() && !force {
        let metadata = manifest::metadata(&config.backup.index_path);
        if let Some(expected) = metadata.label {
            if let Some(found) = volume_label(&config.backup.drive) {
                if found != expected {
                    bail!(
                        "Volume label conflict: the existing index belongs to drive \
                         '{expected}', but the connected drive has label '{found}'. \
                         Connect the correct drive or pass --force to overwrite the index."
                    );
                }
            }
        }
    }

    info!("Scanning backup drive at {}...", config.backup.drive.display());
    let spinner = ProgressBar::new_spinner();
    scanner::scan_backup_with_progress(&config.backup.drive, &config.backup.index_path, |count, dir| {
        spinner.set_message(format!("{count} directories, at {}", dir.display()));
        spinner.tick();
    })
    .context("Error scanning backup drive")?;
    spinner.finish_and_clear();

    if config.sync.source_folders.is_empty() {
        warn!("No source folders configured. Add paths under [sync] source_folders.");
        return Ok(());
    }

    let operations = BackupOperations::new(config.backup.index_path.clone());
    let mut results: Vec<(String, usize, String)> = Vec::new();

    for local_path in &config.sync.source_folders {
        let folder_display = local_path.display().to_string();
        info!("Processing {folder_display}...");

        if !local_path.exists() {
            warn!("Local path {folder_display} does not exist. Skipping.");
            results.push((folder_display, 0, "Not Found Locally".to_string()));
            continue;
        }

        let comparison = operations.find_and_compare(local_path);
        let (target_root, files_to_sync) = if let Some(error) = &comparison.error {
            warn!("Comparison error for {folder_display}: {error}");
            if !error.contains(NO_MATCH_MARKER) {
                results.push((folder_display, 0, format!("Error: {error}")));
                continue;
            }
            // Not in the index yet: treat as a brand-new folder and sync
            // everything into a fresh target under the drive root.
            let name = local_path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| folder_display.clone());
            let target = config.backup.drive.join(name);
            info!("Defaulting to new folder: {}", target.display());
            let files: Vec<String> = folder_listing(local_path).into_keys().collect();
            (target, files)
        } else if let Some(backup_path) = comparison.backup_path {
            (backup_path, comparison.only_local)
        } else {
            continue;
        };

        if files_to_sync.is_empty() {
            info!("Everything up to date.");
            results.push((folder_display, 0, "Up to date".to_string()));
            continue;
        }

        info!(
            "Syncing {} files to {}...",
            files_to_sync.len(),
            target_root.display()
        );
        let bar = ProgressBar::new(files_to_sync.len() as u64);
        let outcome =
            sync_files_with_progress(&files_to_sync, local_path, &target_root, |_, _, path, error| {
                if let Some(error) = error {
                    bar.println(format!("  [ERROR] {path}: {error}"));
                }
                bar.inc(1);
            })?;
        bar.finish_and_clear();

        let status = if outcome.errors.is_empty() {
            "OK".to_string()
        } else {
            format!("{} errors", outcome.errors.len())
        };
        results.push((folder_display, outcome.synced.len(), status));
    }

    print_protocol(&results);
    Ok(())
}

fn run_compare(config: &Config, path: &PathBuf) -> Result<()> {
    let operations = BackupOperations::new(config.backup.index_path.clone());
    let result = operations.find_and_compare(path);

    if let Some(error) = &result.error {
        println!("Error: {error}");
        return Ok(());
    }

    if let Some(backup_path) = &result.backup_path {
        println!("Backup folder: {}", backup_path.display());
    }
    println!("Only local ({}):", result.only_local.len());
    for file in &result.only_local {
        println!("  {file}");
    }
    println!("Only backup ({}):", result.only_backup.len());
    for file in &result.only_backup {
        println!("  {file}");
    }
    println!("In both: {} files", result.in_both.len());
    Ok(())
}

fn print_protocol(results: &[(String, usize, String)]) {
    println!();
    println!("{}", "=".repeat(60));
    println!("BACKUP PROTOCOL");
    println!("{}", "=".repeat(60));
    println!("{:<35} | {:<8} | {}", "Local Folder", "Synced", "Status");
    println!("{}", "-".repeat(60));
    for (folder, count, status) in results {
        let display_folder = if folder.chars().count() > 35 {
            let tail: String = folder
                .chars()
                .rev()
                .take(32)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            format!("...{tail}")
        } else {
            folder.clone()
        };
        println!("{display_folder:<35} | {count:<8} | {status}");
    }
    println!("{}", "=".repeat(60));
}
