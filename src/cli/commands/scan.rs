use anyhow::{Context, Result};
use clap::Args;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::Output;
use crate::cli::review::ConsoleReviewer;
use crate::config::DupixConfig;
use crate::engine::{AutoReviewer, Disposition, Engine, EngineConfig, ScanReport};

#[derive(Args)]
pub struct ScanArgs {
    /// Directory tree to scan for duplicate images
    #[arg(value_name = "ROOT")]
    pub root: PathBuf,

    /// Number of discovery workers (defaults to available cores minus the reserve)
    #[arg(long)]
    pub workers: Option<usize>,

    /// Copy the tree to <ROOT>_backup before anything is deleted
    #[arg(long)]
    pub backup: bool,

    /// Resolve review candidates without prompting
    #[arg(long, value_enum)]
    pub review: Option<ReviewMode>,

    /// Output format for the final report
    #[arg(long, value_enum, default_value = "text")]
    pub format: ReportFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum ReviewMode {
    /// Always keep the file already holding the identity key
    KeepLeft,
    /// Always keep the newly discovered file
    KeepRight,
    /// Leave every candidate pair untouched
    KeepBoth,
}

impl ReviewMode {
    fn disposition(self) -> Disposition {
        match self {
            ReviewMode::KeepLeft => Disposition::KeepLeft,
            ReviewMode::KeepRight => Disposition::KeepRight,
            ReviewMode::KeepBoth => Disposition::KeepBoth,
        }
    }
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum ReportFormat {
    /// Human-readable text output
    Text,
    /// JSON format
    Json,
}

pub fn execute(args: ScanArgs, config: &DupixConfig, output: &Output) -> Result<()> {
    // Reject unusable config values before the backup copy or any thread
    // starts; `config show` stays usable for debugging a broken file.
    config.validate()?;

    if args.backup || config.backup.enabled {
        backup_tree(&args.root, output)?;
    }

    let engine_config = EngineConfig {
        workers: args.workers.unwrap_or(config.scan.workers),
        reserved_cores: config.scan.reserved_cores,
        poll_interval: Duration::from_millis(config.scan.poll_interval_ms),
        extensions: config.scan.extensions.clone(),
        hash: config.hash.clone(),
    };
    let engine = Engine::new(engine_config);
    output.verbose(&format!("using {} discovery workers", engine.worker_count()));

    let report = match args.review {
        Some(mode) => {
            let mut handler = AutoReviewer::new(mode.disposition());
            engine.run(&args.root, &mut handler)?
        }
        None => {
            let mut handler = ConsoleReviewer::new(output);
            engine.run(&args.root, &mut handler)?
        }
    };

    match args.format {
        ReportFormat::Text => print_report(&report, output),
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    Ok(())
}

fn print_report(report: &ScanReport, output: &Output) {
    output.header("Scan summary");
    output.summary_stats("Directories walked", report.directories_walked);
    output.summary_stats("Images hashed", report.images_hashed);
    output.summary_stats("Exact duplicates", report.exact_duplicates);
    output.summary_stats("Review candidates", report.candidates_queued);
    output.summary_stats("Candidates reviewed", report.candidates_reviewed);
    output.summary_stats("Files deleted", report.files_deleted);
    output.summary_stats("Files skipped", report.files_skipped);
    output.summary_stats("Unique images kept", report.unique_images);
    output.blank_line();

    let seconds = report.duration_ms as f64 / 1000.0;
    if report.cancelled {
        output.warning(&format!("scan cancelled after {seconds:.2}s"));
    } else {
        output.success(&format!("scan completed in {seconds:.2}s"));
    }
}

/// Copy the whole tree to a sibling `<root>_backup` directory before any
/// file can be deleted. An existing backup is left alone.
fn backup_tree(root: &Path, output: &Output) -> Result<()> {
    let root = root
        .canonicalize()
        .with_context(|| format!("root directory not found: {}", root.display()))?;

    let mut backup: OsString = root.clone().into_os_string();
    backup.push("_backup");
    let backup = PathBuf::from(backup);

    if backup.exists() {
        output.info(&format!(
            "backup already exists at {}, skipping",
            backup.display()
        ));
        return Ok(());
    }

    output.step(&format!(
        "backing up {} to {}",
        root.display(),
        backup.display()
    ));
    let options = fs_extra::dir::CopyOptions::new().copy_inside(true);
    fs_extra::dir::copy(&root, &backup, &options)
        .with_context(|| format!("failed to back up {}", root.display()))?;

    Ok(())
}
