//! docindex CLI
//!
//! Builds or resumes the search index for a directory tree.

use anyhow::{Context, Result};
use clap::Parser;
use docindex_core::{logging, IndexJob, JobOutcome, Settings};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "docindex")]
#[command(about = "docindex - Incremental per-directory search indexes for document trees")]
#[command(version)]
struct Cli {
    /// Root directory to index (default: current directory)
    root: Option<PathBuf>,

    /// Settings file (default: <ROOT>/docindex.yaml, then the user config file)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let root = match cli.root {
        Some(root) => root,
        None => std::env::current_dir().context("Failed to determine current directory")?,
    };

    let discovered = Settings::discover(&root, cli.config.as_deref()).with_context(|| {
        format!("Failed to load settings for {}", root.display())
    })?;

    let job = IndexJob::new(&root, discovered.settings.clone())
        .with_context(|| format!("Cannot index {}", root.display()))?;

    if let Err(e) = logging::init(job.root(), &job.settings().logging) {
        logging::init_stderr(&job.settings().logging.level);
        tracing::warn!("Log file unavailable, logging to stderr only: {}", e);
    }

    tracing::info!("Starting docindex v{}", env!("CARGO_PKG_VERSION"));
    discovered.log();
    tracing::info!(root = ?job.root(), "Indexing");

    match job.run().context("Indexing run failed")? {
        JobOutcome::Completed(report) => {
            tracing::info!(
                indexed = report.files_indexed,
                already_indexed = report.files_already_indexed,
                failed = report.files_failed,
                duration_ms = report.duration_ms,
                "Search index build complete"
            );
            println!(
                "Indexed {} new file(s) in {} directories ({} already indexed, {} failed, {} unsupported)",
                report.files_indexed,
                report.directories_visited,
                report.files_already_indexed,
                report.files_failed,
                report.files_unsupported
            );
        }
        JobOutcome::Busy { pid } => {
            println!("Another docindex run (PID {pid}) is indexing this tree; nothing to do.");
        }
    }

    Ok(())
}
