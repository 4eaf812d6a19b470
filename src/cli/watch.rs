//! Watch command implementation

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebounceEventResult};
use tracing::{error, info};

use super::build::{print_summary, BuildOptions};
use crate::config::Config;
use crate::emit::Emitter;
use crate::plugins::WriteLogPlugin;
use crate::stats::CompilationStats;

/// Rewrite the documents whenever the stats snapshot changes
#[derive(Args, Debug)]
pub struct WatchCommand {
    /// Stats snapshot produced by the bundler
    #[arg(short, long, default_value = "stats.json")]
    pub stats: PathBuf,

    /// Output directory (overrides output.path)
    #[arg(short, long)]
    pub outdir: Option<PathBuf>,

    /// Public URL prefix (overrides output.public_path)
    #[arg(long)]
    pub public_path: Option<String>,

    /// Debounce delay in milliseconds
    #[arg(long, default_value = "100")]
    pub debounce: u64,
}

impl WatchCommand {
    pub async fn execute(&self, config_path: &str) -> Result<()> {
        info!("Loading configuration from {}", config_path);
        let options = BuildOptions {
            outdir: self.outdir.clone(),
            public_path: self.public_path.clone(),
        };
        let config = options.apply(Config::load(config_path)?);

        let stats_path = std::env::current_dir()?.join(&self.stats);
        let mut emitter = Emitter::new(Arc::new(config));
        emitter.register(Arc::new(WriteLogPlugin));

        // Initial run
        run_compilation(&mut emitter, &stats_path)?;

        eprintln!(
            "{} Watching {} ({} to stop)\n",
            "→".blue(),
            stats_path.display().to_string().cyan(),
            "Ctrl+C".yellow()
        );

        let debounce = Duration::from_millis(self.debounce);
        let watcher = tokio::task::spawn_blocking(move || watch_stats(emitter, stats_path, debounce));

        tokio::select! {
            result = watcher => result.context("Watcher thread panicked")?,
            _ = tokio::signal::ctrl_c() => {
                eprintln!("\n{} Stopped watching", "✓".green());
                Ok(())
            }
        }
    }
}

/// Emit for the stats snapshot currently on disk.
///
/// The compilation only counts as started once its snapshot parses, so an
/// unreadable snapshot never leaves a pending count behind.
fn run_compilation(emitter: &mut Emitter, stats_path: &Path) -> Result<()> {
    let stats = CompilationStats::load(stats_path)?;
    emitter.compilation_started()?;
    let outcome = emitter.emit(&stats, &stats.module_asset_registry())?;
    print_summary(&outcome);
    Ok(())
}

/// Block on file events for the stats snapshot, one compilation per batch
fn watch_stats(mut emitter: Emitter, stats_path: PathBuf, debounce: Duration) -> Result<()> {
    let watch_dir = stats_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    let (tx, rx) = mpsc::channel::<DebounceEventResult>();
    let mut debouncer = new_debouncer(debounce, tx)?;
    debouncer
        .watcher()
        .watch(&watch_dir, RecursiveMode::NonRecursive)?;

    for result in rx {
        match result {
            Ok(events) => {
                let touched = events
                    .iter()
                    .any(|event| event.path.file_name() == stats_path.file_name());
                if !touched {
                    continue;
                }

                eprintln!(
                    "  {} Stats changed: {}",
                    "↻".yellow(),
                    stats_path.display().to_string().dimmed()
                );

                if let Err(e) = run_compilation(&mut emitter, &stats_path) {
                    // A half-written snapshot is picked up again on the next event
                    error!("Emit failed: {:#}", e);
                }
            }
            Err(e) => {
                error!("Watch error: {:?}", e);
            }
        }
    }

    Ok(())
}
