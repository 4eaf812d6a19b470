//! Build command implementation

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use tracing::info;

use crate::config::Config;
use crate::emit::{EmitOutcome, Emitter};
use crate::plugins::WriteLogPlugin;
use crate::stats::CompilationStats;
use crate::utils::{format_duration, format_size};

/// Write manifest.json and entrypoints.json from a stats snapshot
#[derive(Args, Debug)]
pub struct BuildCommand {
    /// Stats snapshot produced by the bundler
    #[arg(short, long, default_value = "stats.json")]
    pub stats: PathBuf,

    /// Output directory (overrides output.path)
    #[arg(short, long)]
    pub outdir: Option<PathBuf>,

    /// Public URL prefix (overrides output.public_path)
    #[arg(long)]
    pub public_path: Option<String>,
}

impl BuildCommand {
    pub async fn execute(&self, config_path: &str) -> Result<()> {
        let start = Instant::now();

        info!("Loading configuration from {}", config_path);
        let config = BuildOptions::from(self).apply(Config::load(config_path)?);

        eprintln!("{} Reading {}...", "→".blue(), self.stats.display());
        let stats = CompilationStats::load(&self.stats)?;

        let mut emitter = Emitter::new(Arc::new(config));
        emitter.register(Arc::new(WriteLogPlugin));

        emitter.compilation_started()?;
        let outcome = emitter.emit(&stats, &stats.module_asset_registry())?;

        eprintln!(
            "\n{} Emitted {} manifest key(s) for {} entr{} in {}\n",
            "✓".green().bold(),
            outcome.manifest.len(),
            outcome.entrypoints.entrypoints.len(),
            if outcome.entrypoints.entrypoints.len() == 1 { "y" } else { "ies" },
            format_duration(start.elapsed())
        );
        print_summary(&outcome);

        Ok(())
    }
}

/// Print the written documents
pub(crate) fn print_summary(outcome: &EmitOutcome) {
    let written = [
        (&outcome.manifest_target, outcome.manifest_written),
        (&outcome.entrypoints_target, outcome.entrypoints_written),
    ];

    for (target, was_written) in written {
        if was_written {
            eprintln!(
                "  {} {} {}",
                "•".dimmed(),
                target.display().to_string().cyan(),
                file_size(target).dimmed()
            );
        } else {
            eprintln!(
                "  {} {} {}",
                "•".dimmed(),
                target.display().to_string().dimmed(),
                "(superseded)".yellow()
            );
        }
    }

    for path in &outcome.pruned {
        eprintln!(
            "  {} {} {}",
            "-".dimmed(),
            path.display().to_string().dimmed(),
            "(removed)".dimmed()
        );
    }

    eprintln!();
}

fn file_size(path: &Path) -> String {
    fs::metadata(path)
        .map(|meta| format_size(meta.len()))
        .unwrap_or_default()
}

/// Overrides taken from command arguments
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    pub outdir: Option<PathBuf>,
    pub public_path: Option<String>,
}

impl BuildOptions {
    /// Apply the overrides to a loaded configuration
    pub fn apply(&self, mut config: Config) -> Config {
        if let Some(outdir) = &self.outdir {
            config.output.path = outdir.display().to_string();
        }
        if let Some(public_path) = &self.public_path {
            config.output.public_path = public_path.clone();
        }
        config
    }
}

impl From<&BuildCommand> for BuildOptions {
    fn from(cmd: &BuildCommand) -> Self {
        Self {
            outdir: cmd.outdir.clone(),
            public_path: cmd.public_path.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_override_config() {
        let config = Config::from_toml("", PathBuf::from("/project")).unwrap();
        let options = BuildOptions {
            outdir: Some(PathBuf::from("/srv/static")),
            public_path: Some("https://cdn.example.com/".to_string()),
        };

        let config = options.apply(config);

        // An absolute outdir replaces the root-relative default
        assert_eq!(config.output_dir(), PathBuf::from("/srv/static"));
        assert_eq!(config.output.public_path, "https://cdn.example.com/");
    }
}
