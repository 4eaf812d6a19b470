//! Command-line interface for Encore
//!
//! Provides the main CLI structure using clap with subcommands for:
//! - `build`: Emit the manifest and entrypoints for one compilation
//! - `watch`: Re-emit every time the bundler rewrites its stats file

mod build;
mod watch;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;

pub use build::{BuildCommand, BuildOptions};
pub use watch::WatchCommand;

/// Encore - build manifest and entrypoint resolution for bundler output
#[derive(Parser, Debug)]
#[command(name = "encore")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to encore.toml config file
    #[arg(short, long, global = true, default_value = "encore.toml", env = "ENCORE_CONFIG")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write manifest.json and entrypoints.json from a stats snapshot
    Build(BuildCommand),

    /// Rewrite the documents whenever the stats snapshot changes
    Watch(WatchCommand),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<()> {
        print_banner();

        match &self.command {
            Commands::Build(cmd) => cmd.execute(&self.config).await,
            Commands::Watch(cmd) => cmd.execute(&self.config).await,
        }
    }
}

/// Print the Encore banner
fn print_banner() {
    eprintln!(
        "\n{} {} {}\n",
        "◆".cyan(),
        "Encore".bold().cyan(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
}
