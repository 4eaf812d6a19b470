//! Encore - build manifest and entrypoint resolution for bundler output
//!
//! Reads the stats snapshot a bundler writes after each compilation and
//! produces two documents in the output directory:
//! - `manifest.json`: logical asset name -> public path
//! - `entrypoints.json`: per-entry script and stylesheet lists, with optional
//!   subresource integrity digests

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use encore_lib::Cli;

/// Initialize the logging/tracing system
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("encore=debug,encore_lib=debug"))
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("encore=info,encore_lib=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    cli.execute().await
}
