//! Encore library
//!
//! Turns a bundler's compilation output into `manifest.json` and
//! `entrypoints.json`.

pub mod cli;
pub mod config;
pub mod emit;
pub mod entrypoints;
pub mod integrity;
pub mod manifest;
pub mod plugins;
pub mod stats;
pub mod utils;

pub use cli::Cli;
pub use config::Config;
pub use emit::{EmitCoordinator, EmitOutcome, Emitter};
