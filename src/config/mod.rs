//! Configuration handling for Encore
//!
//! Parses and manages encore.toml configuration files.

mod schema;

use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::manifest::ManifestOptions;
use crate::stats::ChunkId;

pub use schema::*;

/// Configuration problems that abort an emit
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("entry '{0}' is declared both as a style entry and as an internal entry")]
    StyleEntrySkipped(String),

    #[error("'{0}' must be a relative file path inside the output directory")]
    InvalidTarget(String),

    #[error("manifest and entrypoints are both configured to write '{0}'")]
    SharedTarget(String),

    #[error("output path must be absolute, got {0}")]
    RelativeOutputPath(PathBuf),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,

    /// Entry roles
    #[serde(default)]
    pub entries: EntriesConfig,

    /// Manifest options
    #[serde(default)]
    pub manifest: ManifestConfig,

    /// Integrity options
    #[serde(default)]
    pub integrity: IntegrityConfig,

    /// Root directory (computed from config file location)
    #[serde(skip)]
    pub root: PathBuf,
}

impl Config {
    /// Load configuration from a file path
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let canonical_path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()?.join(path)
        };

        let content = fs::read_to_string(&canonical_path)
            .with_context(|| format!("Failed to read config file: {}", canonical_path.display()))?;

        let root = canonical_path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        Self::from_toml(&content, root)
    }

    /// Parse configuration rooted at `root`
    pub fn from_toml(content: &str, root: PathBuf) -> Result<Self> {
        let mut config: Config =
            toml::from_str(content).with_context(|| "Failed to parse encore.toml")?;
        config.root = root;

        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let skipped = self.skip_entries();
        if let Some(name) = self.entries.style.iter().find(|name| skipped.contains(*name)) {
            return Err(ConfigError::StyleEntrySkipped(name.clone()));
        }

        validate_target(&self.output.manifest_file)?;
        validate_target(&self.output.entrypoints_file)?;
        if Path::new(&self.output.manifest_file) == Path::new(&self.output.entrypoints_file) {
            return Err(ConfigError::SharedTarget(self.output.manifest_file.clone()));
        }

        Ok(())
    }

    /// Get the absolute output directory path
    pub fn output_dir(&self) -> PathBuf {
        self.root.join(&self.output.path)
    }

    /// Absolute path of the manifest file
    pub fn manifest_target(&self) -> Result<PathBuf, ConfigError> {
        self.target(&self.output.manifest_file)
    }

    /// Absolute path of the entrypoints file
    pub fn entrypoints_target(&self) -> Result<PathBuf, ConfigError> {
        self.target(&self.output.entrypoints_file)
    }

    fn target(&self, file: &str) -> Result<PathBuf, ConfigError> {
        let output_dir = self.output_dir();
        if !output_dir.is_absolute() {
            return Err(ConfigError::RelativeOutputPath(output_dir));
        }
        validate_target(file)?;
        Ok(output_dir.join(file))
    }

    pub fn style_entries(&self) -> HashSet<String> {
        self.entries.style.iter().cloned().collect()
    }

    pub fn skip_entries(&self) -> HashSet<String> {
        self.entries.skip.iter().cloned().collect()
    }

    /// Options for the built-in manifest filter and map steps
    pub fn manifest_options(&self) -> ManifestOptions {
        ManifestOptions {
            public_path: self.output.public_path.clone(),
            key_prefix: self.output.manifest_key_prefix.clone(),
            style_entries: self.style_entries(),
            skip_entries: self.skip_entries(),
            bootstrap_chunk: self.entries.bootstrap_chunk.as_deref().map(ChunkId::from),
            prune_style_scripts: self.entries.prune_style_scripts,
            seed: self.manifest.seed.clone(),
        }
    }
}

/// Targets are plain relative file paths
fn validate_target(file: &str) -> Result<(), ConfigError> {
    let path = Path::new(file);
    let plain = path.file_name().is_some()
        && path
            .components()
            .all(|component| matches!(component, Component::Normal(_) | Component::CurDir));

    if file.trim().is_empty() || !plain {
        return Err(ConfigError::InvalidTarget(file.to_string()));
    }

    Ok(())
}
