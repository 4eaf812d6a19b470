//! Configuration schema definitions

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::integrity::IntegrityAlgorithm;

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output directory, relative to the config file
    #[serde(default = "default_output_path")]
    pub path: String,

    /// Public URL prefix for manifest values and entrypoint paths
    #[serde(default = "default_public_path")]
    pub public_path: String,

    /// Prefix applied to manifest keys
    #[serde(default)]
    pub manifest_key_prefix: String,

    /// Manifest file, relative to the output directory
    #[serde(default = "default_manifest_file")]
    pub manifest_file: String,

    /// Entrypoints file, relative to the output directory
    #[serde(default = "default_entrypoints_file")]
    pub entrypoints_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            public_path: default_public_path(),
            manifest_key_prefix: String::new(),
            manifest_file: default_manifest_file(),
            entrypoints_file: default_entrypoints_file(),
        }
    }
}

fn default_output_path() -> String {
    "public/build".to_string()
}

fn default_public_path() -> String {
    "/build/".to_string()
}

fn default_manifest_file() -> String {
    "manifest.json".to_string()
}

fn default_entrypoints_file() -> String {
    "entrypoints.json".to_string()
}

fn default_true() -> bool {
    true
}

/// Entry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntriesConfig {
    /// Entries declared as stylesheet-only
    #[serde(default)]
    pub style: Vec<String>,

    /// Internal entries that never reach the outputs
    #[serde(default = "default_skip_entries")]
    pub skip: Vec<String>,

    /// Chunk id of the internal bootstrap chunk
    #[serde(default)]
    pub bootstrap_chunk: Option<String>,

    /// Delete the runtime scripts emitted for style entries
    #[serde(default = "default_true")]
    pub prune_style_scripts: bool,
}

impl Default for EntriesConfig {
    fn default() -> Self {
        Self {
            style: Vec::new(),
            skip: default_skip_entries(),
            bootstrap_chunk: None,
            prune_style_scripts: true,
        }
    }
}

fn default_skip_entries() -> Vec<String> {
    vec!["_tmp_copy".to_string(), "_tmp_shared".to_string()]
}

/// Manifest configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManifestConfig {
    /// Key chunk files by bare entry name
    #[serde(default)]
    pub use_entry_keys: bool,

    /// Strip content hash segments from keys
    #[serde(default)]
    pub stable_keys: bool,

    /// Entries every manifest starts with
    #[serde(default)]
    pub seed: IndexMap<String, String>,
}

/// Integrity configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntegrityConfig {
    /// Digest algorithms, in output order
    #[serde(default)]
    pub algorithms: Vec<IntegrityAlgorithm>,
}
