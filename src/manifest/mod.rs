//! Manifest generation
//!
//! Turns a compilation's raw output into `FileRecord`s and folds them into the
//! flat `name -> public path` manifest document.

mod classify;
mod hooks;
mod prune;
mod writer;

use indexmap::IndexMap;

use crate::stats::ChunkStats;

pub use classify::{AssetClassifier, Provenance};
pub use hooks::{HookChain, ManifestHooks, Override, StableKeys};
pub use prune::prune_style_entry_scripts;
pub use writer::{ManifestOptions, ManifestWriter};

/// Persisted manifest: logical key -> output path
pub type ManifestDocument = IndexMap<String, String>;

/// One physical output file of a compilation
#[derive(Debug, Clone, PartialEq)]
pub struct FileRecord<'a> {
    /// Output-relative path (the bundler's asset name)
    pub path: String,

    /// Public name, used as the manifest key
    pub name: String,

    /// Chunk that produced the file
    pub chunk: Option<&'a ChunkStats>,

    pub is_initial: bool,
    pub is_chunk: bool,
    pub is_asset: bool,
    pub is_module_asset: bool,
}

impl<'a> FileRecord<'a> {
    /// A main file of a chunk
    pub fn chunk_file(chunk: &'a ChunkStats, path: String, name: String) -> Self {
        Self {
            path,
            name,
            chunk: Some(chunk),
            is_initial: chunk.is_only_initial(),
            is_chunk: true,
            is_asset: false,
            is_module_asset: false,
        }
    }

    /// A file produced next to a chunk but not part of its main file list
    pub fn auxiliary_file(chunk: &'a ChunkStats, path: String, name: String) -> Self {
        Self {
            path,
            name,
            chunk: Some(chunk),
            is_initial: false,
            is_chunk: false,
            is_asset: true,
            is_module_asset: false,
        }
    }

    /// A file found through asset enumeration
    pub fn asset(path: String, name: String, is_module_asset: bool) -> Self {
        Self {
            path,
            name,
            chunk: None,
            is_initial: false,
            is_chunk: false,
            is_asset: true,
            is_module_asset,
        }
    }

    /// Name of the producing chunk, if it has one
    pub fn chunk_name(&self) -> Option<&'a str> {
        self.chunk.and_then(|chunk| chunk.name.as_deref())
    }
}
