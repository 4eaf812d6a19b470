//! Manifest document builder

use std::collections::HashSet;

use indexmap::IndexMap;
use tracing::debug;

use super::hooks::{HookChain, ManifestHooks, Override};
use super::{FileRecord, ManifestDocument};
use crate::stats::{ChunkId, CompilationStats};
use crate::utils::{file_type, join_public, normalize_separators};

/// Query marker tagging files imported only to be copied to the output
pub const COPY_FILES_MARKER: &str = "?copy-files";

/// Settings for the built-in filter and map steps
#[derive(Debug, Clone, Default)]
pub struct ManifestOptions {
    /// URL prefix applied to manifest values
    pub public_path: String,

    /// Prefix applied to manifest keys
    pub key_prefix: String,

    /// Entries declared as stylesheet-only
    pub style_entries: HashSet<String>,

    /// Internal entries that never reach the outputs
    pub skip_entries: HashSet<String>,

    /// Chunk holding internal bootstrap code
    pub bootstrap_chunk: Option<ChunkId>,

    /// Style-entry scripts are deleted from disk; no filter may keep them
    pub prune_style_scripts: bool,

    /// Starting document the records are folded into
    pub seed: ManifestDocument,
}

/// Applies filter -> map -> sort to the classified records and folds them
/// into a manifest document
pub struct ManifestWriter {
    options: ManifestOptions,
    hooks: HookChain,
    /// `<style>.js` and `<style>.js.map` keys
    style_script_keys: HashSet<String>,
}

impl ManifestWriter {
    pub fn new(options: ManifestOptions) -> Self {
        let style_script_keys = options
            .style_entries
            .iter()
            .flat_map(|style| [format!("{}.js", style), format!("{}.js.map", style)])
            .collect();

        Self {
            options,
            hooks: HookChain::new(),
            style_script_keys,
        }
    }

    pub fn with_hooks(mut self, hooks: HookChain) -> Self {
        self.hooks = hooks;
        self
    }

    /// Build the manifest for one compilation
    pub fn write<'s>(
        &self,
        records: Vec<FileRecord<'s>>,
        stats: &'s CompilationStats,
    ) -> ManifestDocument {
        let mut files: Vec<FileRecord<'s>> = records
            .into_iter()
            .filter(|file| {
                let keep = self.hooks.filter(file).unwrap_or(self.default_keep(file))
                    && !(self.options.prune_style_scripts && self.is_style_script(file));
                if !keep {
                    debug!("Manifest filter dropped {}", file.path);
                }
                keep
            })
            .map(|file| {
                let file = self.default_map(file);
                self.hooks.map(&file).unwrap_or(file)
            })
            .collect();

        files.sort_by(|a, b| self.hooks.sort(a, b));

        for file in &mut files {
            file.name = normalize_separators(&file.name);
            file.path = normalize_separators(&file.path);
        }

        let entrypoints = self.entrypoint_files(stats);
        match self.hooks.generate(&self.options.seed, &files, &entrypoints) {
            Override::Replaced(document) => document,
            Override::Unchanged => {
                files
                    .into_iter()
                    .fold(self.options.seed.clone(), |mut document, file| {
                        document.insert(file.name, file.path);
                        document
                    })
            }
        }
    }

    fn default_keep(&self, file: &FileRecord<'_>) -> bool {
        if let (Some(chunk), Some(bootstrap)) = (file.chunk, &self.options.bootstrap_chunk) {
            if &chunk.id == bootstrap {
                return false;
            }
        }

        if let Some(chunk_name) = file.chunk_name() {
            if self.options.skip_entries.contains(chunk_name) {
                return false;
            }
        }

        !self.is_style_script(file)
    }

    /// Script output of a style-only entry, by owning chunk or by key
    fn is_style_script(&self, file: &FileRecord<'_>) -> bool {
        let by_chunk = file
            .chunk_name()
            .is_some_and(|name| self.options.style_entries.contains(name) && is_script(&file.path));

        by_chunk || self.style_script_keys.contains(&file.name)
    }

    fn default_map<'s>(&self, mut file: FileRecord<'s>) -> FileRecord<'s> {
        let name = file.name.replace(COPY_FILES_MARKER, "");
        file.name = format!("{}{}", self.options.key_prefix, name);
        file.path = join_public(&self.options.public_path, &file.path);
        file
    }

    /// Entry name -> public paths of its files, for `generate` hooks
    fn entrypoint_files(&self, stats: &CompilationStats) -> IndexMap<String, Vec<String>> {
        stats
            .entrypoints
            .iter()
            .filter(|(name, _)| !self.options.skip_entries.contains(name.as_str()))
            .map(|(name, entry)| {
                let is_style = self.options.style_entries.contains(name.as_str());
                let files = entry
                    .chunks
                    .iter()
                    .filter_map(|id| stats.chunk(id))
                    .flat_map(|chunk| chunk.files.iter())
                    .filter(|file| !file_type(file).ends_with("map"))
                    .filter(|file| !(is_style && is_script(file)))
                    .map(|file| join_public(&self.options.public_path, &normalize_separators(file)))
                    .collect();
                (name.clone(), files)
            })
            .collect()
    }
}

fn is_script(path: &str) -> bool {
    matches!(file_type(path).as_str(), "js" | "js.map")
}
