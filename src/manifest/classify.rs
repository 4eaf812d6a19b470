//! Classification of raw compilation output into `FileRecord`s

use std::path::Path;

use indexmap::IndexMap;
use tracing::debug;

use super::FileRecord;
use crate::emit::EmitCoordinator;
use crate::stats::{AssetStats, ChunkStats, CompilationStats, ModuleAssets};
use crate::utils::{basename, dirname, file_type, is_hot_update, join_posix, normalize_separators};

/// Where a record came from.
///
/// When two steps claim the same output path, the variant declared first
/// wins regardless of the order the steps ran in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Provenance {
    /// Listed in a chunk's main file list
    ChunkFile,
    /// Emitted by a loader, known through the module-asset side channel
    ModuleAsset,
    /// Asset carrying `sourceFilename` metadata
    SourceFilename,
    /// Asset not attributable to anything else
    Standalone,
    /// Produced next to a chunk (source maps)
    Auxiliary,
}

/// Converts chunk and asset lists into a flat, deduplicated record list
pub struct AssetClassifier<'c> {
    /// Key chunk files by bare entry name instead of `<name>.<type>`
    use_entry_keys: bool,

    /// Output directory, used to recognise other manifest targets
    output_path: &'c Path,

    /// Targets registered by any emitter sharing this coordinator
    coordinator: Option<&'c EmitCoordinator>,
}

impl<'c> AssetClassifier<'c> {
    pub fn new(output_path: &'c Path) -> Self {
        Self {
            use_entry_keys: false,
            output_path,
            coordinator: None,
        }
    }

    pub fn use_entry_keys(mut self, enabled: bool) -> Self {
        self.use_entry_keys = enabled;
        self
    }

    pub fn with_coordinator(mut self, coordinator: &'c EmitCoordinator) -> Self {
        self.coordinator = Some(coordinator);
        self
    }

    /// Classify every output file of a compilation
    pub fn classify<'s>(
        &self,
        stats: &'s CompilationStats,
        module_assets: &ModuleAssets,
    ) -> Vec<FileRecord<'s>> {
        let mut claims: IndexMap<String, (Provenance, FileRecord<'s>)> = IndexMap::new();

        for chunk in &stats.chunks {
            for file in &chunk.files {
                let path = normalize_separators(file);
                let name = self.chunk_file_name(chunk, &path);
                claim(
                    &mut claims,
                    Provenance::ChunkFile,
                    FileRecord::chunk_file(chunk, path, name),
                );
            }

            for file in &chunk.auxiliary_files {
                let path = normalize_separators(file);
                let name = match &chunk.name {
                    Some(chunk_name) => format!("{}.{}", chunk_name, file_type(&path)),
                    None => path.clone(),
                };
                claim(
                    &mut claims,
                    Provenance::Auxiliary,
                    FileRecord::auxiliary_file(chunk, path, name),
                );
            }
        }

        for asset in &stats.assets {
            if let Some((provenance, record)) = self.classify_asset(asset, module_assets) {
                claim(&mut claims, provenance, record);
            }
        }

        claims
            .into_values()
            .map(|(_, record)| record)
            .filter(|record| self.keep(record))
            .collect()
    }

    fn chunk_file_name(&self, chunk: &ChunkStats, path: &str) -> String {
        let Some(chunk_name) = &chunk.name else {
            return path.to_string();
        };

        let file_type = file_type(path);
        if self.use_entry_keys && !file_type.ends_with("map") {
            chunk_name.clone()
        } else {
            format!("{}.{}", chunk_name, file_type)
        }
    }

    fn classify_asset<'s>(
        &self,
        asset: &AssetStats,
        module_assets: &ModuleAssets,
    ) -> Option<(Provenance, FileRecord<'s>)> {
        let path = normalize_separators(&asset.name);

        if let Some(name) = module_assets.name_of(&path) {
            let name = name.to_string();
            return Some((Provenance::ModuleAsset, FileRecord::asset(path, name, true)));
        }

        if let Some(source) = &asset.info.source_filename {
            let name = source_name(&path, source);
            return Some((Provenance::SourceFilename, FileRecord::asset(path, name, true)));
        }

        if !asset.chunks.is_empty() {
            // Covered by the chunk pass
            return None;
        }

        let name = path.clone();
        Some((Provenance::Standalone, FileRecord::asset(path, name, false)))
    }

    fn keep(&self, record: &FileRecord<'_>) -> bool {
        if is_hot_update(&record.path) {
            debug!("Skipping hot update fragment {}", record.path);
            return false;
        }

        if let Some(coordinator) = self.coordinator {
            if coordinator.is_target(&self.output_path.join(&record.path)) {
                debug!("Skipping manifest target {}", record.path);
                return false;
            }
        }

        true
    }
}

/// Register a record for its path unless a stronger claim already exists
fn claim<'s>(
    claims: &mut IndexMap<String, (Provenance, FileRecord<'s>)>,
    provenance: Provenance,
    record: FileRecord<'s>,
) {
    match claims.get_mut(&record.path) {
        Some(existing) if existing.0 <= provenance => {
            debug!(
                "{} already claimed as {:?}, ignoring {:?}",
                record.path, existing.0, provenance
            );
        }
        Some(existing) => *existing = (provenance, record),
        None => {
            claims.insert(record.path.clone(), (provenance, record));
        }
    }
}

/// Name for an asset with `sourceFilename` metadata: the asset's directory
/// plus the source file name. Falls back to the asset path.
fn source_name(path: &str, source: &str) -> String {
    let source = normalize_separators(source);
    let file_name = basename(&source);

    if file_name.is_empty() {
        debug!("No usable source name for {}, keeping its path", path);
        return path.to_string();
    }

    join_posix(dirname(path), file_name)
}
