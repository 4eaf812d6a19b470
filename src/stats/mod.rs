//! Compilation stats snapshot
//!
//! The bundler hands over one of these per compilation. It lists the chunks
//! it produced, every raw output asset and the chunk ids that make up each
//! logical entrypoint.

mod module_assets;

use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

pub use module_assets::ModuleAssets;

/// Chunk identifier.
///
/// Bundlers emit numeric or string ids; both are kept as strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ChunkId(String);

impl ChunkId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChunkId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl<'de> Deserialize<'de> for ChunkId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(n) => ChunkId(n.to_string()),
            Raw::Text(s) => ChunkId(s),
        })
    }
}

/// A chunk as reported by the bundler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkStats {
    pub id: ChunkId,

    /// Logical name, absent for anonymous split chunks
    #[serde(default)]
    pub name: Option<String>,

    /// Main output files, in emission order
    #[serde(default)]
    pub files: Vec<String>,

    /// Files produced alongside the chunk (source maps, mostly)
    #[serde(default)]
    pub auxiliary_files: Vec<String>,

    /// Only ever loaded as part of an initial entry load
    #[serde(default)]
    pub initial: bool,
}

impl ChunkStats {
    pub fn is_only_initial(&self) -> bool {
        self.initial
    }
}

/// Extra data a loader attached to an emitted asset
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetInfo {
    /// Input file the asset was produced from
    #[serde(default)]
    pub source_filename: Option<String>,
}

/// A raw output file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetStats {
    pub name: String,

    #[serde(default)]
    pub size: u64,

    /// Chunks this asset belongs to
    #[serde(default)]
    pub chunks: Vec<ChunkId>,

    #[serde(default)]
    pub info: AssetInfo,
}

/// A logical entry as reported by the bundler
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntrypointStats {
    /// Chunk ids in dependency order
    #[serde(default)]
    pub chunks: Vec<ChunkId>,
}

/// Stats snapshot for one compilation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilationStats {
    #[serde(default)]
    pub chunks: Vec<ChunkStats>,

    #[serde(default)]
    pub assets: Vec<AssetStats>,

    #[serde(default)]
    pub entrypoints: IndexMap<String, EntrypointStats>,

    /// Loader-emitted file -> request of the module that emitted it
    #[serde(default)]
    pub module_assets: IndexMap<String, String>,
}

impl CompilationStats {
    /// Load a stats snapshot from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read stats file: {}", path.display()))?;

        Self::from_json(&content)
            .with_context(|| format!("Failed to parse stats file: {}", path.display()))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Look up a chunk by id
    pub fn chunk(&self, id: &ChunkId) -> Option<&ChunkStats> {
        self.chunks.iter().find(|chunk| &chunk.id == id)
    }

    /// Build the module-asset side channel from the recorded emissions
    pub fn module_asset_registry(&self) -> ModuleAssets {
        let mut registry = ModuleAssets::new();
        for (emitted, request) in &self.module_assets {
            registry.record(emitted, request);
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stats() {
        let stats = CompilationStats::from_json(
            r#"{
                "chunks": [
                    { "id": 0, "name": "main", "files": ["main.js"], "auxiliaryFiles": ["main.js.map"], "initial": true },
                    { "id": "vendors", "files": ["vendors.js"] }
                ],
                "assets": [
                    { "name": "main.js", "size": 120, "chunks": [0] },
                    { "name": "logo.png", "info": { "sourceFilename": "images/logo.png" } }
                ],
                "entrypoints": { "main": { "chunks": ["vendors", 0] } }
            }"#,
        )
        .unwrap();

        assert_eq!(stats.chunks.len(), 2);
        assert_eq!(stats.chunks[0].id.as_str(), "0");
        assert!(stats.chunks[0].is_only_initial());
        assert_eq!(stats.chunks[1].name, None);
        assert_eq!(stats.assets[0].chunks, vec![ChunkId::from("0")]);
        assert_eq!(
            stats.assets[1].info.source_filename.as_deref(),
            Some("images/logo.png")
        );

        let main = &stats.entrypoints["main"];
        assert_eq!(main.chunks, vec![ChunkId::from("vendors"), ChunkId::from("0")]);
        assert!(stats.chunk(&ChunkId::from("vendors")).is_some());
    }

    #[test]
    fn test_rejects_malformed_stats() {
        assert!(CompilationStats::from_json("{ \"chunks\": 3 }").is_err());
    }
}
