//! Entrypoints document
//!
//! Groups the initial files of every logical entry by file type so server
//! side templates can render the right `<script>` and `<link>` tags.

use std::collections::HashSet;
use std::path::Path;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::integrity::IntegrityComputer;
use crate::stats::{ChunkStats, CompilationStats};
use crate::utils::{extension, is_hot_update, join_public, normalize_separators, strip_query};

/// File type key holding script files
pub const SCRIPT_TYPE: &str = "js";

/// Persisted entrypoints document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntrypointsDocument {
    /// Entry name -> file type -> public paths
    pub entrypoints: IndexMap<String, IndexMap<String, Vec<String>>>,

    /// Public path -> digests; present only when algorithms are configured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integrity: Option<IndexMap<String, String>>,
}

/// A logical entry with its chunks resolved from ids
#[derive(Debug, Clone)]
pub struct EntryPoint<'s> {
    pub name: &'s str,

    /// Chunks in the dependency order reported by the bundler
    pub chunks: Vec<&'s ChunkStats>,
}

impl<'s> EntryPoint<'s> {
    /// Resolve every entry of a compilation. Chunk ids that don't resolve are
    /// dropped.
    pub fn resolve_all(stats: &'s CompilationStats) -> Vec<EntryPoint<'s>> {
        stats
            .entrypoints
            .iter()
            .map(|(name, entry)| EntryPoint {
                name,
                chunks: entry
                    .chunks
                    .iter()
                    .filter_map(|id| {
                        let chunk = stats.chunk(id);
                        if chunk.is_none() {
                            debug!("Entry {} references unknown chunk {}", name, id);
                        }
                        chunk
                    })
                    .collect(),
            })
            .collect()
    }
}

/// Builds the entrypoints document
pub struct EntrypointAggregator<'a> {
    public_path: &'a str,
    output_path: &'a Path,
    skip_entries: &'a HashSet<String>,
    style_entries: &'a HashSet<String>,
}

impl<'a> EntrypointAggregator<'a> {
    pub fn new(
        public_path: &'a str,
        output_path: &'a Path,
        skip_entries: &'a HashSet<String>,
        style_entries: &'a HashSet<String>,
    ) -> Self {
        Self {
            public_path,
            output_path,
            skip_entries,
            style_entries,
        }
    }

    /// Group the files of each entry and compute integrity when enabled
    pub fn aggregate(
        &self,
        entries: &[EntryPoint<'_>],
        integrity: &mut IntegrityComputer,
    ) -> EntrypointsDocument {
        let mut document = EntrypointsDocument::default();
        // Public path -> output-relative path, in first-seen order
        let mut produced: IndexMap<String, String> = IndexMap::new();

        for entry in entries {
            if self.skip_entries.contains(entry.name) {
                debug!("Skipping internal entry {}", entry.name);
                continue;
            }

            let is_style = self.style_entries.contains(entry.name);
            let mut types: IndexMap<String, IndexSet<String>> = IndexMap::new();

            for chunk in &entry.chunks {
                for file in &chunk.files {
                    let file = normalize_separators(file);
                    if is_hot_update(&file) {
                        continue;
                    }

                    let Some(ext) = extension(&file) else {
                        debug!("No file type for {}, leaving it out of {}", file, entry.name);
                        continue;
                    };
                    if ext == "map" || (is_style && ext == SCRIPT_TYPE) {
                        continue;
                    }

                    let public = join_public(self.public_path, &file);
                    produced.entry(public.clone()).or_insert(file);
                    types.entry(ext).or_default().insert(public);
                }
            }

            document.entrypoints.insert(
                entry.name.to_string(),
                types
                    .into_iter()
                    .map(|(ext, files)| (ext, files.into_iter().collect()))
                    .collect(),
            );
        }

        if integrity.is_enabled() {
            document.integrity = Some(self.integrity(&produced, integrity));
        }

        document
    }

    fn integrity(
        &self,
        produced: &IndexMap<String, String>,
        integrity: &mut IntegrityComputer,
    ) -> IndexMap<String, String> {
        let mut seen = HashSet::new();
        let mut digests = IndexMap::new();

        for (public, file) in produced {
            if !seen.insert(strip_query(file).to_string()) {
                continue;
            }
            if let Some(digest) = integrity.compute(self.output_path, file) {
                digests.insert(public.clone(), digest);
            }
        }

        digests
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::integrity::IntegrityAlgorithm;
    use crate::stats::{ChunkId, EntrypointStats};

    fn chunk(id: &str, files: &[&str]) -> ChunkStats {
        ChunkStats {
            id: ChunkId::from(id),
            name: Some(id.to_string()),
            files: files.iter().map(|f| f.to_string()).collect(),
            auxiliary_files: Vec::new(),
            initial: true,
        }
    }

    fn stats() -> CompilationStats {
        let entry = |ids: &[&str]| EntrypointStats {
            chunks: ids.iter().map(|id| ChunkId::from(*id)).collect(),
        };

        CompilationStats {
            chunks: vec![
                chunk("runtime", &["runtime.js"]),
                chunk("vendors", &["vendors.js", "vendors.css"]),
                chunk("app", &["app.js", "app.css", "app.js.map"]),
                chunk("theme", &["theme.css", "theme.js"]),
                chunk("_tmp_shared", &["_tmp_shared.js"]),
            ],
            entrypoints: [
                ("app", entry(&["runtime", "vendors", "app"])),
                ("theme", entry(&["runtime", "theme"])),
                ("_tmp_shared", entry(&["runtime", "_tmp_shared"])),
                ("admin", entry(&["runtime", "vendors", "missing"])),
            ]
            .into_iter()
            .map(|(name, entry)| (name.to_string(), entry))
            .collect(),
            ..Default::default()
        }
    }

    fn names(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn paths(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_groups_by_type_in_chunk_order() {
        let stats = stats();
        let skip = names(&["_tmp_shared"]);
        let style = names(&["theme"]);
        let out = Path::new("/nonexistent");

        let entries = EntryPoint::resolve_all(&stats);
        let document = EntrypointAggregator::new("/build/", out, &skip, &style)
            .aggregate(&entries, &mut IntegrityComputer::default());

        let app = &document.entrypoints["app"];
        assert_eq!(
            app["js"],
            paths(&["/build/runtime.js", "/build/vendors.js", "/build/app.js"])
        );
        assert_eq!(app["css"], paths(&["/build/vendors.css", "/build/app.css"]));
        assert!(!app.contains_key("map"));

        let theme = &document.entrypoints["theme"];
        assert!(!theme.contains_key("js"));
        assert_eq!(theme["css"], paths(&["/build/theme.css"]));

        assert!(!document.entrypoints.contains_key("_tmp_shared"));
        assert_eq!(document.entrypoints["admin"]["js"].len(), 2);
        assert_eq!(document.integrity, None);
    }

    #[test]
    fn test_integrity_hashes_each_file_once() {
        let dir = tempfile::tempdir().unwrap();
        for file in ["runtime.js", "vendors.js", "vendors.css", "app.js"] {
            fs::write(dir.path().join(file), file).unwrap();
        }

        let stats = stats();
        let skip = names(&["_tmp_shared"]);
        let style = names(&["theme"]);
        let mut integrity = IntegrityComputer::new(vec![IntegrityAlgorithm::Sha256]);

        let entries = EntryPoint::resolve_all(&stats);
        let document = EntrypointAggregator::new("/build/", dir.path(), &skip, &style)
            .aggregate(&entries, &mut integrity);

        let digests = document.integrity.unwrap();
        // app.css and theme.css were never written, so they are simply absent
        let keys: Vec<&str> = digests.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec!["/build/runtime.js", "/build/vendors.js", "/build/vendors.css", "/build/app.js"]
        );
        assert_eq!(integrity.cached(), 4);
        assert!(digests["/build/app.js"].starts_with("sha256-"));
    }

    #[test]
    fn test_serialized_shape() {
        let mut document = EntrypointsDocument::default();
        document
            .entrypoints
            .entry("main".to_string())
            .or_default()
            .insert("js".to_string(), paths(&["/build/main.js"]));

        let json = serde_json::to_string_pretty(&document).unwrap();
        assert_eq!(
            json,
            "{\n  \"entrypoints\": {\n    \"main\": {\n      \"js\": [\n        \"/build/main.js\"\n      ]\n    }\n  }\n}"
        );
    }
}
