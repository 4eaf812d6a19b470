//! Removal of the runtime scripts style-only entries drag along

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::stats::CompilationStats;
use crate::utils::{file_type, strip_query};

/// Delete the `.js` / `.js.map` files produced by the own chunk of each
/// style-only entry. Shared chunks (runtime, vendors) are left alone.
///
/// Returns the files that were actually removed.
pub fn prune_style_entry_scripts(
    stats: &CompilationStats,
    style_entries: &HashSet<String>,
    output_path: &Path,
) -> Result<Vec<PathBuf>> {
    let mut removed = Vec::new();

    let chunks = stats
        .chunks
        .iter()
        .filter(|chunk| matches!(&chunk.name, Some(name) if style_entries.contains(name)));

    for chunk in chunks {
        let files = chunk.files.iter().chain(chunk.auxiliary_files.iter());
        for file in files.filter(|file| matches!(file_type(file).as_str(), "js" | "js.map")) {
            let path = output_path.join(strip_query(file));
            match fs::remove_file(&path) {
                Ok(()) => {
                    debug!("Removed style entry script {}", path.display());
                    removed.push(path);
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!("Failed to remove style entry script: {}", path.display())
                    });
                }
            }
        }
    }

    Ok(removed)
}
