//! Side channel for files emitted by loaders

use indexmap::IndexMap;
use tracing::debug;

use crate::utils::{basename, dirname, join_posix, normalize_separators, strip_query};

/// Emitted asset path -> logical name, filled while modules are processed.
///
/// The logical name keeps the emitted file's directory and swaps its file
/// name for the source module's file name, so `images/logo.3f2a.png` emitted
/// by `./assets/logo.png` is recorded as `images/logo.png`.
#[derive(Debug, Clone, Default)]
pub struct ModuleAssets {
    names: IndexMap<String, String>,
}

impl ModuleAssets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a file emission. Later emissions of the same path win.
    pub fn record(&mut self, emitted: &str, request: &str) {
        let emitted = normalize_separators(emitted);
        let source = basename(strip_query(request));

        let name = if source.is_empty() {
            emitted.clone()
        } else {
            join_posix(dirname(&emitted), source)
        };

        debug!("Module asset {} -> {}", emitted, name);
        self.names.insert(emitted, name);
    }

    /// Logical name for an emitted path
    pub fn name_of(&self, emitted: &str) -> Option<&str> {
        self.names.get(emitted).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
