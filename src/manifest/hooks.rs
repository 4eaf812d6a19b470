//! Override points for the manifest writer
//!
//! Every hook receives the record as the built-in steps left it and either
//! leaves the baseline alone or replaces it.

use std::cmp::Ordering;
use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{FileRecord, ManifestDocument};

/// Content hash segment in a file name (`logo.3f2a9c1d.png`)
static HASH_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.[0-9a-f]{8,}\.").unwrap());

/// Result of a hook: keep the baseline or replace it
#[derive(Debug, Clone, PartialEq)]
pub enum Override<T> {
    Unchanged,
    Replaced(T),
}

impl<T> Override<T> {
    /// The replacement, or the baseline when unchanged
    pub fn unwrap_or(self, baseline: T) -> T {
        match self {
            Override::Unchanged => baseline,
            Override::Replaced(value) => value,
        }
    }

    pub fn is_replaced(&self) -> bool {
        matches!(self, Override::Replaced(_))
    }
}

/// User-supplied manifest transforms
pub trait ManifestHooks: Send + Sync {
    /// Decide whether a record stays in the manifest
    fn filter(&self, _file: &FileRecord<'_>) -> Override<bool> {
        Override::Unchanged
    }

    /// Rewrite a record after key/public-path prefixing
    fn map<'a>(&self, _file: &FileRecord<'a>) -> Override<FileRecord<'a>> {
        Override::Unchanged
    }

    /// Ordering of the final record list. `Equal` keeps classification order.
    fn sort(&self, _a: &FileRecord<'_>, _b: &FileRecord<'_>) -> Ordering {
        Ordering::Equal
    }

    /// Build the whole document instead of the default fold
    fn generate(
        &self,
        _seed: &ManifestDocument,
        _files: &[FileRecord<'_>],
        _entrypoints: &IndexMap<String, Vec<String>>,
    ) -> Override<ManifestDocument> {
        Override::Unchanged
    }
}

/// Ordered set of hooks; later hooks see the earlier results
#[derive(Clone, Default)]
pub struct HookChain {
    hooks: Vec<Arc<dyn ManifestHooks>>,
}

impl HookChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, hooks: Arc<dyn ManifestHooks>) {
        self.hooks.push(hooks);
    }
}

impl ManifestHooks for HookChain {
    fn filter(&self, file: &FileRecord<'_>) -> Override<bool> {
        self.hooks
            .iter()
            .fold(Override::Unchanged, |decision, hooks| match hooks.filter(file) {
                Override::Unchanged => decision,
                replaced => replaced,
            })
    }

    fn map<'a>(&self, file: &FileRecord<'a>) -> Override<FileRecord<'a>> {
        let mut result = Override::Unchanged;
        for hooks in &self.hooks {
            let current = match &result {
                Override::Replaced(record) => hooks.map(record),
                Override::Unchanged => hooks.map(file),
            };
            if current.is_replaced() {
                result = current;
            }
        }
        result
    }

    fn sort(&self, a: &FileRecord<'_>, b: &FileRecord<'_>) -> Ordering {
        self.hooks
            .iter()
            .map(|hooks| hooks.sort(a, b))
            .find(|ordering| *ordering != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }

    fn generate(
        &self,
        seed: &ManifestDocument,
        files: &[FileRecord<'_>],
        entrypoints: &IndexMap<String, Vec<String>>,
    ) -> Override<ManifestDocument> {
        self.hooks
            .iter()
            .rev()
            .map(|hooks| hooks.generate(seed, files, entrypoints))
            .find(Override::is_replaced)
            .unwrap_or(Override::Unchanged)
    }
}

/// Strips content hash segments from keys so they stay stable across builds
#[derive(Debug, Clone, Copy, Default)]
pub struct StableKeys;

impl ManifestHooks for StableKeys {
    fn map<'a>(&self, file: &FileRecord<'a>) -> Override<FileRecord<'a>> {
        if !HASH_SEGMENT.is_match(&file.name) {
            return Override::Unchanged;
        }

        let mut file = file.clone();
        file.name = HASH_SEGMENT.replace_all(&file.name, ".").into_owned();
        Override::Replaced(file)
    }
}
