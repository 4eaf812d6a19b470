//! Plugin system for Encore
//!
//! Plugins run in registration order. Each `before_emit_*` hook receives the
//! document as the previous plugin left it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::entrypoints::EntrypointsDocument;
use crate::manifest::ManifestDocument;

/// Plugin hook context
pub struct PluginContext {
    /// Absolute output directory
    pub output_path: PathBuf,
}

/// A document that was just written to disk
#[derive(Clone, Copy)]
pub enum Written<'a> {
    Manifest(&'a ManifestDocument),
    Entrypoints(&'a EntrypointsDocument),
}

/// Plugin trait - implement this to hook into the emit cycle
pub trait Plugin: Send + Sync {
    /// Plugin name for logging and debugging
    fn name(&self) -> &str;

    /// Transform the manifest before it is persisted
    fn before_emit_manifest(
        &self,
        manifest: ManifestDocument,
        _ctx: &PluginContext,
    ) -> ManifestDocument {
        manifest
    }

    /// Transform the entrypoints document before it is persisted
    fn before_emit_entrypoints(
        &self,
        entrypoints: EntrypointsDocument,
        _ctx: &PluginContext,
    ) -> EntrypointsDocument {
        entrypoints
    }

    /// Called after a document has been written to `target`
    fn after_emit(&self, _target: &Path, _written: Written<'_>, _ctx: &PluginContext) -> Result<()> {
        Ok(())
    }
}

/// Plugin manager
pub struct PluginManager {
    plugins: Vec<Arc<dyn Plugin>>,
    context: PluginContext,
}

impl PluginManager {
    /// Create a new plugin manager
    pub fn new(output_path: PathBuf) -> Self {
        Self {
            plugins: Vec::new(),
            context: PluginContext { output_path },
        }
    }

    /// Register a plugin
    pub fn register(&mut self, plugin: Arc<dyn Plugin>) {
        self.plugins.push(plugin);
    }

    /// Run before_emit_manifest hooks
    pub fn before_emit_manifest(&self, manifest: ManifestDocument) -> ManifestDocument {
        self.plugins.iter().fold(manifest, |manifest, plugin| {
            plugin.before_emit_manifest(manifest, &self.context)
        })
    }

    /// Run before_emit_entrypoints hooks
    pub fn before_emit_entrypoints(&self, entrypoints: EntrypointsDocument) -> EntrypointsDocument {
        self.plugins.iter().fold(entrypoints, |entrypoints, plugin| {
            plugin.before_emit_entrypoints(entrypoints, &self.context)
        })
    }

    /// Run after_emit hooks
    pub fn after_emit(&self, target: &Path, written: Written<'_>) -> Result<()> {
        for plugin in &self.plugins {
            plugin.after_emit(target, written, &self.context)?;
        }
        Ok(())
    }
}

// Built-in plugins

/// Reports every written document through tracing
pub struct WriteLogPlugin;

impl Plugin for WriteLogPlugin {
    fn name(&self) -> &str {
        "write-log"
    }

    fn after_emit(&self, target: &Path, written: Written<'_>, ctx: &PluginContext) -> Result<()> {
        let shown = target.strip_prefix(&ctx.output_path).unwrap_or(target);
        match written {
            Written::Manifest(manifest) => {
                info!("Wrote {} ({} keys)", shown.display(), manifest.len())
            }
            Written::Entrypoints(document) => {
                info!("Wrote {} ({} entries)", shown.display(), document.entrypoints.len())
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;

    struct AddKey(&'static str);

    impl Plugin for AddKey {
        fn name(&self) -> &str {
            "add-key"
        }

        fn before_emit_manifest(
            &self,
            mut manifest: ManifestDocument,
            _ctx: &PluginContext,
        ) -> ManifestDocument {
            let seen = manifest.len().to_string();
            manifest.insert(self.0.to_string(), seen);
            manifest
        }
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<PathBuf>>);

    impl Plugin for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        fn after_emit(&self, target: &Path, _written: Written<'_>, _ctx: &PluginContext) -> Result<()> {
            self.0.lock().push(target.to_path_buf());
            Ok(())
        }
    }

    #[test]
    fn test_before_emit_hooks_chain() {
        let mut manager = PluginManager::new(PathBuf::from("/out"));
        manager.register(Arc::new(AddKey("first")));
        manager.register(Arc::new(AddKey("second")));

        let manifest = manager.before_emit_manifest(ManifestDocument::new());

        assert_eq!(manifest["first"], "0");
        assert_eq!(manifest["second"], "1");
    }

    #[test]
    fn test_after_emit_reaches_every_plugin() {
        let recorder = Arc::new(Recorder::default());
        let mut manager = PluginManager::new(PathBuf::from("/out"));
        manager.register(recorder.clone());
        manager.register(Arc::new(WriteLogPlugin));

        let document = EntrypointsDocument::default();
        manager
            .after_emit(Path::new("/out/entrypoints.json"), Written::Entrypoints(&document))
            .unwrap();

        assert_eq!(*recorder.0.lock(), vec![PathBuf::from("/out/entrypoints.json")]);
    }
}
