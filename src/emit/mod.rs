//! Emit cycle
//!
//! Runs once per compilation: classify the output, build both documents and
//! write them when no newer compilation is pending for the same target.

mod coordinator;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::Config;
use crate::entrypoints::{EntryPoint, EntrypointAggregator, EntrypointsDocument};
use crate::integrity::IntegrityComputer;
use crate::manifest::{
    prune_style_entry_scripts, AssetClassifier, HookChain, ManifestDocument, ManifestHooks,
    ManifestWriter, StableKeys,
};
use crate::plugins::{Plugin, PluginManager, Written};
use crate::stats::{CompilationStats, ModuleAssets};

pub use coordinator::{EmitCoordinator, EmitTurn};

/// Result of one emit cycle
#[derive(Debug, Clone)]
pub struct EmitOutcome {
    pub manifest: ManifestDocument,
    pub entrypoints: EntrypointsDocument,

    /// Absolute manifest path, written only when `manifest_written`
    pub manifest_target: PathBuf,
    pub manifest_written: bool,

    /// Absolute entrypoints path, written only when `entrypoints_written`
    pub entrypoints_target: PathBuf,
    pub entrypoints_written: bool,

    /// Style-entry scripts deleted from the output directory
    pub pruned: Vec<PathBuf>,
}

/// Produces `manifest.json` and `entrypoints.json` for successive
/// compilations of one build session
pub struct Emitter {
    config: Arc<Config>,
    coordinator: Arc<EmitCoordinator>,
    integrity: IntegrityComputer,
    hooks: HookChain,
    plugins: PluginManager,
}

impl Emitter {
    /// Create an emitter with its own coordinator
    pub fn new(config: Arc<Config>) -> Self {
        let integrity = IntegrityComputer::new(config.integrity.algorithms.clone());
        let plugins = PluginManager::new(config.output_dir());

        let mut hooks = HookChain::new();
        if config.manifest.stable_keys {
            hooks.push(Arc::new(StableKeys));
        }

        Self {
            config,
            coordinator: Arc::new(EmitCoordinator::new()),
            integrity,
            hooks,
            plugins,
        }
    }

    /// Share pending counts with other emitters writing the same targets
    pub fn with_coordinator(mut self, coordinator: Arc<EmitCoordinator>) -> Self {
        self.coordinator = coordinator;
        self
    }

    /// Append manifest hooks; they see the result of earlier hooks
    pub fn with_hooks(mut self, hooks: Arc<dyn ManifestHooks>) -> Self {
        self.hooks.push(hooks);
        self
    }

    /// Register a plugin
    pub fn register(&mut self, plugin: Arc<dyn Plugin>) {
        self.plugins.register(plugin);
    }

    pub fn coordinator(&self) -> &Arc<EmitCoordinator> {
        &self.coordinator
    }

    /// A compilation was triggered (initial run or watch rebuild)
    pub fn compilation_started(&self) -> Result<()> {
        let manifest_target = self.config.manifest_target()?;
        let entrypoints_target = self.config.entrypoints_target()?;

        self.coordinator.begin(&manifest_target);
        self.coordinator.begin(&entrypoints_target);

        Ok(())
    }

    /// Build both documents for a finished compilation and write them when
    /// this is the last compilation pending for their targets.
    ///
    /// Both turns are taken before any step that can fail, so a failed emit
    /// still releases its pending count.
    pub fn emit(
        &mut self,
        stats: &CompilationStats,
        module_assets: &ModuleAssets,
    ) -> Result<EmitOutcome> {
        let manifest_target = self.config.manifest_target()?;
        let entrypoints_target = self.config.entrypoints_target()?;
        let output_dir = self.config.output_dir();
        let style_entries = self.config.style_entries();
        let skip_entries = self.config.skip_entries();

        let manifest_turn = self.coordinator.finish(&manifest_target);
        let entrypoints_turn = self.coordinator.finish(&entrypoints_target);

        self.integrity.clear();

        let pruned = if self.config.entries.prune_style_scripts {
            prune_style_entry_scripts(stats, &style_entries, &output_dir)?
        } else {
            Vec::new()
        };

        let records = AssetClassifier::new(&output_dir)
            .use_entry_keys(self.config.manifest.use_entry_keys)
            .with_coordinator(&self.coordinator)
            .classify(stats, module_assets);
        debug!("Classified {} output file(s)", records.len());

        let manifest = ManifestWriter::new(self.config.manifest_options())
            .with_hooks(self.hooks.clone())
            .write(records, stats);
        let manifest = self.plugins.before_emit_manifest(manifest);

        let entries = EntryPoint::resolve_all(stats);
        let entrypoints = EntrypointAggregator::new(
            &self.config.output.public_path,
            &output_dir,
            &skip_entries,
            &style_entries,
        )
        .aggregate(&entries, &mut self.integrity);
        let entrypoints = self.plugins.before_emit_entrypoints(entrypoints);

        let manifest_written = self.write_if_last(
            manifest_turn,
            &manifest_target,
            &manifest,
            Written::Manifest(&manifest),
        )?;
        let entrypoints_written = self.write_if_last(
            entrypoints_turn,
            &entrypoints_target,
            &entrypoints,
            Written::Entrypoints(&entrypoints),
        )?;

        Ok(EmitOutcome {
            manifest,
            entrypoints,
            manifest_target,
            manifest_written,
            entrypoints_target,
            entrypoints_written,
            pruned,
        })
    }

    fn write_if_last<T: Serialize>(
        &self,
        turn: EmitTurn,
        target: &Path,
        document: &T,
        written: Written<'_>,
    ) -> Result<bool> {
        if let EmitTurn::Superseded { pending } = turn {
            info!(
                "Skipping write of {}: {} newer compilation(s) pending",
                target.display(),
                pending
            );
            return Ok(false);
        }

        write_json(target, document)?;
        self.plugins.after_emit(target, written)?;

        Ok(true)
    }
}

/// Write a document as pretty-printed JSON, creating parent directories
pub fn write_json<T: Serialize>(target: &Path, document: &T) -> Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(document)?;
    fs::write(target, json).with_context(|| format!("Failed to write {}", target.display()))?;

    Ok(())
}
