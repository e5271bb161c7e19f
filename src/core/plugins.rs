// src/core/plugins.rs

use crate::{
    core::{
        script::{apply_hooks, apply_tasks},
        tasks::TaskQueue,
    },
    models::PluginManifest,
};
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A unit of extension that, once activated, registers its own tasks and listeners.
///
/// Identity is the identifier, not the instance: two instances reporting the same
/// identifier are the same plugin as far as activation is concerned.
pub trait Plugin: Send + Sync {
    fn identifier(&self) -> &str;

    fn description(&self) -> Option<&str> {
        None
    }

    /// Activation hook. Called at most once per container.
    fn on_queue(&self, tasks: &mut TaskQueue<'_>) -> Result<()>;
}

/// Builds a plugin from its identifier, for plugins named in the configuration.
pub type PluginFactory = Arc<dyn Fn() -> Arc<dyn Plugin> + Send + Sync>;

/// A plugin declared by a manifest file in `.rocketeer/plugins/`.
#[derive(Debug, Clone)]
pub struct ManifestPlugin {
    identifier: String,
    manifest: PluginManifest,
    source: PathBuf,
}

impl ManifestPlugin {
    pub fn new(identifier: String, manifest: PluginManifest, source: PathBuf) -> Self {
        Self {
            identifier,
            manifest,
            source,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }
}

impl Plugin for ManifestPlugin {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn description(&self) -> Option<&str> {
        self.manifest.desc.as_deref()
    }

    fn on_queue(&self, tasks: &mut TaskQueue<'_>) -> Result<()> {
        let manifest = self.manifest.clone();
        let task_count = apply_tasks(manifest.tasks, tasks);
        let hook_count = apply_hooks(manifest.before, manifest.after, tasks);
        log::debug!(
            "Plugin '{}' ({}) registered {} tasks and {} listeners.",
            self.identifier,
            self.source.display(),
            task_count,
            hook_count
        );
        Ok(())
    }
}
