//! # User Bootstrapper
//!
//! Drives the three bootstrap phases against one [`Container`]:
//!
//! - `bootstrap_paths` resolves where the userland lives.
//! - `bootstrap_user_files` loads task definitions, event hooks and strategy overrides.
//! - `bootstrap_user_code` activates plugins and registers the configured console commands.
//!
//! Every phase may be called again. Tasks and strategies are overwritten in place, event
//! files and plugins already applied in this session are skipped.

use crate::{
    core::{
        config::{ConfigError, Configuration},
        container::Container,
        loaders,
        namespace::derive_namespace,
        paths::PathResolver,
        script::{Evaluator, ScriptError},
        strategies::StrategyError,
    },
    system::filesystem::Filesystem,
};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error(transparent)]
    Script(#[from] ScriptError),

    #[error(transparent)]
    Strategy(#[from] StrategyError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Plugin '{identifier}' is not registered in the plugin catalog.")]
    UnknownPlugin { identifier: String },

    #[error("Plugin '{identifier}' failed to register its tasks: {source}")]
    Plugin {
        identifier: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("'{identifier}' is neither a known console command nor a registered task.")]
    UnknownCommand { identifier: String },
}

pub struct UserBootstrapper {
    fs: Arc<dyn Filesystem>,
    paths: PathResolver,
    config: Configuration,
    container: Container,
    applied_event_files: HashSet<PathBuf>,
}

impl UserBootstrapper {
    pub fn new(
        fs: Arc<dyn Filesystem>,
        paths: PathResolver,
        config: Configuration,
        container: Container,
    ) -> Self {
        Self {
            fs,
            paths,
            config,
            container,
            applied_event_files: HashSet::new(),
        }
    }

    /// Loads `.rocketeer/config.toml` below `paths` and starts a fresh container.
    pub fn open(fs: Arc<dyn Filesystem>, paths: PathResolver) -> Result<Self, BootstrapError> {
        let config = Configuration::load(fs.as_ref(), &paths.config_path())?;
        Ok(Self::new(fs, paths, config, Container::new()))
    }

    /// Runs every phase in order.
    pub fn bootstrap(&mut self) -> Result<(), BootstrapError> {
        self.bootstrap_paths();
        self.bootstrap_user_files()?;
        self.bootstrap_user_code()
    }

    pub fn bootstrap_paths(&self) -> &PathResolver {
        log::debug!(
            "Userland for '{}' resolved at '{}'.",
            self.paths.root().display(),
            self.paths.userland_path().display()
        );
        &self.paths
    }

    pub fn bootstrap_user_files(&mut self) -> Result<(), BootstrapError> {
        let namespace = self.user_namespace();
        let evaluator = Evaluator::new(self.fs.as_ref(), &self.paths);

        let tasks = loaders::load_task_definitions(&evaluator, self.container.tasks_mut())?;
        let listeners = loaders::load_event_hooks(
            &evaluator,
            self.container.tasks_mut(),
            &mut self.applied_event_files,
        )?;
        loaders::apply_configured_strategies(&self.config, self.container.strategies_mut())?;
        let strategies = loaders::load_strategy_overrides(
            &evaluator,
            &namespace,
            self.container.strategies_mut(),
        )?;

        log::info!(
            "User files loaded: {} tasks, {} listeners, {} strategies.",
            tasks,
            listeners,
            strategies
        );
        Ok(())
    }

    pub fn bootstrap_user_code(&mut self) -> Result<(), BootstrapError> {
        let namespace = self.user_namespace();
        let evaluator = Evaluator::new(self.fs.as_ref(), &self.paths);

        let plugins =
            loaders::load_plugins(&evaluator, &namespace, &self.config, &mut self.container)?;
        let commands = loaders::register_configured_commands(&self.config, &mut self.container)?;

        log::info!(
            "User code loaded: {} plugins activated, {} commands registered.",
            plugins,
            commands
        );
        Ok(())
    }

    /// The namespace user strategies and plugins live under, derived from `application_name`.
    pub fn user_namespace(&self) -> String {
        derive_namespace(self.config.application_name())
    }

    pub fn paths(&self) -> &PathResolver {
        &self.paths
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Configuration {
        &mut self.config
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn container_mut(&mut self) -> &mut Container {
        &mut self.container
    }
}
