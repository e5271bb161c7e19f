//! # Loaders
//!
//! One function per kind of userland input. Every loader treats a missing input as an
//! empty one, evaluates files through the [`Evaluator`] (so the reserved application
//! directory is filtered out before anything is read), and stops at the first malformed
//! file. Registrations made by files processed before the failure are kept.

use crate::{
    constants::{COMMAND_HOOKS_KEY, PLUGINS_CONFIG_KEY, STRATEGIES_CONFIG_KEY},
    core::{
        bootstrapper::BootstrapError,
        config::Configuration,
        container::{ConsoleCommand, Container, TaskCommand},
        plugins::{ManifestPlugin, Plugin},
        script::{Evaluator, ScriptError, apply_hooks, apply_tasks},
        strategies::{CommandStrategy, StrategyRegistry, command_factory},
        tasks::TaskRegistry,
    },
    models::{EventDocument, ListenerOrigin, PluginManifest, StrategyCategory, StrategyDocument, TaskDocument},
};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Loads `.rocketeer/tasks.toml`. Returns the number of tasks registered.
pub fn load_task_definitions(
    evaluator: &Evaluator<'_>,
    tasks: &mut TaskRegistry,
) -> Result<usize, ScriptError> {
    let path = evaluator.paths().task_definition_path();
    if !evaluator.exists(&path) {
        log::debug!("No task definitions at '{}'.", path.display());
        return Ok(0);
    }

    let document: TaskDocument = evaluator.load(&path)?;
    let count = apply_tasks(document.tasks, &mut tasks.queue(ListenerOrigin::User));
    log::debug!("Registered {} tasks from '{}'.", count, path.display());
    Ok(count)
}

/// Loads every file in `.rocketeer/events/`, in name order. Returns the number of listeners appended.
///
/// Files listed in `applied` are skipped, and every file applied is added to it, so
/// calling this again in the same session does not append the same listeners twice.
pub fn load_event_hooks(
    evaluator: &Evaluator<'_>,
    tasks: &mut TaskRegistry,
    applied: &mut HashSet<PathBuf>,
) -> Result<usize, ScriptError> {
    let dir = evaluator.paths().event_directory();
    if !evaluator.exists(&dir) {
        log::debug!("No event directory at '{}'.", dir.display());
        return Ok(0);
    }

    let mut count = 0;
    for file in evaluator.scan(&dir)? {
        if applied.contains(&file) {
            log::debug!("Event file '{}' already applied, skipping.", file.display());
            continue;
        }
        let document: EventDocument = evaluator.load(&file)?;
        let added = apply_hooks(
            document.before,
            document.after,
            &mut tasks.queue(ListenerOrigin::User),
        );
        log::debug!("Registered {} listeners from '{}'.", added, file.display());
        applied.insert(file);
        count += added;
    }
    Ok(count)
}

/// Binds the categories named under `[strategies]` in the configuration.
pub fn apply_configured_strategies(
    config: &Configuration,
    strategies: &mut StrategyRegistry,
) -> Result<(), BootstrapError> {
    for category in StrategyCategory::ALL {
        let key = format!("{}.{}", STRATEGIES_CONFIG_KEY, category);
        if let Some(identifier) = config.get_str(&key) {
            strategies.bind(category, identifier)?;
            log::debug!("Configured '{}' as the {} strategy.", identifier, category);
        }
    }
    Ok(())
}

/// Loads every file in `.rocketeer/config/strategies/`. Each file registers one strategy
/// and binds its category to it; the strategy itself is not fired.
pub fn load_strategy_overrides(
    evaluator: &Evaluator<'_>,
    namespace: &str,
    strategies: &mut StrategyRegistry,
) -> Result<usize, ScriptError> {
    let dir = evaluator.paths().strategy_directory();
    if !evaluator.exists(&dir) {
        log::debug!("No strategy directory at '{}'.", dir.display());
        return Ok(0);
    }

    let mut count = 0;
    for file in evaluator.scan(&dir)? {
        let document: StrategyDocument = evaluator.load(&file)?;
        let identifier = document
            .id
            .unwrap_or_else(|| default_identifier(namespace, &file));
        let strategy = CommandStrategy {
            category: document.category,
            identifier: identifier.clone(),
            desc: document.desc,
            commands: document.run.into_commands(),
        };
        strategies.register_override(document.category, &identifier, command_factory(strategy));
        log::debug!(
            "Registered {} strategy '{}' from '{}'.",
            document.category,
            identifier,
            file.display()
        );
        count += 1;
    }
    Ok(count)
}

/// Activates every plugin that has not been activated in this container yet.
///
/// Candidates are the providers already in the container, the identifiers listed under
/// `plugins` in the configuration, and the manifests in `.rocketeer/plugins/`. Returns the
/// number of plugins activated by this call; a second call with the same inputs returns 0
/// and changes nothing.
///
/// A plugin is marked activated before its hook runs. If the hook fails, the call stops
/// with [`BootstrapError::Plugin`]; the plugin stays activated and is not retried, and
/// whatever it registered before failing is kept.
pub fn load_plugins(
    evaluator: &Evaluator<'_>,
    namespace: &str,
    config: &Configuration,
    container: &mut Container,
) -> Result<usize, BootstrapError> {
    let mut candidates: Vec<Arc<dyn Plugin>> = container.providers().to_vec();

    for identifier in config.get_list(PLUGINS_CONFIG_KEY) {
        if container.is_activated(&identifier) {
            continue;
        }
        let plugin = container
            .resolve_plugin(&identifier)
            .ok_or_else(|| BootstrapError::UnknownPlugin {
                identifier: identifier.clone(),
            })?;
        candidates.push(plugin);
    }

    let dir = evaluator.paths().plugin_directory();
    if evaluator.exists(&dir) {
        for file in evaluator.scan(&dir)? {
            let manifest: PluginManifest = evaluator.load(&file)?;
            let identifier = manifest
                .id
                .clone()
                .unwrap_or_else(|| default_identifier(namespace, &file));
            candidates.push(Arc::new(ManifestPlugin::new(identifier, manifest, file)));
        }
    } else {
        log::debug!("No plugin directory at '{}'.", dir.display());
    }

    let mut activated = 0;
    for plugin in candidates {
        let identifier = plugin.identifier().to_string();
        if container.is_activated(&identifier) {
            log::debug!("Plugin '{}' already activated, skipping.", identifier);
            continue;
        }

        container.add_service_provider(Arc::clone(&plugin));
        container.mark_activated(&identifier);
        plugin
            .on_queue(
                &mut container
                    .tasks_mut()
                    .queue(ListenerOrigin::Plugin(identifier.clone())),
            )
            .map_err(|source| BootstrapError::Plugin {
                identifier: identifier.clone(),
                source: source.into(),
            })?;
        log::info!("Plugin '{}' activated.", identifier);
        activated += 1;
    }
    Ok(activated)
}

/// Registers the console commands listed under `hooks.tasks`.
///
/// Each identifier is resolved through the command catalog first; an identifier naming a
/// registered task is exposed as a command running that task.
pub fn register_configured_commands(
    config: &Configuration,
    container: &mut Container,
) -> Result<usize, BootstrapError> {
    let identifiers = config.get_list(COMMAND_HOOKS_KEY);
    for identifier in &identifiers {
        let command: Arc<dyn ConsoleCommand> = match container.resolve_command(identifier) {
            Some(command) => command,
            None => match container.tasks().task(identifier) {
                Some(task) => Arc::new(TaskCommand::new(task)),
                None => {
                    return Err(BootstrapError::UnknownCommand {
                        identifier: identifier.clone(),
                    });
                }
            },
        };
        container.register_command(command);
    }
    Ok(identifiers.len())
}

/// `<Namespace>\<FileStem>`, for user files that do not declare an `id`.
pub fn default_identifier(namespace: &str, file: &Path) -> String {
    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{}\\{}", namespace, stem)
}
