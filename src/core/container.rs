//! # Container
//!
//! The service container one bootstrap session runs against. It owns the task registry,
//! the strategy registry, the registered service providers (plugins) and console
//! commands, and the set of plugin identifiers that have already been activated.
//!
//! The activated set lives exactly as long as the container: creating a new container
//! starts a new session in which every plugin may be activated once more.

use crate::core::{
    plugins::{Plugin, PluginFactory},
    strategies::StrategyRegistry,
    task_executor::{self, ReleaseRunner},
    tasks::TaskRegistry,
};
use crate::models::Task;
use anyhow::Result;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// An invokable console command, registered through the `hooks.tasks` configuration key.
pub trait ConsoleCommand: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> Option<&str> {
        None
    }

    fn fire(
        &self,
        tasks: &TaskRegistry,
        strategies: &StrategyRegistry,
        runner: &mut dyn ReleaseRunner,
    ) -> Result<()>;
}

pub type CommandFactory = Arc<dyn Fn() -> Arc<dyn ConsoleCommand> + Send + Sync>;

/// Exposes a registered task as a console command of the same name.
#[derive(Debug, Clone)]
pub struct TaskCommand {
    task: String,
    desc: Option<String>,
}

impl TaskCommand {
    pub fn new(task: &Task) -> Self {
        Self {
            task: task.name.clone(),
            desc: task.desc.clone(),
        }
    }
}

impl ConsoleCommand for TaskCommand {
    fn name(&self) -> &str {
        &self.task
    }

    fn description(&self) -> Option<&str> {
        self.desc.as_deref()
    }

    fn fire(
        &self,
        tasks: &TaskRegistry,
        strategies: &StrategyRegistry,
        runner: &mut dyn ReleaseRunner,
    ) -> Result<()> {
        task_executor::execute_task(&self.task, tasks, strategies, runner)
    }
}

pub struct Container {
    session: Uuid,
    tasks: TaskRegistry,
    strategies: StrategyRegistry,
    providers: Vec<Arc<dyn Plugin>>,
    activated: HashSet<String>,
    plugin_catalog: HashMap<String, PluginFactory>,
    command_catalog: HashMap<String, CommandFactory>,
    commands: BTreeMap<String, Arc<dyn ConsoleCommand>>,
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("session", &self.session)
            .field("tasks", &self.tasks)
            .field("strategies", &self.strategies)
            .field(
                "providers",
                &self.providers.iter().map(|p| p.identifier()).collect::<Vec<_>>(),
            )
            .field("activated", &self.activated)
            .field("commands", &self.commands.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl Container {
    /// Creates a container holding the core tasks and the built-in strategies.
    pub fn new() -> Self {
        let session = Uuid::new_v4();
        log::debug!("Opening container session {}.", session);
        Self {
            session,
            tasks: TaskRegistry::with_core_tasks(),
            strategies: StrategyRegistry::with_builtins(),
            providers: Vec::new(),
            activated: HashSet::new(),
            plugin_catalog: HashMap::new(),
            command_catalog: HashMap::new(),
            commands: BTreeMap::new(),
        }
    }

    pub fn session(&self) -> Uuid {
        self.session
    }

    pub fn tasks(&self) -> &TaskRegistry {
        &self.tasks
    }

    pub fn tasks_mut(&mut self) -> &mut TaskRegistry {
        &mut self.tasks
    }

    pub fn strategies(&self) -> &StrategyRegistry {
        &self.strategies
    }

    pub fn strategies_mut(&mut self) -> &mut StrategyRegistry {
        &mut self.strategies
    }

    // --- Service providers ---

    /// Registers a plugin instance. Returns `false` when a provider with the same
    /// identifier is already registered. Registering does not activate.
    pub fn add_service_provider(&mut self, plugin: Arc<dyn Plugin>) -> bool {
        if self.provider(plugin.identifier()).is_some() {
            return false;
        }
        log::debug!("Service provider '{}' registered.", plugin.identifier());
        self.providers.push(plugin);
        true
    }

    pub fn providers(&self) -> &[Arc<dyn Plugin>] {
        &self.providers
    }

    pub fn provider(&self, identifier: &str) -> Option<&Arc<dyn Plugin>> {
        self.providers.iter().find(|p| p.identifier() == identifier)
    }

    pub fn is_activated(&self, identifier: &str) -> bool {
        self.activated.contains(identifier)
    }

    /// Records an activation. Returns `false` if the identifier was already activated.
    pub fn mark_activated(&mut self, identifier: &str) -> bool {
        self.activated.insert(identifier.to_string())
    }

    /// Activated plugin identifiers, sorted.
    pub fn activated(&self) -> Vec<&str> {
        let mut activated: Vec<&str> = self.activated.iter().map(String::as_str).collect();
        activated.sort_unstable();
        activated
    }

    pub fn register_plugin_factory(&mut self, identifier: &str, factory: PluginFactory) {
        self.plugin_catalog.insert(identifier.to_string(), factory);
    }

    /// Resolves a plugin by identifier: an already registered provider first, then the catalog.
    pub fn resolve_plugin(&self, identifier: &str) -> Option<Arc<dyn Plugin>> {
        if let Some(provider) = self.provider(identifier) {
            return Some(Arc::clone(provider));
        }
        self.plugin_catalog.get(identifier).map(|factory| factory())
    }

    // --- Console commands ---

    pub fn register_command_factory(&mut self, identifier: &str, factory: CommandFactory) {
        self.command_catalog.insert(identifier.to_string(), factory);
    }

    pub fn resolve_command(&self, identifier: &str) -> Option<Arc<dyn ConsoleCommand>> {
        self.command_catalog.get(identifier).map(|factory| factory())
    }

    /// Registers a command under its name, replacing any command of the same name.
    pub fn register_command(&mut self, command: Arc<dyn ConsoleCommand>) {
        log::debug!("Console command '{}' registered.", command.name());
        self.commands.insert(command.name().to_string(), command);
    }

    pub fn command(&self, name: &str) -> Option<&Arc<dyn ConsoleCommand>> {
        self.commands.get(name)
    }

    /// Registered commands, ordered by name.
    pub fn commands(&self) -> impl Iterator<Item = &Arc<dyn ConsoleCommand>> {
        self.commands.values()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::panic)]
mod tests {
    use super::*;
    use crate::core::tasks::TaskQueue;

    struct Named(&'static str);

    impl Plugin for Named {
        fn identifier(&self) -> &str {
            self.0
        }

        fn on_queue(&self, _tasks: &mut TaskQueue<'_>) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_providers_are_deduplicated_by_identifier() {
        let mut container = Container::new();
        assert!(container.add_service_provider(Arc::new(Named("Notifier"))));
        assert!(!container.add_service_provider(Arc::new(Named("Notifier"))));
        assert_eq!(container.providers().len(), 1);
        assert!(!container.is_activated("Notifier"));
    }

    #[test]
    fn test_resolve_prefers_registered_provider() {
        let mut container = Container::new();
        container.register_plugin_factory(
            "Slack",
            Arc::new(|| Arc::new(Named("Slack")) as Arc<dyn Plugin>),
        );
        assert!(container.resolve_plugin("Slack").is_some());
        assert!(container.resolve_plugin("Unknown").is_none());

        let provider: Arc<dyn Plugin> = Arc::new(Named("Notifier"));
        container.add_service_provider(Arc::clone(&provider));
        let resolved = container.resolve_plugin("Notifier").unwrap();
        assert!(Arc::ptr_eq(&resolved, &provider));
    }

    #[test]
    fn test_activation_is_recorded_once() {
        let mut container = Container::new();
        assert!(container.mark_activated("Notifier"));
        assert!(!container.mark_activated("Notifier"));
        assert_eq!(container.activated(), vec!["Notifier"]);
    }

    #[test]
    fn test_sessions_are_distinct() {
        assert_ne!(Container::new().session(), Container::new().session());
    }

    #[test]
    fn test_task_command_uses_task_name() {
        let container = Container::new();
        let task = container.tasks().task("test").unwrap();
        let command = TaskCommand::new(task);
        assert_eq!(command.name(), "test");
        assert!(command.description().is_some());
    }
}
