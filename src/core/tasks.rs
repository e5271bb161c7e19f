//! # Task Registry
//!
//! The in-process sink that every loader writes into: a mapping from task name to task,
//! and from `(task, phase)` to the ordered list of listeners hooked onto it.
//!
//! Loaders never touch the registry directly. They receive a [`TaskQueue`], a handle that
//! stamps every listener with the origin of whoever registered it, so core hooks can be
//! told apart from user and plugin hooks later on.

use crate::models::{EventListener, ListenerOrigin, Phase, StrategyCategory, Task, TaskAction, TaskClosure};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: BTreeMap<String, Arc<Task>>,
    listeners: HashMap<(String, Phase), Vec<EventListener>>,
}

impl TaskRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry pre-populated with one core task per strategy category.
    /// Each of them fires whatever strategy is bound to its category at run time.
    pub fn with_core_tasks() -> Self {
        let mut registry = Self::new();
        for category in StrategyCategory::ALL {
            registry.register_task(Task {
                name: category.as_str().to_string(),
                desc: Some(format!("Runs the '{}' strategy", category)),
                action: TaskAction::Strategy(category),
            });
        }
        registry
    }

    /// Registers a task, replacing any task already bound to the same name.
    pub fn register_task(&mut self, task: Task) -> Arc<Task> {
        let task = Arc::new(task);
        if self
            .tasks
            .insert(task.name.clone(), Arc::clone(&task))
            .is_some()
        {
            log::debug!("Task '{}' re-registered, previous binding replaced.", task.name);
        } else {
            log::trace!("Task '{}' registered.", task.name);
        }
        task
    }

    /// Appends a listener under `(target, phase)`. Listeners are never replaced.
    ///
    /// The target task does not need to exist yet.
    pub fn register_listener(
        &mut self,
        target: &str,
        phase: Phase,
        task: Task,
        origin: ListenerOrigin,
    ) {
        log::trace!(
            "Listener '{}' registered {} '{}' ({}).",
            task.name,
            phase,
            target,
            origin
        );
        self.listeners
            .entry((target.to_string(), phase))
            .or_default()
            .push(EventListener {
                target: target.to_string(),
                phase,
                task: Arc::new(task),
                origin,
            });
    }

    pub fn task(&self, name: &str) -> Option<&Arc<Task>> {
        self.tasks.get(name)
    }

    /// All registered tasks, ordered by name.
    pub fn tasks(&self) -> impl Iterator<Item = &Arc<Task>> {
        self.tasks.values()
    }

    /// The listeners of `task` for `phase`, in registration order.
    ///
    /// With `exclude_core`, listeners the embedding application registered under
    /// [`ListenerOrigin::Core`] are left out.
    pub fn listeners(&self, task: &str, phase: Phase, exclude_core: bool) -> Vec<&EventListener> {
        self.listeners
            .get(&(task.to_string(), phase))
            .map(|listeners| {
                listeners
                    .iter()
                    .filter(|l| !(exclude_core && l.origin == ListenerOrigin::Core))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every `(target, phase)` pair that has listeners, sorted.
    pub fn hooked_targets(&self) -> Vec<(&str, Phase)> {
        let mut targets: Vec<_> = self
            .listeners
            .keys()
            .map(|(target, phase)| (target.as_str(), *phase))
            .collect();
        targets.sort();
        targets
    }

    /// Opens a registration handle whose listeners are stamped with `origin`.
    pub fn queue(&mut self, origin: ListenerOrigin) -> TaskQueue<'_> {
        TaskQueue {
            registry: self,
            origin,
        }
    }
}

/// The registration surface handed to user files and plugins.
pub struct TaskQueue<'a> {
    registry: &'a mut TaskRegistry,
    origin: ListenerOrigin,
}

impl TaskQueue<'_> {
    pub fn origin(&self) -> &ListenerOrigin {
        &self.origin
    }

    /// Registers (or replaces) a task backed by a command sequence.
    pub fn task(&mut self, name: &str, commands: Vec<String>) -> Arc<Task> {
        self.registry.register_task(Task::from_commands(name, commands))
    }

    /// Registers (or replaces) a fully built task.
    pub fn add_task(&mut self, task: Task) -> Arc<Task> {
        self.registry.register_task(task)
    }

    /// Registers (or replaces) a task backed by a closure.
    pub fn closure(&mut self, name: &str, closure: TaskClosure) -> Arc<Task> {
        self.registry.register_task(Task::from_closure(name, closure))
    }

    pub fn before(&mut self, target: &str, commands: Vec<String>) {
        self.listen(target, Phase::Before, Task::anonymous(commands));
    }

    pub fn after(&mut self, target: &str, commands: Vec<String>) {
        self.listen(target, Phase::After, Task::anonymous(commands));
    }

    /// Appends an arbitrary task as a listener.
    pub fn listen(&mut self, target: &str, phase: Phase, task: Task) {
        self.registry
            .register_listener(target, phase, task, self.origin.clone());
    }
}
