// src/models.rs

use crate::core::task_executor::ReleaseRunner;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

// --- RUNTIME MODELS ---
// These are the structures held by the task registry once user files have been evaluated.

/// An opaque unit of work registered by compiled plugins.
pub type TaskClosure = Arc<dyn Fn(&mut dyn ReleaseRunner) -> anyhow::Result<()> + Send + Sync>;

/// What a task does when it is fired.
#[derive(Clone)]
pub enum TaskAction {
    /// A literal, ordered sequence of shell commands.
    Commands(Vec<String>),
    /// An opaque closure.
    Closure(TaskClosure),
    /// Delegates to whichever strategy is currently bound to the category.
    Strategy(StrategyCategory),
}

impl fmt::Debug for TaskAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskAction::Commands(commands) => f.debug_tuple("Commands").field(commands).finish(),
            TaskAction::Closure(_) => f.write_str("Closure(..)"),
            TaskAction::Strategy(category) => f.debug_tuple("Strategy").field(category).finish(),
        }
    }
}

/// A named, registered unit of work.
#[derive(Debug, Clone)]
pub struct Task {
    pub name: String,
    pub desc: Option<String>,
    pub action: TaskAction,
}

impl Task {
    /// Creates a task backed by a literal command sequence.
    pub fn from_commands(name: impl Into<String>, commands: Vec<String>) -> Self {
        Self {
            name: name.into(),
            desc: None,
            action: TaskAction::Commands(commands),
        }
    }

    /// Creates a task backed by a closure.
    pub fn from_closure(name: impl Into<String>, closure: TaskClosure) -> Self {
        Self {
            name: name.into(),
            desc: None,
            action: TaskAction::Closure(closure),
        }
    }

    /// Creates an unnamed task, named after the commands it runs. Used for listeners.
    pub fn anonymous(commands: Vec<String>) -> Self {
        Self::from_commands(commands.join(" && "), commands)
    }

    pub fn with_desc(mut self, desc: Option<String>) -> Self {
        self.desc = desc;
        self
    }

    /// Returns the command sequence for string-backed tasks, `None` otherwise.
    pub fn string_task(&self) -> Option<&[String]> {
        match &self.action {
            TaskAction::Commands(commands) => Some(commands),
            _ => None,
        }
    }
}

/// Hook timing relative to a target task.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Before,
    After,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Before => "before",
            Phase::After => "after",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who registered a listener. Core listeners can be filtered out of lookups.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ListenerOrigin {
    /// Built-in hooks of the embedding application, registered through
    /// `TaskRegistry::queue(ListenerOrigin::Core)` before the userland is loaded.
    /// The bootstrapper itself never produces this origin.
    Core,
    /// Event files in `.rocketeer/events/`.
    User,
    /// The plugin with this identifier.
    Plugin(String),
}

impl fmt::Display for ListenerOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListenerOrigin::Core => f.write_str("core"),
            ListenerOrigin::User => f.write_str("user"),
            ListenerOrigin::Plugin(id) => write!(f, "plugin:{}", id),
        }
    }
}

/// A task attached as a hook to another task.
#[derive(Debug, Clone)]
pub struct EventListener {
    pub target: String,
    pub phase: Phase,
    pub task: Arc<Task>,
    pub origin: ListenerOrigin,
}

impl EventListener {
    pub fn string_task(&self) -> Option<&[String]> {
        self.task.string_task()
    }
}

/// A deployment sub-concern a strategy can be bound to.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum StrategyCategory {
    Check,
    Dependencies,
    Test,
    Migrate,
}

impl StrategyCategory {
    pub const ALL: [StrategyCategory; 4] = [
        StrategyCategory::Check,
        StrategyCategory::Dependencies,
        StrategyCategory::Test,
        StrategyCategory::Migrate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyCategory::Check => "check",
            StrategyCategory::Dependencies => "dependencies",
            StrategyCategory::Test => "test",
            StrategyCategory::Migrate => "migrate",
        }
    }
}

impl fmt::Display for StrategyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StrategyCategory::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| s.to_string())
    }
}

// --- USER FILE MODELS (What is read from the .rocketeer/ files) ---
// Each evaluation context gets its own document type, so a file can only reach
// the registration primitives of the context it is loaded in.

/// A command, or a sequence of commands.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Runnable {
    Sequence(Vec<String>),
    Single(String),
}

impl Runnable {
    pub fn into_commands(self) -> Vec<String> {
        match self {
            Runnable::Sequence(commands) => commands,
            Runnable::Single(command) => vec![command],
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ExtendedTask {
    pub run: Runnable,
    pub desc: Option<String>,
}

/// A task entry in `tasks.toml`. Uses `untagged` for flexible syntax.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum TaskDefinition {
    Sequence(Vec<String>),
    Simple(String),
    Extended(ExtendedTask),
}

impl TaskDefinition {
    /// Splits the definition into its command sequence and description.
    pub fn into_parts(self) -> (Vec<String>, Option<String>) {
        match self {
            TaskDefinition::Sequence(commands) => (commands, None),
            TaskDefinition::Simple(command) => (vec![command], None),
            TaskDefinition::Extended(ext) => (ext.run.into_commands(), ext.desc),
        }
    }
}

/// A single before/after hook entry.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct HookDefinition {
    pub task: String,
    pub run: Runnable,
    pub desc: Option<String>,
}

/// The contents of `.rocketeer/tasks.toml`.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct TaskDocument {
    #[serde(default)]
    pub tasks: BTreeMap<String, TaskDefinition>,
}

/// The contents of a file in `.rocketeer/events/`.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct EventDocument {
    #[serde(default)]
    pub before: Vec<HookDefinition>,
    #[serde(default)]
    pub after: Vec<HookDefinition>,
}

/// The contents of a file in `.rocketeer/config/strategies/`.
#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct StrategyDocument {
    pub category: StrategyCategory,
    pub id: Option<String>,
    pub desc: Option<String>,
    pub run: Runnable,
}

/// The contents of a file in `.rocketeer/plugins/`.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct PluginManifest {
    pub id: Option<String>,
    pub desc: Option<String>,
    #[serde(default)]
    pub tasks: BTreeMap<String, TaskDefinition>,
    #[serde(default)]
    pub before: Vec<HookDefinition>,
    #[serde(default)]
    pub after: Vec<HookDefinition>,
}
