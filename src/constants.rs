// src/constants.rs

/// The name of the directory containing the userland configuration of a project.
pub const USERLAND_DIR: &str = ".rocketeer";

/// The declarative task-definition file (inside .rocketeer/).
pub const TASKS_FILENAME: &str = "tasks.toml";

/// The userland configuration file (inside .rocketeer/).
pub const CONFIG_FILENAME: &str = "config.toml";

/// The directory holding event-hook files (inside .rocketeer/).
pub const EVENTS_DIR: &str = "events";

/// The directory holding strategy overrides (inside .rocketeer/config/).
pub const STRATEGIES_DIR: &str = "strategies";

/// The directory holding plugin manifests (inside .rocketeer/).
pub const PLUGINS_DIR: &str = "plugins";

/// The application-reserved sub-namespace. Nothing below it is ever evaluated by the bootstrapper.
pub const RESERVED_APP_DIR: &str = "app";

/// The only extension the evaluator accepts for user files.
pub const USER_FILE_EXTENSION: &str = "toml";

/// The namespace used when no application name is configured.
pub const DEFAULT_NAMESPACE: &str = "Userland";

/// Configuration key listing plugin identifiers to resolve through the plugin catalog.
pub const PLUGINS_CONFIG_KEY: &str = "plugins";

/// Configuration key listing command identifiers (or task names) to expose as console commands.
pub const COMMAND_HOOKS_KEY: &str = "hooks.tasks";

/// Configuration table mapping a strategy category to its default identifier.
pub const STRATEGIES_CONFIG_KEY: &str = "strategies";
