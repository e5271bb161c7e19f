// src/cli/mod.rs

use clap::Parser;

pub mod handlers;

/// rocketeer: loads a project's `.rocketeer/` userland and runs its tasks.
///
/// Valid formats:
/// - `rocketeer <action> [args...]` (e.g., `rocketeer list --json`)
/// - `rocketeer <task>` -> shortcut for `rocketeer run <task>`
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    /// The project root containing `.rocketeer/`. Defaults to the current directory.
    #[arg(long, global = true)]
    pub root: Option<String>,

    /// A system action (`list`, `run`, `namespace`) or the name of a task to run.
    pub action_or_task: Option<String>,

    /// All remaining arguments, passed to the action.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}
