// src/bin/rocketeer.rs

use anyhow::Result;
use clap::Parser;
use colored::*;
use rocketeer::cli::{Cli, handlers};

/// A system action, its aliases, and its handler.
struct ActionDefinition {
    name: &'static str,
    aliases: &'static [&'static str],
    handler: fn(Vec<String>, Option<&str>) -> Result<()>,
}

static ACTION_REGISTRY: &[ActionDefinition] = &[
    ActionDefinition {
        name: "list",
        aliases: &["ls"],
        handler: handlers::list::handle,
    },
    ActionDefinition {
        name: "namespace",
        aliases: &["ns"],
        handler: handlers::namespace::handle,
    },
    ActionDefinition {
        name: "run",
        aliases: &[],
        handler: handlers::run::handle,
    },
];

fn find_action(name: &str) -> Option<&'static ActionDefinition> {
    ACTION_REGISTRY
        .iter()
        .find(|action| action.name == name || action.aliases.contains(&name))
}

fn main() {
    env_logger::init();

    if let Err(e) = run_cli(Cli::parse()) {
        eprintln!("\n{}: {:#}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

/// Routes `rocketeer <action> [args...]` to its handler. Anything that is not a known
/// action is taken as a task name: `rocketeer <task>` runs it.
fn run_cli(cli: Cli) -> Result<()> {
    log::debug!("CLI args parsed: {:?}", cli);
    let root = cli.root.as_deref();

    let Some(first) = cli.action_or_task else {
        return handlers::list::handle(cli.args, root);
    };

    match find_action(&first) {
        Some(action) => (action.handler)(cli.args, root),
        None => {
            let mut run_args = vec![first];
            run_args.extend(cli.args);
            handlers::run::handle(run_args, root)
        }
    }
}
