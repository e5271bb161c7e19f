use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use serde::Serialize;

use crate::{
    cli::handlers::commons,
    core::container::Container,
    models::{Phase, TaskAction},
};

#[derive(Parser, Debug, Default)]
#[command(
    no_binary_name = true,
    about = "Lists the tasks, listeners, strategies, plugins and commands of the userland."
)]
struct ListArgs {
    /// Print the listing as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Serialize, Debug, PartialEq)]
pub struct TaskSummary {
    pub name: String,
    pub desc: Option<String>,
    pub kind: String,
}

#[derive(Serialize, Debug, PartialEq)]
pub struct ListenerSummary {
    pub target: String,
    pub phase: Phase,
    pub origin: String,
    pub commands: Option<Vec<String>>,
}

#[derive(Serialize, Debug, PartialEq)]
pub struct StrategySummary {
    pub category: String,
    pub bound: String,
    pub available: Vec<String>,
}

/// Everything a bootstrapped container knows, in display order.
#[derive(Serialize, Debug)]
pub struct Listing {
    pub session: String,
    pub tasks: Vec<TaskSummary>,
    pub listeners: Vec<ListenerSummary>,
    pub strategies: Vec<StrategySummary>,
    pub plugins: Vec<String>,
    pub commands: Vec<String>,
}

pub fn handle(args: Vec<String>, root: Option<&str>) -> Result<()> {
    let list_args = ListArgs::try_parse_from(&args)?;
    let bootstrapper = commons::bootstrap_userland(root)?;
    let listing = summarize(bootstrapper.container());

    if list_args.json {
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    print_listing(&listing);
    Ok(())
}

pub fn summarize(container: &Container) -> Listing {
    let registry = container.tasks();
    let tasks = registry
        .tasks()
        .map(|task| TaskSummary {
            name: task.name.clone(),
            desc: task.desc.clone(),
            kind: match &task.action {
                TaskAction::Commands(_) => "commands".to_string(),
                TaskAction::Closure(_) => "closure".to_string(),
                TaskAction::Strategy(category) => format!("strategy:{}", category),
            },
        })
        .collect();

    let listeners = registry
        .hooked_targets()
        .into_iter()
        .flat_map(|(target, phase)| registry.listeners(target, phase, false))
        .map(|listener| ListenerSummary {
            target: listener.target.clone(),
            phase: listener.phase,
            origin: listener.origin.to_string(),
            commands: listener.string_task().map(<[String]>::to_vec),
        })
        .collect();

    let strategies = container
        .strategies()
        .bindings()
        .map(|(category, bound)| StrategySummary {
            category: category.to_string(),
            bound: bound.to_string(),
            available: container
                .strategies()
                .identifiers(category)
                .into_iter()
                .map(String::from)
                .collect(),
        })
        .collect();

    Listing {
        session: container.session().to_string(),
        tasks,
        listeners,
        strategies,
        plugins: container.activated().into_iter().map(String::from).collect(),
        commands: container
            .commands()
            .map(|command| command.name().to_string())
            .collect(),
    }
}

fn print_listing(listing: &Listing) {
    println!("\n--- {} ---", "Tasks".yellow());
    for task in &listing.tasks {
        println!(
            "  {:<24} {:<22} {}",
            task.name.cyan(),
            task.kind.dimmed(),
            task.desc.as_deref().unwrap_or("")
        );
    }

    if !listing.listeners.is_empty() {
        println!("\n--- {} ---", "Listeners".yellow());
        for listener in &listing.listeners {
            let commands = listener
                .commands
                .as_ref()
                .map(|c| c.join(" && "))
                .unwrap_or_else(|| "<closure>".to_string());
            println!(
                "  {:<6} {:<18} {} {}",
                listener.phase.to_string().blue(),
                listener.target.cyan(),
                commands,
                format!("({})", listener.origin).dimmed()
            );
        }
    }

    println!("\n--- {} ---", "Strategies".yellow());
    for strategy in &listing.strategies {
        println!(
            "  {:<14} {:<22} {}",
            strategy.category.blue(),
            strategy.bound.green(),
            strategy.available.join(", ").dimmed()
        );
    }

    if !listing.plugins.is_empty() {
        println!("\n--- {} ---", "Plugins".yellow());
        for plugin in &listing.plugins {
            println!("  {}", plugin.green());
        }
    }

    if !listing.commands.is_empty() {
        println!("\n--- {} ---", "Commands".yellow());
        for command in &listing.commands {
            println!("  {}", command.cyan());
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::panic)]
mod tests {
    use super::*;
    use crate::models::{ListenerOrigin, Task};

    #[test]
    fn test_summary_covers_core_and_user_registrations() {
        let mut container = Container::new();
        {
            let mut queue = container.tasks_mut().queue(ListenerOrigin::User);
            queue.add_task(Task::from_commands("Cleanup", vec!["rm -rf tmp".to_string()]));
            queue.before("deploy", vec!["ls".to_string()]);
        }
        container.mark_activated("Foobar");

        let listing = summarize(&container);

        assert!(listing.tasks.iter().any(|t| t.name == "Cleanup" && t.kind == "commands"));
        assert!(listing.tasks.iter().any(|t| t.name == "test" && t.kind == "strategy:test"));
        assert_eq!(
            listing.listeners,
            vec![ListenerSummary {
                target: "deploy".to_string(),
                phase: Phase::Before,
                origin: "user".to_string(),
                commands: Some(vec!["ls".to_string()]),
            }]
        );
        assert_eq!(listing.strategies.len(), 4);
        assert_eq!(listing.plugins, vec!["Foobar"]);
        assert!(listing.commands.is_empty());
    }

    #[test]
    fn test_listing_serializes_to_json() {
        let listing = summarize(&Container::new());
        let json = serde_json::to_value(&listing).unwrap();
        assert_eq!(json["strategies"][0]["category"], "check");
        assert_eq!(json["strategies"][0]["bound"], "Php");
    }
}
