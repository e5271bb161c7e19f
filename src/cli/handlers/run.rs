use anyhow::{Result, anyhow};
use clap::Parser;
use colored::*;

use crate::{cli::handlers::commons, core::task_executor, system::executor::LocalRunner};

#[derive(Parser, Debug, Default)]
#[command(
    no_binary_name = true,
    about = "Runs a task with its before and after listeners."
)]
struct RunArgs {
    /// The task (or registered console command) to run.
    task: String,
}

///
/// Main entry point for the 'run' command.
/// A registered console command takes precedence over a task of the same name.
///
pub fn handle(args: Vec<String>, root: Option<&str>) -> Result<()> {
    let run_args = RunArgs::try_parse_from(&args)?;
    let bootstrapper = commons::bootstrap_userland(root)?;
    let container = bootstrapper.container();
    let mut runner = LocalRunner::new(bootstrapper.paths().root());

    if let Some(command) = container.command(&run_args.task) {
        println!("{} {}", "Running command".green(), command.name().cyan());
        return command.fire(container.tasks(), container.strategies(), &mut runner);
    }

    if container.tasks().task(&run_args.task).is_none() {
        return Err(anyhow!(
            "Task '{}' is not registered in '{}'.",
            run_args.task.cyan(),
            bootstrapper.paths().userland_path().display()
        ));
    }

    println!("{} {}", "Running task".green(), run_args.task.cyan());
    task_executor::execute_task(
        &run_args.task,
        container.tasks(),
        container.strategies(),
        &mut runner,
    )
}
