use crate::{
    core::{strategies::StrategyRegistry, tasks::TaskRegistry},
    models::{Phase, Task, TaskAction},
};
use anyhow::{Context, Result, anyhow};

/// The seam through which tasks, listeners and strategies run their commands.
///
/// The remote implementation (SSH into the current release) lives outside this crate.
/// `system::executor::LocalRunner` runs commands on the local machine.
pub trait ReleaseRunner {
    fn run_for_current_release(&mut self, commands: &[String]) -> Result<()>;
}

// --- Main Public Function ---

/// Fires a registered task by name: its `before` listeners, the task itself,
/// then its `after` listeners, in registration order.
pub fn execute_task(
    name: &str,
    tasks: &TaskRegistry,
    strategies: &StrategyRegistry,
    runner: &mut dyn ReleaseRunner,
) -> Result<()> {
    let task = tasks
        .task(name)
        .ok_or_else(|| anyhow!("Task '{}' is not registered.", name))?;

    run_listeners(name, Phase::Before, tasks, strategies, runner)?;
    fire_task(task, strategies, runner).with_context(|| format!("Task '{}' failed", name))?;
    run_listeners(name, Phase::After, tasks, strategies, runner)?;
    Ok(())
}

/// Runs a single task's own action, without its listeners.
pub fn fire_task(
    task: &Task,
    strategies: &StrategyRegistry,
    runner: &mut dyn ReleaseRunner,
) -> Result<()> {
    log::debug!("Firing task '{}'.", task.name);
    match &task.action {
        TaskAction::Commands(commands) => runner.run_for_current_release(commands),
        TaskAction::Closure(closure) => closure(runner),
        TaskAction::Strategy(category) => {
            let strategy = strategies.build(*category, None)?;
            strategy.fire(runner)
        }
    }
}

fn run_listeners(
    name: &str,
    phase: Phase,
    tasks: &TaskRegistry,
    strategies: &StrategyRegistry,
    runner: &mut dyn ReleaseRunner,
) -> Result<()> {
    for listener in tasks.listeners(name, phase, false) {
        fire_task(&listener.task, strategies, runner).with_context(|| {
            format!(
                "Listener '{}' {} '{}' failed ({})",
                listener.task.name, phase, name, listener.origin
            )
        })?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::panic)]
mod tests {
    use super::*;
    use crate::models::ListenerOrigin;
    use std::sync::Arc;

    #[derive(Default)]
    struct RecordingRunner {
        ran: Vec<String>,
    }

    impl ReleaseRunner for RecordingRunner {
        fn run_for_current_release(&mut self, commands: &[String]) -> Result<()> {
            self.ran.extend(commands.iter().cloned());
            Ok(())
        }
    }

    #[test]
    fn test_listeners_wrap_the_task_in_order() {
        let mut tasks = TaskRegistry::new();
        let mut queue = tasks.queue(ListenerOrigin::User);
        queue.task("Build", vec!["make".into()]);
        queue.before("Build", vec!["echo start".into()]);
        queue.after("Build", vec!["echo end".into()]);
        queue.before("Build", vec!["whoami".into()]);

        let mut runner = RecordingRunner::default();
        execute_task("Build", &tasks, &StrategyRegistry::new(), &mut runner).unwrap();
        assert_eq!(runner.ran, vec!["echo start", "whoami", "make", "echo end"]);
    }

    #[test]
    fn test_core_task_fires_bound_strategy() {
        let tasks = TaskRegistry::with_core_tasks();
        let mut runner = RecordingRunner::default();
        execute_task(
            "test",
            &tasks,
            &StrategyRegistry::with_builtins(),
            &mut runner,
        )
        .unwrap();
        assert_eq!(runner.ran, vec!["vendor/bin/phpunit --stop-on-failure"]);
    }

    #[test]
    fn test_closure_tasks_receive_the_runner() {
        let mut tasks = TaskRegistry::new();
        tasks.queue(ListenerOrigin::User).closure(
            "Notify",
            Arc::new(|runner: &mut dyn ReleaseRunner| {
                runner.run_for_current_release(&["curl -X POST hooks".to_string()])
            }),
        );

        let mut runner = RecordingRunner::default();
        execute_task("Notify", &tasks, &StrategyRegistry::new(), &mut runner).unwrap();
        assert_eq!(runner.ran, vec!["curl -X POST hooks"]);
    }

    #[test]
    fn test_unknown_task_is_an_error() {
        let tasks = TaskRegistry::new();
        let mut runner = RecordingRunner::default();
        let err = execute_task("Missing", &tasks, &StrategyRegistry::new(), &mut runner)
            .unwrap_err();
        assert!(err.to_string().contains("Missing"));
    }
}
