// src/system/executor.rs

use crate::core::task_executor::ReleaseRunner;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Command as StdCommand, ExitStatus, Stdio};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Command could not be parsed: {0}")]
    CommandParse(String),
    #[error("Command '{0}' could not be executed: {1}")]
    CommandFailed(String, #[source] std::io::Error),
    #[error("Command '{command}' exited with status {status}.")]
    NonZeroExitStatus { command: String, status: ExitStatus },
}

/// Runs one command line in `cwd` and waits for it to finish.
///
/// A leading `-` marks the command as allowed to fail. Blank lines are a no-op.
pub fn execute_command(
    command_line: &str,
    cwd: &Path,
    env_vars: &HashMap<String, String>,
) -> Result<(), ExecutionError> {
    let trimmed = command_line.trim();
    let (line, ignore_errors) = match trimmed.strip_prefix('-') {
        Some(rest) => (rest.trim(), true),
        None => (trimmed, false),
    };
    if line.is_empty() {
        return Ok(());
    }

    let parts = shlex::split(line).ok_or_else(|| ExecutionError::CommandParse(line.to_string()))?;
    let Some((program, args)) = parts.split_first() else {
        return Ok(());
    };
    let clean_cwd = dunce::simplified(cwd);

    log::debug!("Running '{}' in '{}'.", line, clean_cwd.display());
    let status = match StdCommand::new(program)
        .args(args)
        .current_dir(clean_cwd)
        .envs(env_vars)
        .stdin(Stdio::null())
        .status()
    {
        Ok(status) => status,
        // Shell built-ins such as `echo` only exist inside cmd.exe.
        Err(e) if e.kind() == ErrorKind::NotFound && cfg!(target_os = "windows") => {
            log::debug!("'{}' not found, retrying with cmd /C.", program);
            StdCommand::new("cmd")
                .arg("/C")
                .arg(line)
                .current_dir(clean_cwd)
                .envs(env_vars)
                .stdin(Stdio::null())
                .status()
                .map_err(|e| ExecutionError::CommandFailed(line.to_string(), e))?
        }
        Err(e) => return Err(ExecutionError::CommandFailed(line.to_string(), e)),
    };

    if !status.success() {
        if ignore_errors {
            log::warn!("'{}' failed with {}, ignoring.", line, status);
            return Ok(());
        }
        return Err(ExecutionError::NonZeroExitStatus {
            command: line.to_string(),
            status,
        });
    }
    Ok(())
}

/// Runs release commands as local processes inside a fixed working directory.
#[derive(Debug, Clone)]
pub struct LocalRunner {
    cwd: PathBuf,
    env: HashMap<String, String>,
}

impl LocalRunner {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            env: HashMap::new(),
        }
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}

impl ReleaseRunner for LocalRunner {
    fn run_for_current_release(&mut self, commands: &[String]) -> anyhow::Result<()> {
        for command in commands {
            execute_command(command, &self.cwd, &self.env)?;
        }
        Ok(())
    }
}

#[cfg(all(test, unix))]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::panic)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_blank_and_dash_only_lines_are_noops() {
        let dir = tempdir().unwrap();
        let env = HashMap::new();
        execute_command("   ", dir.path(), &env).unwrap();
        execute_command("-", dir.path(), &env).unwrap();
    }

    #[test]
    fn test_non_zero_exit_is_an_error_unless_ignored() {
        let dir = tempdir().unwrap();
        let env = HashMap::new();
        let err = execute_command("false", dir.path(), &env).unwrap_err();
        assert!(matches!(err, ExecutionError::NonZeroExitStatus { .. }));
        execute_command("- false", dir.path(), &env).unwrap();
    }

    #[test]
    fn test_unbalanced_quotes_fail_to_parse() {
        let dir = tempdir().unwrap();
        let err = execute_command("echo \"open", dir.path(), &HashMap::new()).unwrap_err();
        assert!(matches!(err, ExecutionError::CommandParse(_)));
    }

    #[test]
    fn test_local_runner_runs_in_its_directory() {
        let dir = tempdir().unwrap();
        let mut runner = LocalRunner::new(dir.path()).with_env("MARKER", "release");
        runner
            .run_for_current_release(&[
                "touch first".to_string(),
                "sh -c \"echo $MARKER > second\"".to_string(),
            ])
            .unwrap();

        assert!(dir.path().join("first").exists());
        let content = std::fs::read_to_string(dir.path().join("second")).unwrap();
        assert_eq!(content.trim(), "release");
    }

    #[test]
    fn test_local_runner_stops_at_first_failure() {
        let dir = tempdir().unwrap();
        let mut runner = LocalRunner::new(dir.path());
        let result = runner.run_for_current_release(&[
            "false".to_string(),
            "touch never".to_string(),
        ]);

        assert!(result.is_err());
        assert!(!dir.path().join("never").exists());
    }
}
