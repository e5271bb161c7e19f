//! # Script Evaluator
//!
//! User files are never executed. Each one is parsed, in full, into the typed document of
//! the context it is loaded in (`TaskDocument`, `EventDocument`, `StrategyDocument`,
//! `PluginManifest`), and only then applied through a [`TaskQueue`]. A document can only
//! express the registrations its context allows, and a file that fails to parse applies
//! nothing.

use crate::{
    core::{paths::PathResolver, tasks::TaskQueue},
    models::{HookDefinition, Phase, Task, TaskDefinition},
    system::filesystem::Filesystem,
};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while evaluating a user file. Always carries the offending path.
#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("Failed to read user file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse TOML file at '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Refusing to evaluate '{path}': not an evaluable userland file.")]
    NotEvaluable { path: PathBuf },
}

impl ScriptError {
    pub fn path(&self) -> &Path {
        match self {
            ScriptError::Read { path, .. }
            | ScriptError::Parse { path, .. }
            | ScriptError::NotEvaluable { path } => path,
        }
    }
}

/// Reads user files through the filesystem collaborator, after checking them
/// against the evaluation allow-list.
pub struct Evaluator<'a> {
    fs: &'a dyn Filesystem,
    paths: &'a PathResolver,
}

impl<'a> Evaluator<'a> {
    pub fn new(fs: &'a dyn Filesystem, paths: &'a PathResolver) -> Self {
        Self { fs, paths }
    }

    pub fn paths(&self) -> &PathResolver {
        self.paths
    }

    pub fn exists(&self, path: &Path) -> bool {
        self.fs.exists(path)
    }

    /// Checks `path` against the allow-list, both as written and after resolving
    /// symlinks, so a link cannot smuggle in a file from the reserved directory.
    pub fn is_evaluable(&self, path: &Path) -> bool {
        if !self.paths.is_evaluable(path) {
            return false;
        }

        // Unresolvable paths do not exist; reading them fails on its own.
        let (Ok(resolved), Ok(userland)) = (
            self.fs.canonicalize(path),
            self.fs.canonicalize(&self.paths.userland_path()),
        ) else {
            return true;
        };
        if PathResolver::is_evaluable_below(&userland, &resolved) {
            return true;
        }
        log::debug!(
            "Skipping '{}': resolves to '{}'.",
            path.display(),
            resolved.display()
        );
        false
    }

    /// Parses `path` into the document type `T`.
    pub fn load<T: DeserializeOwned>(&self, path: &Path) -> Result<T, ScriptError> {
        if !self.is_evaluable(path) {
            return Err(ScriptError::NotEvaluable {
                path: path.to_path_buf(),
            });
        }

        let content = self
            .fs
            .read_to_string(path)
            .map_err(|e| ScriptError::Read {
                path: path.to_path_buf(),
                source: e,
            })?;
        log::trace!("Evaluating '{}' ({} bytes).", path.display(), content.len());

        toml::from_str(&content).map_err(|e| ScriptError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// The evaluable files directly inside `dir`, in name order. Anything the
    /// allow-list rejects is dropped here, before it is ever read.
    pub fn scan(&self, dir: &Path) -> Result<Vec<PathBuf>, ScriptError> {
        let files = self.fs.list_files(dir).map_err(|e| ScriptError::Read {
            path: dir.to_path_buf(),
            source: e,
        })?;
        Ok(files
            .into_iter()
            .filter(|path| self.is_evaluable(path))
            .collect())
    }
}

/// Registers every task of a document, overwriting existing bindings.
pub fn apply_tasks(tasks: BTreeMap<String, TaskDefinition>, queue: &mut TaskQueue<'_>) -> usize {
    let count = tasks.len();
    for (name, definition) in tasks {
        let (commands, desc) = definition.into_parts();
        queue.add_task(Task::from_commands(name, commands).with_desc(desc));
    }
    count
}

/// Appends every hook of a document, `before` entries first, each list in file order.
pub fn apply_hooks(
    before: Vec<HookDefinition>,
    after: Vec<HookDefinition>,
    queue: &mut TaskQueue<'_>,
) -> usize {
    let hooks = before
        .into_iter()
        .map(|hook| (Phase::Before, hook))
        .chain(after.into_iter().map(|hook| (Phase::After, hook)));

    let mut count = 0;
    for (phase, hook) in hooks {
        let listener = Task::anonymous(hook.run.into_commands()).with_desc(hook.desc);
        queue.listen(&hook.task, phase, listener);
        count += 1;
    }
    count
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::panic)]
mod tests {
    use super::*;
    use crate::{
        core::tasks::TaskRegistry,
        models::{EventDocument, ListenerOrigin, StrategyCategory, StrategyDocument, TaskDocument},
        system::filesystem::MemoryFilesystem,
    };

    fn setup() -> (MemoryFilesystem, PathResolver) {
        (MemoryFilesystem::new(), PathResolver::new("/src"))
    }

    #[test]
    fn test_task_document_accepts_all_forms() {
        let (fs, paths) = setup();
        let path = paths.task_definition_path();
        fs.put(
            &path,
            br#"
[tasks]
DisplayFiles = ["ls", "ls"]
Cleanup = "rm -rf tmp"

[tasks.Warmup]
run = ["php artisan cache:clear"]
desc = "Warms caches"
"#,
        )
        .unwrap();

        let doc: TaskDocument = Evaluator::new(&fs, &paths).load(&path).unwrap();
        let mut registry = TaskRegistry::new();
        let applied = apply_tasks(doc.tasks, &mut registry.queue(ListenerOrigin::User));

        assert_eq!(applied, 3);
        let display = registry.task("DisplayFiles").unwrap();
        assert_eq!(display.string_task().unwrap(), ["ls", "ls"]);
        assert_eq!(
            registry.task("Cleanup").unwrap().string_task().unwrap(),
            ["rm -rf tmp"]
        );
        let warmup = registry.task("Warmup").unwrap();
        assert_eq!(warmup.desc.as_deref(), Some("Warms caches"));
    }

    #[test]
    fn test_empty_file_is_an_empty_document() {
        let (fs, paths) = setup();
        let path = paths.task_definition_path();
        fs.put(&path, b"").unwrap();

        let doc: TaskDocument = Evaluator::new(&fs, &paths).load(&path).unwrap();
        assert!(doc.tasks.is_empty());
    }

    #[test]
    fn test_context_rejects_foreign_primitives() {
        let (fs, paths) = setup();
        let path = paths.task_definition_path();
        // Hooks belong to event files, not to the task-definition file.
        fs.put(&path, b"[[before]]\ntask = \"deploy\"\nrun = \"ls\"\n")
            .unwrap();

        let err = Evaluator::new(&fs, &paths)
            .load::<TaskDocument>(&path)
            .unwrap_err();
        assert!(matches!(err, ScriptError::Parse { .. }));
        assert_eq!(err.path(), path.as_path());
    }

    #[test]
    fn test_hooks_keep_file_order_per_phase() {
        let (fs, paths) = setup();
        let path = paths.event_directory().join("deploy.toml");
        fs.put(
            &path,
            br#"
[[after]]
task = "deploy"
run = "echo after"

[[before]]
task = "deploy"
run = "echo one"

[[before]]
task = "deploy"
run = ["echo two", "echo three"]
"#,
        )
        .unwrap();

        let doc: EventDocument = Evaluator::new(&fs, &paths).load(&path).unwrap();
        let mut registry = TaskRegistry::new();
        let applied = apply_hooks(
            doc.before,
            doc.after,
            &mut registry.queue(ListenerOrigin::User),
        );

        assert_eq!(applied, 3);
        let before = registry.listeners("deploy", Phase::Before, false);
        assert_eq!(before[0].string_task().unwrap(), ["echo one"]);
        assert_eq!(before[1].string_task().unwrap(), ["echo two", "echo three"]);
        assert_eq!(registry.listeners("deploy", Phase::After, false).len(), 1);
    }

    #[test]
    fn test_strategy_document_requires_known_category() {
        let (fs, paths) = setup();
        let good = paths.strategy_directory().join("Smoke.toml");
        let bad = paths.strategy_directory().join("Bad.toml");
        fs.put(&good, b"category = \"test\"\nrun = \"ls\"\n").unwrap();
        fs.put(&bad, b"category = \"teleport\"\nrun = \"ls\"\n").unwrap();

        let evaluator = Evaluator::new(&fs, &paths);
        let doc: StrategyDocument = evaluator.load(&good).unwrap();
        assert_eq!(doc.category, StrategyCategory::Test);
        assert!(doc.id.is_none());
        assert!(evaluator.load::<StrategyDocument>(&bad).is_err());
    }

    #[test]
    fn test_reserved_files_are_never_read() {
        let (fs, paths) = setup();
        let path = paths.reserved_directory().join("tasks.toml");
        fs.put(&path, b"[tasks]\nIgnite = \"echo foobar\"\n").unwrap();

        let err = Evaluator::new(&fs, &paths)
            .load::<TaskDocument>(&path)
            .unwrap_err();
        assert!(matches!(err, ScriptError::NotEvaluable { .. }));
    }

    #[test]
    fn test_scan_drops_non_evaluable_files() {
        let (fs, paths) = setup();
        let dir = paths.event_directory();
        fs.put(&dir.join("b.toml"), b"").unwrap();
        fs.put(&dir.join("a.toml"), b"").unwrap();
        fs.put(&dir.join("notes.md"), b"").unwrap();

        let files = Evaluator::new(&fs, &paths).scan(&dir).unwrap();
        assert_eq!(files, vec![dir.join("a.toml"), dir.join("b.toml")]);
    }
}
