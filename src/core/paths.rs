// src/core/paths.rs

use crate::constants::{
    CONFIG_FILENAME, EVENTS_DIR, PLUGINS_DIR, RESERVED_APP_DIR, STRATEGIES_DIR, TASKS_FILENAME,
    USER_FILE_EXTENSION, USERLAND_DIR,
};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PathError {
    #[error("Could not determine the current directory: {0}")]
    CurrentDir(#[source] std::io::Error),
    #[error("Failed to expand project root '{template}': {message}")]
    Expansion { template: String, message: String },
    #[error("Project root '{path}' could not be resolved: {source}")]
    RootNotFound {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Computes the canonical locations of the userland configuration of a project.
///
/// Every accessor is a pure computation from the project root. Nothing here checks
/// whether the returned path exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathResolver {
    root: PathBuf,
}

impl PathResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Builds a resolver from an optional user-supplied root, expanding `~` and
    /// environment variables. Falls back to the current directory.
    pub fn from_root_arg(root: Option<&str>) -> Result<Self, PathError> {
        let raw = match root {
            Some(template) => {
                let expanded =
                    shellexpand::full(template).map_err(|e| PathError::Expansion {
                        template: template.to_string(),
                        message: e.to_string(),
                    })?;
                PathBuf::from(expanded.into_owned())
            }
            None => std::env::current_dir().map_err(PathError::CurrentDir)?,
        };

        let canonical = dunce::canonicalize(&raw).map_err(|e| PathError::RootNotFound {
            path: raw.display().to_string(),
            source: e,
        })?;
        Ok(Self::new(canonical))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/.rocketeer`
    pub fn userland_path(&self) -> PathBuf {
        self.root.join(USERLAND_DIR)
    }

    /// `<root>/.rocketeer/tasks.toml`
    pub fn task_definition_path(&self) -> PathBuf {
        self.userland_path().join(TASKS_FILENAME)
    }

    /// `<root>/.rocketeer/events`
    pub fn event_directory(&self) -> PathBuf {
        self.userland_path().join(EVENTS_DIR)
    }

    /// `<root>/.rocketeer/config/strategies`
    pub fn strategy_directory(&self) -> PathBuf {
        self.userland_path().join("config").join(STRATEGIES_DIR)
    }

    /// `<root>/.rocketeer/plugins`
    pub fn plugin_directory(&self) -> PathBuf {
        self.userland_path().join(PLUGINS_DIR)
    }

    /// `<root>/.rocketeer/config.toml`
    pub fn config_path(&self) -> PathBuf {
        self.userland_path().join(CONFIG_FILENAME)
    }

    /// `<root>/.rocketeer/app`, owned by the application and never scanned.
    pub fn reserved_directory(&self) -> PathBuf {
        self.userland_path().join(RESERVED_APP_DIR)
    }

    /// Decides, before anything is read, whether a file may be handed to the evaluator.
    ///
    /// A file is evaluable when it lives inside the userland root, does not sit below the
    /// reserved application directory and carries the user file extension.
    pub fn is_evaluable(&self, path: &Path) -> bool {
        Self::is_evaluable_below(&self.userland_path(), path)
    }

    /// [`PathResolver::is_evaluable`] against an explicit userland root, for paths
    /// that have already been resolved through symlinks.
    pub fn is_evaluable_below(userland: &Path, path: &Path) -> bool {
        let Ok(relative) = path.strip_prefix(userland) else {
            log::debug!("Skipping '{}': outside of the userland root.", path.display());
            return false;
        };

        let mut components = relative.components();
        match components.next() {
            Some(Component::Normal(first)) if first == RESERVED_APP_DIR => {
                log::debug!(
                    "Skipping '{}': reserved application namespace.",
                    path.display()
                );
                return false;
            }
            Some(Component::Normal(_)) => {}
            _ => return false,
        }
        if components.any(|c| !matches!(c, Component::Normal(_))) {
            log::debug!("Skipping '{}': non-canonical path.", path.display());
            return false;
        }

        let has_extension = path
            .extension()
            .is_some_and(|ext| ext == USER_FILE_EXTENSION);
        if !has_extension {
            log::debug!(
                "Skipping '{}': not a .{} file.",
                path.display(),
                USER_FILE_EXTENSION
            );
        }
        has_extension
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_are_computed_from_root() {
        let paths = PathResolver::new("/src");
        assert_eq!(paths.userland_path(), PathBuf::from("/src/.rocketeer"));
        assert_eq!(
            paths.task_definition_path(),
            PathBuf::from("/src/.rocketeer/tasks.toml")
        );
        assert_eq!(
            paths.event_directory(),
            PathBuf::from("/src/.rocketeer/events")
        );
        assert_eq!(
            paths.strategy_directory(),
            PathBuf::from("/src/.rocketeer/config/strategies")
        );
        assert_eq!(
            paths.plugin_directory(),
            PathBuf::from("/src/.rocketeer/plugins")
        );
    }

    #[test]
    fn test_reserved_namespace_is_not_evaluable() {
        let paths = PathResolver::new("/src");
        assert!(!paths.is_evaluable(Path::new("/src/.rocketeer/app/Tasks/Ignite.toml")));
        assert!(!paths.is_evaluable(Path::new("/src/.rocketeer/app/tasks.toml")));
    }

    #[test]
    fn test_only_toml_files_inside_userland_are_evaluable() {
        let paths = PathResolver::new("/src");
        assert!(paths.is_evaluable(Path::new("/src/.rocketeer/events/deploy.toml")));
        assert!(!paths.is_evaluable(Path::new("/src/.rocketeer/events/deploy.php")));
        assert!(!paths.is_evaluable(Path::new("/elsewhere/tasks.toml")));
        assert!(!paths.is_evaluable(Path::new("/src/.rocketeer/events/../../x.toml")));
    }

    #[test]
    fn test_root_argument_must_exist() {
        let result = PathResolver::from_root_arg(Some("/definitely/not/a/real/root"));
        assert!(matches!(result, Err(PathError::RootNotFound { .. })));
    }
}
