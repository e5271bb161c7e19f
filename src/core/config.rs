// src/core/config.rs

use crate::system::filesystem::Filesystem;
use std::path::{Path, PathBuf};
use thiserror::Error;
use toml::{Table, Value};

/// Errors raised while loading `.rocketeer/config.toml`.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse TOML file at '{path}': {source}")]
    TomlParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Read-mostly key/value configuration with dotted-key access (`hooks.tasks`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Configuration {
    values: Table,
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the configuration file. A missing file yields an empty configuration.
    pub fn load(fs: &dyn Filesystem, path: &Path) -> Result<Self, ConfigError> {
        if !fs.exists(path) {
            log::debug!("No configuration file at '{}'.", path.display());
            return Ok(Self::default());
        }

        let content = fs.read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let values: Table = toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
            path: path.to_path_buf(),
            source: e,
        })?;
        log::debug!(
            "Loaded {} configuration keys from '{}'.",
            values.len(),
            path.display()
        );
        Ok(Self { values })
    }

    /// Looks up a dotted key, descending through nested tables.
    pub fn get(&self, key: &str) -> Option<&Value> {
        let mut segments = key.split('.');
        let mut value = self.values.get(segments.next()?)?;
        for segment in segments {
            value = value.as_table()?.get(segment)?;
        }
        Some(value)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Reads a key holding either a single string or an array of strings.
    /// Non-string array members are ignored with a warning.
    pub fn get_list(&self, key: &str) -> Vec<String> {
        match self.get(key) {
            Some(Value::String(s)) => vec![s.clone()],
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| match item.as_str() {
                    Some(s) => Some(s.to_string()),
                    None => {
                        log::warn!("Ignoring non-string entry under '{}': {}", key, item);
                        None
                    }
                })
                .collect(),
            Some(other) => {
                log::warn!("Expected a string or a list under '{}', found {}", key, other);
                Vec::new()
            }
            None => Vec::new(),
        }
    }

    /// Sets a dotted key, creating (or replacing non-table) intermediate tables.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        let mut segments: Vec<&str> = key.split('.').collect();
        let last = segments.pop().unwrap_or(key);

        let mut table = &mut self.values;
        for segment in segments {
            let entry = table
                .entry(segment)
                .or_insert(Value::Table(Table::new()));
            if !entry.is_table() {
                *entry = Value::Table(Table::new());
            }
            table = match entry {
                Value::Table(next) => next,
                _ => unreachable!(),
            };
        }
        table.insert(last.to_string(), value.into());
    }

    pub fn application_name(&self) -> Option<&str> {
        self.get_str("application_name")
    }
}
