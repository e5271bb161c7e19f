//! # Strategies
//!
//! A strategy is a pluggable implementation of one deployment sub-concern (running the
//! test suite, installing dependencies, migrating the database ...). Implementations are
//! never discovered by introspection: each one is registered as a factory keyed by
//! `(category, identifier)`, and each category is bound to the identifier that
//! `build(category, None)` constructs.

use crate::core::task_executor::ReleaseRunner;
use crate::models::StrategyCategory;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// The capability set every strategy implementation provides.
pub trait Strategy: fmt::Debug + Send + Sync {
    fn category(&self) -> StrategyCategory;

    /// The fully-qualified identifier the strategy was registered under.
    fn identifier(&self) -> &str;

    fn description(&self) -> Option<&str> {
        None
    }

    /// Runs the strategy against the current release.
    fn fire(&self, runner: &mut dyn ReleaseRunner) -> anyhow::Result<()>;
}

pub type StrategyFactory = Arc<dyn Fn() -> Box<dyn Strategy> + Send + Sync>;

/// Lookup failures when building a strategy. Load-time failures live in `ScriptError`.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum StrategyError {
    #[error("Unknown strategy category '{0}'.")]
    UnknownCategory(String),
    #[error("No '{category}' strategy is registered under '{identifier}'.")]
    UnknownStrategy {
        category: StrategyCategory,
        identifier: String,
    },
    #[error("No strategy is bound to the '{0}' category.")]
    Unbound(StrategyCategory),
}

/// A strategy that runs a fixed command sequence. Backs both the built-ins and
/// the overrides declared in `.rocketeer/config/strategies/`.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandStrategy {
    pub category: StrategyCategory,
    pub identifier: String,
    pub desc: Option<String>,
    pub commands: Vec<String>,
}

impl Strategy for CommandStrategy {
    fn category(&self) -> StrategyCategory {
        self.category
    }

    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn description(&self) -> Option<&str> {
        self.desc.as_deref()
    }

    fn fire(&self, runner: &mut dyn ReleaseRunner) -> anyhow::Result<()> {
        log::debug!("Firing {} strategy '{}'.", self.category, self.identifier);
        runner.run_for_current_release(&self.commands)
    }
}

// (category, identifier, description, commands, bound by default)
const BUILTIN_STRATEGIES: &[(StrategyCategory, &str, &str, &[&str], bool)] = &[
    (
        StrategyCategory::Check,
        "Php",
        "Checks that the server can run the application",
        &["php --version"],
        true,
    ),
    (
        StrategyCategory::Dependencies,
        "Composer",
        "Installs dependencies with Composer",
        &["composer install --no-interaction --no-dev --prefer-dist"],
        true,
    ),
    (
        StrategyCategory::Dependencies,
        "Npm",
        "Installs dependencies with npm",
        &["npm install --no-audit"],
        false,
    ),
    (
        StrategyCategory::Test,
        "Phpunit",
        "Runs the tests with PHPUnit",
        &["vendor/bin/phpunit --stop-on-failure"],
        true,
    ),
    (
        StrategyCategory::Migrate,
        "Artisan",
        "Migrates the database with Artisan",
        &["php artisan migrate --force"],
        true,
    ),
];

#[derive(Default)]
pub struct StrategyRegistry {
    factories: HashMap<(StrategyCategory, String), StrategyFactory>,
    bindings: BTreeMap<StrategyCategory, String>,
}

impl fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrategyRegistry")
            .field("factories", &self.factories.keys().collect::<Vec<_>>())
            .field("bindings", &self.bindings)
            .finish()
    }
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in strategies, with the defaults bound.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for &(category, identifier, desc, commands, default) in BUILTIN_STRATEGIES {
            let strategy = CommandStrategy {
                category,
                identifier: identifier.to_string(),
                desc: Some(desc.to_string()),
                commands: commands.iter().map(|c| c.to_string()).collect(),
            };
            registry.register_factory(category, identifier, command_factory(strategy));
            if default {
                registry.bindings.insert(category, identifier.to_string());
            }
        }
        registry
    }

    /// Registers a factory without touching the category binding.
    pub fn register_factory(
        &mut self,
        category: StrategyCategory,
        identifier: &str,
        factory: StrategyFactory,
    ) {
        log::trace!("Strategy factory '{}' registered for '{}'.", identifier, category);
        self.factories
            .insert((category, identifier.to_string()), factory);
    }

    /// Registers a factory and binds the category to it, overriding any earlier binding.
    pub fn register_override(
        &mut self,
        category: StrategyCategory,
        identifier: &str,
        factory: StrategyFactory,
    ) {
        self.register_factory(category, identifier, factory);
        if let Some(previous) = self.bindings.insert(category, identifier.to_string()) {
            log::debug!(
                "Strategy '{}' now overrides '{}' for '{}'.",
                identifier,
                previous,
                category
            );
        }
    }

    /// Binds a category to an identifier that already has a factory.
    pub fn bind(&mut self, category: StrategyCategory, identifier: &str) -> Result<(), StrategyError> {
        if !self
            .factories
            .contains_key(&(category, identifier.to_string()))
        {
            return Err(StrategyError::UnknownStrategy {
                category,
                identifier: identifier.to_string(),
            });
        }
        self.bindings.insert(category, identifier.to_string());
        Ok(())
    }

    pub fn binding(&self, category: StrategyCategory) -> Option<&str> {
        self.bindings.get(&category).map(String::as_str)
    }

    /// Every `(category, identifier)` binding, ordered by category.
    pub fn bindings(&self) -> impl Iterator<Item = (StrategyCategory, &str)> {
        self.bindings
            .iter()
            .map(|(category, identifier)| (*category, identifier.as_str()))
    }

    /// The identifiers registered for a category, sorted.
    pub fn identifiers(&self, category: StrategyCategory) -> Vec<&str> {
        let mut identifiers: Vec<&str> = self
            .factories
            .keys()
            .filter(|(c, _)| *c == category)
            .map(|(_, identifier)| identifier.as_str())
            .collect();
        identifiers.sort_unstable();
        identifiers
    }

    /// Builds a strategy from a category name, as found in user input.
    pub fn build_strategy(
        &self,
        category: &str,
        identifier: Option<&str>,
    ) -> Result<Box<dyn Strategy>, StrategyError> {
        let category: StrategyCategory = category
            .parse()
            .map_err(StrategyError::UnknownCategory)?;
        self.build(category, identifier)
    }

    /// Builds `identifier`, or whatever the category is currently bound to.
    pub fn build(
        &self,
        category: StrategyCategory,
        identifier: Option<&str>,
    ) -> Result<Box<dyn Strategy>, StrategyError> {
        let identifier = match identifier {
            Some(identifier) => identifier,
            None => self
                .binding(category)
                .ok_or(StrategyError::Unbound(category))?,
        };
        let factory = self
            .factories
            .get(&(category, identifier.to_string()))
            .ok_or_else(|| StrategyError::UnknownStrategy {
                category,
                identifier: identifier.to_string(),
            })?;
        Ok(factory())
    }
}

/// Wraps a command strategy into a factory that hands out fresh copies.
pub fn command_factory(strategy: CommandStrategy) -> StrategyFactory {
    Arc::new(move || Box::new(strategy.clone()) as Box<dyn Strategy>)
}
