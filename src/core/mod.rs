// src/core/mod.rs

pub mod bootstrapper;
pub mod config;
pub mod container;
pub mod loaders;
pub mod namespace;
pub mod paths;
pub mod plugins;
pub mod script;
pub mod strategies;
pub mod task_executor;
pub mod tasks;
