// src/cli/handlers/mod.rs

pub mod commons;
pub mod list;
pub mod namespace;
pub mod run;
