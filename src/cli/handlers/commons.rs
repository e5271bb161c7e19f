// src/cli/handlers/commons.rs

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::{
    core::{bootstrapper::UserBootstrapper, paths::PathResolver},
    system::filesystem::LocalFilesystem,
};

/// Opens the userland below `root` (or the current directory) without loading anything.
pub fn open_userland(root: Option<&str>) -> Result<UserBootstrapper> {
    let paths = PathResolver::from_root_arg(root)?;
    log::debug!("Project root: {}", paths.root().display());
    let bootstrapper = UserBootstrapper::open(Arc::new(LocalFilesystem), paths)
        .context("Failed to read the userland configuration")?;
    Ok(bootstrapper)
}

/// Opens the userland and runs every bootstrap phase.
pub fn bootstrap_userland(root: Option<&str>) -> Result<UserBootstrapper> {
    let mut bootstrapper = open_userland(root)?;
    bootstrapper
        .bootstrap()
        .with_context(|| {
            format!(
                "Failed to bootstrap '{}'",
                bootstrapper.paths().userland_path().display()
            )
        })?;
    Ok(bootstrapper)
}
