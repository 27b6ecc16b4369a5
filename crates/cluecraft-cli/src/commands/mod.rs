//! Subcommand implementations and the setup they share.

pub mod categories;
pub mod history;
pub mod init;
pub mod insights;
pub mod play;
pub mod validate;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use cluecraft_core::orchestrator::Orchestrator;
use cluecraft_core::traits::{ClueCatalog, ProgressStore};
use cluecraft_store::{open_store, TrainerConfig};

/// The catalog named on the command line, else the configured one.
pub(crate) fn catalog_path(arg: Option<PathBuf>, config: &TrainerConfig) -> Result<PathBuf> {
    arg.or_else(|| config.catalog.clone())
        .context("no catalog configured; pass --catalog or set `catalog` in cluecraft.toml")
}

pub(crate) fn user_id(arg: Option<String>, config: &TrainerConfig) -> String {
    arg.unwrap_or_else(|| config.default_user.clone())
}

pub(crate) fn orchestrator(
    config: &TrainerConfig,
    catalog: Arc<dyn ClueCatalog>,
) -> Result<Orchestrator> {
    let store = open_store(&config.store)?;
    tracing::debug!(store = store.name(), "progress store opened");
    Ok(Orchestrator::new(catalog, store, config.engine.clone()))
}

pub(crate) fn percent(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}
