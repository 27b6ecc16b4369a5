//! The `cluecraft categories` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use cluecraft_core::parser::load_catalog;
use cluecraft_core::traits::ClueCatalog;
use cluecraft_store::load_config_from;

pub fn execute(catalog: Option<PathBuf>, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let path = super::catalog_path(catalog, &config)?;
    let (catalog, _) = load_catalog(&path)?;

    let categories = catalog.categories();
    if categories.is_empty() {
        println!("No clues in {}.", path.display());
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Category", "Clues"]);
    for (name, count) in &categories {
        table.add_row(vec![Cell::new(name), Cell::new(count)]);
    }
    println!("{table}");
    println!("{} categories, {} clues", categories.len(), catalog.len());

    Ok(())
}
