//! The `cluecraft validate` command.

use std::path::PathBuf;

use anyhow::Result;

use cluecraft_core::parser;

pub fn execute(catalog_path: PathBuf) -> Result<()> {
    let files = if catalog_path.is_dir() {
        parser::load_catalog_directory(&catalog_path)?
    } else {
        vec![parser::parse_catalog_file(&catalog_path)?]
    };

    let mut total_warnings = 0;

    for file in &files {
        println!("Catalog: {} ({} clues)", file.name, file.records.len());

        let warnings = parser::validate_catalog(&file.records);
        for w in &warnings {
            let prefix = w
                .clue_id
                .as_ref()
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if files.is_empty() {
        println!("No catalog files found.");
    } else if total_warnings == 0 {
        println!("All catalogs valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
