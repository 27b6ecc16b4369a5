//! Catalog file parser.
//!
//! Loads clue records from TOML or JSON files and directories, cleans their
//! text, and validates whole catalogs.

use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::catalog::{validate_record, CatalogWarning, ClueRecord, InMemoryCatalog};
use crate::model::Tier;

/// Intermediate TOML structure for catalog files.
#[derive(Debug, Deserialize)]
struct TomlCatalogFile {
    #[serde(default)]
    catalog: Option<TomlCatalogHeader>,
    #[serde(default)]
    clues: Vec<ClueRecord>,
}

#[derive(Debug, Deserialize)]
struct TomlCatalogHeader {
    #[serde(default)]
    name: Option<String>,
}

/// A loaded catalog file.
#[derive(Debug, Clone)]
pub struct CatalogFile {
    /// Display name from the file header, or the file stem.
    pub name: String,
    pub records: Vec<ClueRecord>,
}

/// Parse a single `.toml` or `.json` catalog file.
pub fn parse_catalog_file(path: &Path) -> Result<CatalogFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read catalog file: {}", path.display()))?;

    let is_json = path.extension().is_some_and(|ext| ext == "json");
    let mut file = if is_json {
        parse_catalog_json(&content, path)?
    } else {
        parse_catalog_toml(&content, path)?
    };
    file.records.iter_mut().for_each(clean_record);
    Ok(file)
}

/// Parse TOML catalog text (useful for testing).
pub fn parse_catalog_toml(content: &str, source_path: &Path) -> Result<CatalogFile> {
    let parsed: TomlCatalogFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    Ok(CatalogFile {
        name: parsed
            .catalog
            .and_then(|h| h.name)
            .unwrap_or_else(|| file_stem(source_path)),
        records: parsed.clues,
    })
}

/// Parse JSON catalog text: either a bare array of records or an object
/// with a `clues` array.
pub fn parse_catalog_json(content: &str, source_path: &Path) -> Result<CatalogFile> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum JsonCatalog {
        Bare(Vec<ClueRecord>),
        Wrapped {
            #[serde(default)]
            name: Option<String>,
            clues: Vec<ClueRecord>,
        },
    }

    let parsed: JsonCatalog = serde_json::from_str(content)
        .with_context(|| format!("failed to parse JSON: {}", source_path.display()))?;

    Ok(match parsed {
        JsonCatalog::Bare(records) => CatalogFile {
            name: file_stem(source_path),
            records,
        },
        JsonCatalog::Wrapped { name, clues } => CatalogFile {
            name: name.unwrap_or_else(|| file_stem(source_path)),
            records: clues,
        },
    })
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "catalog".to_string())
}

/// Recursively load all `.toml` and `.json` catalog files from a directory.
///
/// Files that fail to parse are skipped with a warning.
pub fn load_catalog_directory(dir: &Path) -> Result<Vec<CatalogFile>> {
    let mut files = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();

        if path.is_dir() {
            files.extend(load_catalog_directory(&path)?);
        } else if path
            .extension()
            .is_some_and(|ext| ext == "toml" || ext == "json")
        {
            match parse_catalog_file(&path) {
                Ok(file) => files.push(file),
                Err(e) => {
                    tracing::warn!("skipping {}: {e:#}", path.display());
                }
            }
        }
    }

    Ok(files)
}

/// Load a catalog from a file or a directory of files.
pub fn load_catalog(path: &Path) -> Result<(InMemoryCatalog, Vec<CatalogFile>)> {
    let files = if path.is_dir() {
        load_catalog_directory(path)?
    } else {
        vec![parse_catalog_file(path)?]
    };
    let catalog = InMemoryCatalog::new(files.iter().flat_map(|f| f.records.iter().cloned()));
    tracing::debug!(
        path = %path.display(),
        files = files.len(),
        records = catalog.len(),
        "catalog loaded"
    );
    Ok((catalog, files))
}

/// Strip markup and normalize whitespace in every text field of a record.
fn clean_record(record: &mut ClueRecord) {
    for field in [&mut record.prompt, &mut record.answer, &mut record.category] {
        if let Some(text) = field.as_mut() {
            *text = clean_text(text);
        }
    }
    for alternative in &mut record.alternatives {
        *alternative = clean_text(alternative);
    }
}

/// Remove HTML tags, decode common entities, and collapse whitespace.
pub fn clean_text(text: &str) -> String {
    let mut stripped = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('<') {
        let after = &rest[start + 1..];
        let looks_like_tag = after
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '/' || c == '!');
        match after.find('>') {
            Some(len) if looks_like_tag => {
                stripped.push_str(&rest[..start]);
                rest = &after[len + 1..];
            }
            _ => {
                // a literal '<', as in "5 < 6"
                stripped.push_str(&rest[..=start]);
                rest = after;
            }
        }
    }
    stripped.push_str(rest);

    let decoded = stripped
        .replace('\\', "")
        .replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&");

    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Validate a set of catalog records for common issues.
pub fn validate_catalog(records: &[ClueRecord]) -> Vec<CatalogWarning> {
    let mut warnings = Vec::new();

    // Check for duplicate IDs
    let mut seen_ids = HashSet::new();
    for id in records.iter().filter_map(|r| r.id.as_deref()) {
        if !seen_ids.insert(id.trim()) {
            warnings.push(CatalogWarning::new(Some(id), format!("duplicate clue ID: {id}")));
        }
    }

    // Malformed records
    let mut tiers = BTreeSet::new();
    for record in records {
        match validate_record(record) {
            Ok(clue) => {
                tiers.insert(clue.tier);
            }
            Err(warning) => warnings.push(warning),
        }
    }

    // Tiers with no clues leave the calibrator nothing exact to serve
    if !tiers.is_empty() {
        for tier in Tier::all().filter(|t| !tiers.contains(t)) {
            warnings.push(CatalogWarning::new(None, format!("no clues at tier {tier}")));
        }
    }

    warnings
}
