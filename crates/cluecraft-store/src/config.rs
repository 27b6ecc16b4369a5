//! Trainer configuration and store factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use cluecraft_core::config::EngineConfig;
use cluecraft_core::model::Mode;
use cluecraft_core::traits::ProgressStore;

use crate::json::JsonFileStore;
use crate::memory::MemoryStore;

/// Where user progress is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoreConfig {
    Memory,
    Json {
        #[serde(default = "default_data_dir")]
        dir: PathBuf,
    },
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::Json {
            dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./cluecraft-data")
}

/// Top-level cluecraft configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainerConfig {
    #[serde(default)]
    pub store: StoreConfig,
    /// Catalog file or directory.
    #[serde(default)]
    pub catalog: Option<PathBuf>,
    #[serde(default)]
    pub default_mode: Mode,
    #[serde(default = "default_user")]
    pub default_user: String,
    /// Fixed sampling seed, for reproducible sessions.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub engine: EngineConfig,
}

fn default_user() -> String {
    "player".to_string()
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            catalog: None,
            default_mode: Mode::default(),
            default_user: default_user(),
            seed: None,
            engine: EngineConfig::default(),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str, lookup: &impl Fn(&str) -> Option<String>) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        let Some(end) = result[start..].find('}') else {
            break;
        };
        let var_name = &result[start + 2..start + end];
        let value = lookup(var_name).unwrap_or_default();
        result = format!("{}{}{}", &result[..start], value, &result[start + end + 1..]);
    }
    result
}

fn resolve_path(path: &Path, lookup: &impl Fn(&str) -> Option<String>) -> PathBuf {
    PathBuf::from(resolve_env_vars(&path.to_string_lossy(), lookup))
}

/// Apply `CLUECRAFT_DATA_DIR` / `CLUECRAFT_CATALOG` and resolve `${VAR}`
/// references in configured paths.
fn apply_env(mut config: TrainerConfig, lookup: impl Fn(&str) -> Option<String>) -> TrainerConfig {
    if let Some(dir) = lookup("CLUECRAFT_DATA_DIR").filter(|d| !d.is_empty()) {
        config.store = StoreConfig::Json {
            dir: PathBuf::from(dir),
        };
    }
    if let Some(catalog) = lookup("CLUECRAFT_CATALOG").filter(|c| !c.is_empty()) {
        config.catalog = Some(PathBuf::from(catalog));
    }

    if let StoreConfig::Json { dir } = &mut config.store {
        *dir = resolve_path(dir, &lookup);
    }
    config.catalog = config.catalog.map(|c| resolve_path(&c, &lookup));
    config
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `cluecraft.toml` in the current directory
/// 2. `~/.config/cluecraft/config.toml`
///
/// Environment overrides: `CLUECRAFT_DATA_DIR`, `CLUECRAFT_CATALOG`.
pub fn load_config() -> Result<TrainerConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<TrainerConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => [Some(PathBuf::from("cluecraft.toml")), global_config_path()]
            .into_iter()
            .flatten()
            .find(|p| p.exists()),
    };

    let config = match config_path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => TrainerConfig::default(),
    };

    Ok(apply_env(config, |name| std::env::var(name).ok()))
}

/// Parse and validate TOML config text without applying environment overrides.
pub fn parse_config(content: &str) -> Result<TrainerConfig> {
    let config: TrainerConfig = toml::from_str(content)?;
    config.engine.validate()?;
    Ok(config)
}

fn global_config_path() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(|h| {
        PathBuf::from(h)
            .join(".config")
            .join("cluecraft")
            .join("config.toml")
    })
}

/// Create a progress store from its configuration.
pub fn open_store(config: &StoreConfig) -> Result<Arc<dyn ProgressStore>> {
    match config {
        StoreConfig::Memory => Ok(Arc::new(MemoryStore::new())),
        StoreConfig::Json { dir } => {
            let store = JsonFileStore::open(dir)
                .with_context(|| format!("failed to open data directory: {}", dir.display()))?;
            Ok(Arc::new(store))
        }
    }
}
