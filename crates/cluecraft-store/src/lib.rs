//! cluecraft-store: Progress store backends.
//!
//! Implements the `ProgressStore` trait in memory and as JSON files on disk,
//! and loads the trainer configuration that selects between them.

pub mod config;
pub mod json;
pub mod memory;

pub use config::{load_config, load_config_from, open_store, StoreConfig, TrainerConfig};
pub use json::JsonFileStore;
pub use memory::MemoryStore;
