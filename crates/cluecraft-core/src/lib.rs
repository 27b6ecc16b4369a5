//! cluecraft-core: Adaptive learning engine for trivia practice.
//!
//! This crate defines the data model, the collaborator traits, and the four
//! engines (calibrator, scheduler, weakness detector, orchestrator) that
//! decide which clue a user sees next and how their progress evolves.

pub mod calibrator;
pub mod catalog;
pub mod config;
pub mod error;
pub mod insights;
pub mod model;
pub mod modes;
pub mod orchestrator;
pub mod parser;
pub mod profile;
pub mod scheduler;
pub mod statistics;
pub mod traits;
pub mod weakness;
