//! The `cluecraft history` command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use comfy_table::{Cell, Table};

use cluecraft_core::catalog::InMemoryCatalog;
use cluecraft_core::traits::ProgressStore;
use cluecraft_store::load_config_from;

use super::percent;

pub async fn execute(
    user: Option<String>,
    limit: usize,
    format: String,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let user = super::user_id(user, &config);
    let orchestrator = super::orchestrator(&config, Arc::new(InMemoryCatalog::default()))?;
    let sessions = orchestrator.store().recent_sessions(&user, limit).await?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&sessions)?);
        return Ok(());
    }

    if sessions.is_empty() {
        println!("No sessions recorded for {user}.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec![
        "Started",
        "Mode",
        "Category",
        "Answered",
        "Accuracy",
        "Avg time",
    ]);
    for session in &sessions {
        table.add_row(vec![
            Cell::new(session.started_at.format("%Y-%m-%d %H:%M")),
            Cell::new(session.mode),
            Cell::new(session.category_filter.as_deref().unwrap_or("all")),
            Cell::new(format!("{}/{}", session.correct, session.answered)),
            Cell::new(percent(session.accuracy())),
            Cell::new(format!("{:.1}s", session.avg_response_secs())),
        ]);
    }
    println!("Recent sessions for {user}:");
    println!("{table}");

    Ok(())
}
