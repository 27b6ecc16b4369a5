//! The `cluecraft insights` command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use comfy_table::{Cell, Table};

use cluecraft_core::catalog::InMemoryCatalog;
use cluecraft_core::insights::Insights;
use cluecraft_store::load_config_from;

use super::percent;

pub async fn execute(
    user: Option<String>,
    format: String,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let user = super::user_id(user, &config);
    // Insights read only the stored profile, so no catalog is loaded
    let orchestrator = super::orchestrator(&config, Arc::new(InMemoryCatalog::default()))?;
    let insights = orchestrator.get_insights(&user).await?;

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&insights)?),
        _ => print_insights(&insights),
    }
    Ok(())
}

fn list_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}

fn print_insights(insights: &Insights) {
    let mut table = Table::new();
    table.set_header(vec!["Metric", "Value"]);
    let rows = [
        ("User", insights.user_id.clone()),
        ("Level", format!("{:.1} / 10", insights.level)),
        ("Answered", insights.answered.to_string()),
        ("Lifetime accuracy", percent(insights.lifetime_accuracy)),
        ("Recent accuracy", percent(insights.global_accuracy)),
        ("Difficulty tier", insights.current_tier.to_string()),
        ("Due reviews", insights.due_review_count.to_string()),
        ("Weak categories", list_or_none(&insights.weak_categories)),
        ("Strengths", list_or_none(&insights.strengths)),
    ];
    for (metric, value) in rows {
        table.add_row(vec![Cell::new(metric), Cell::new(value)]);
    }
    println!("{table}");

    if !insights.recommendations.is_empty() {
        println!("\nRecommendations:");
        for recommendation in &insights.recommendations {
            println!("  - {recommendation}");
        }
    }
}
