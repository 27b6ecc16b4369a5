//! The `cluecraft play` command.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use comfy_table::{Cell, Table};
use tokio::io::{AsyncBufReadExt, BufReader};

use cluecraft_core::calibrator::TierChange;
use cluecraft_core::error::EngineError;
use cluecraft_core::model::{Clue, NextClue, SessionConfig};
use cluecraft_core::orchestrator::OutcomeReport;
use cluecraft_core::parser::load_catalog;
use cluecraft_core::profile::SessionSummary;
use cluecraft_store::load_config_from;

use crate::judge::ExactMatchJudge;

use super::percent;

/// Responses that end the session early.
const QUIT_WORDS: [&str; 3] = ["quit", "exit", ":q"];

pub struct PlayOptions {
    pub catalog: Option<PathBuf>,
    pub user: Option<String>,
    pub mode: Option<String>,
    pub category: Option<String>,
    pub rounds: u32,
    pub seed: Option<u64>,
    pub config: Option<PathBuf>,
}

pub async fn execute(options: PlayOptions) -> Result<()> {
    let config = load_config_from(options.config.as_deref())?;
    let mode = options
        .mode
        .unwrap_or_else(|| config.default_mode.to_string());
    // Reject a bad mode or filter before touching the catalog or store
    let session_config = SessionConfig::parse(&mode, options.category.as_deref())?;

    let catalog_path = super::catalog_path(options.catalog, &config)?;
    let (catalog, _) = load_catalog(&catalog_path)?;
    for warning in catalog.warnings() {
        eprintln!("warning: {warning}");
    }
    if catalog.is_empty() {
        anyhow::bail!("catalog has no clues: {}", catalog_path.display());
    }

    let user = super::user_id(options.user, &config);
    let orchestrator = super::orchestrator(&config, Arc::new(catalog))?;
    let mut session = orchestrator
        .start_session(&user, session_config, options.seed.or(config.seed))
        .await?;

    println!(
        "Playing {} as {user} at tier {}. Type `quit` to stop.\n",
        session.config().mode,
        session.profile().calibration.current_tier,
    );

    let judge = ExactMatchJudge;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    for round in 1..=options.rounds {
        let clue = match orchestrator.next_clue(&mut session).next {
            NextClue::Clue(clue) => clue,
            NextClue::Exhausted => {
                println!("No more clues available for this mode.");
                break;
            }
        };

        println!(
            "[{round}/{}] {} for ${} (tier {})",
            options.rounds, clue.category, clue.value, clue.tier
        );
        println!("{}", clue.prompt);
        print!("> ");
        std::io::stdout().flush()?;

        let started = Instant::now();
        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };
        let response = line.trim();
        if QUIT_WORDS.contains(&response.to_lowercase().as_str()) {
            break;
        }
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match orchestrator
            .submit_answer(&mut session, &clue.id, response, elapsed_ms, &judge)
            .await
        {
            Ok(report) => print_outcome(&clue, &report),
            Err(e @ EngineError::Persistence { .. }) => {
                println!("The answer was: {}", clue.answer);
                eprintln!("warning: progress not saved: {e}");
            }
            Err(e @ EngineError::Verdict(_)) => {
                eprintln!("warning: answer not recorded: {e}");
            }
            Err(e) => return Err(e.into()),
        }
        println!();
    }

    let summary = orchestrator.end_session(session).await?;
    print_summary(&summary);
    Ok(())
}

fn print_outcome(clue: &Clue, report: &OutcomeReport) {
    if report.event.outcome.correct {
        println!("Correct!");
    } else {
        println!("Incorrect. The answer was: {}", clue.answer);
        if report.category_weak {
            println!("{} is a weak category for you.", clue.category);
        }
    }
    match report.tier_change {
        Some(TierChange::Up) => println!("Difficulty up: now tier {}.", report.target_tier),
        Some(TierChange::Down) => println!("Difficulty down: now tier {}.", report.target_tier),
        None => {}
    }
}

fn print_summary(summary: &SessionSummary) {
    let mut table = Table::new();
    table.set_header(vec!["Session", "Result"]);
    let categories: Vec<&str> = summary.categories_played.iter().map(String::as_str).collect();
    let rows = [
        ("Answered", summary.answered.to_string()),
        ("Correct", summary.correct.to_string()),
        ("Accuracy", percent(summary.accuracy())),
        ("Avg response", format!("{:.1}s", summary.avg_response_secs())),
        ("Categories", categories.join(", ")),
    ];
    for (label, value) in rows {
        table.add_row(vec![Cell::new(label), Cell::new(value)]);
    }
    println!("{table}");
}
