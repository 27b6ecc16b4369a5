//! cluecraft CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;
mod judge;

#[derive(Parser)]
#[command(name = "cluecraft", version, about = "Adaptive trivia trainer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a session, reading answers from stdin
    Play {
        /// Catalog file or directory (defaults to `catalog` in the config)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// User to play as
        #[arg(long)]
        user: Option<String>,

        /// Mode: adaptive, review, challenge, practice, weakness
        #[arg(long)]
        mode: Option<String>,

        /// Restrict clues to one category
        #[arg(long)]
        category: Option<String>,

        /// Number of clues to play
        #[arg(long, default_value = "10")]
        rounds: u32,

        /// Sampling seed for a reproducible session
        #[arg(long)]
        seed: Option<u64>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show accuracy, difficulty, weak categories and recommendations
    Insights {
        #[arg(long)]
        user: Option<String>,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List recent sessions
    History {
        #[arg(long)]
        user: Option<String>,

        /// Maximum sessions to show
        #[arg(long, default_value = "10")]
        limit: usize,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate catalog files
    Validate {
        /// Catalog file or directory
        #[arg(long)]
        catalog: PathBuf,
    },

    /// List catalog categories with clue counts
    Categories {
        /// Catalog file or directory (defaults to `catalog` in the config)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create starter config and catalog
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("cluecraft=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Play {
            catalog,
            user,
            mode,
            category,
            rounds,
            seed,
            config,
        } => {
            commands::play::execute(commands::play::PlayOptions {
                catalog,
                user,
                mode,
                category,
                rounds,
                seed,
                config,
            })
            .await
        }
        Commands::Insights {
            user,
            format,
            config,
        } => commands::insights::execute(user, format, config).await,
        Commands::History {
            user,
            limit,
            format,
            config,
        } => commands::history::execute(user, limit, format, config).await,
        Commands::Validate { catalog } => commands::validate::execute(catalog),
        Commands::Categories { catalog, config } => commands::categories::execute(catalog, config),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
