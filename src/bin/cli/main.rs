mod app;
mod commands;
mod render;

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use app::{App, Overrides};

#[derive(Parser)]
#[command(
    name = "lexqa",
    about = "Ask grounded questions about a folder of legal PDFs",
    version
)]
struct Cli {
    /// Configuration file (default: ./lexqa.toml when present)
    #[arg(long, global = true, env = "LEXQA_CONFIG")]
    config: Option<PathBuf>,

    /// Vector index location
    #[arg(long, global = true)]
    index: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Build the vector index from the PDF source directory
    Ingest {
        /// Directory containing the PDFs
        #[arg(long)]
        source_dir: Option<PathBuf>,
    },

    /// Answer one question and exit
    Ask {
        /// The question
        question: String,
        /// Number of chunks to retrieve
        #[arg(long)]
        top_k: Option<usize>,
    },

    /// Interactive question answering
    Chat {
        /// Number of chunks to retrieve
        #[arg(long)]
        top_k: Option<usize>,
    },

    /// Show the chunks retrieved for a query, without generating an answer
    Search {
        /// Search query
        query: String,
        /// Number of chunks to retrieve
        #[arg(long)]
        top_k: Option<usize>,
    },

    /// Show index statistics
    Stats,
}

fn main() -> anyhow::Result<()> {
    // Credentials may live in a local .env
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let use_color = !cli.no_color && std::io::stdout().is_terminal();

    let mut overrides = Overrides {
        index_path: cli.index,
        ..Default::default()
    };

    match cli.command {
        Command::Ingest { source_dir } => {
            overrides.source_dir = source_dir;
            let app = App::new(cli.config.as_deref(), overrides)?;
            commands::ingest::run(&app, &cli.format, use_color)?;
        }
        Command::Ask { question, top_k } => {
            overrides.top_k = top_k;
            let app = App::new(cli.config.as_deref(), overrides)?;
            commands::ask::run(&app, &question, &cli.format, use_color)?;
        }
        Command::Chat { top_k } => {
            overrides.top_k = top_k;
            let app = App::new(cli.config.as_deref(), overrides)?;
            commands::chat::run(&app, &cli.format, use_color)?;
        }
        Command::Search { query, top_k } => {
            overrides.top_k = top_k;
            let app = App::new(cli.config.as_deref(), overrides)?;
            commands::search::run(&app, &query, &cli.format, use_color)?;
        }
        Command::Stats => {
            let app = App::new(cli.config.as_deref(), overrides)?;
            commands::stats::run(&app, &cli.format, use_color)?;
        }
    }

    Ok(())
}
