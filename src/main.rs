//! grambank_rag CLI - main entry point
//!
//! Builds the entity index and answers questions about South American
//! languages grounded in the knowledge graph.

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use grambank_rag::{commands, metrics, Config};
use tracing::warn;

#[derive(Parser)]
#[command(name = "grambank_rag")]
#[command(about = "Question answering over a knowledge graph of languages", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to config.yml (defaults to ./config.yml, then ../config.yml)
    #[arg(long, global = true, env = "GRAMBANK_CONFIG")]
    config: Option<PathBuf>,

    /// Address to expose Prometheus metrics (e.g., 0.0.0.0:9898)
    #[arg(long, global = true, env = "METRICS_ADDR")]
    metrics_addr: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Describe and embed every entity, then save the index and id list
    BuildIndex {
        /// Descriptions per embedding request
        #[arg(long, default_value_t = commands::DEFAULT_BATCH_SIZE)]
        batch_size: usize,
    },

    /// Print the synthesized description of one entity
    Describe {
        /// Entity identifier
        id: String,
    },

    /// Print the entities retrieved for a question
    Retrieve {
        question: String,

        /// Number of semantic matches (defaults to retrieval.top_k)
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// Print the grounding context assembled for a question
    Context {
        question: String,

        /// Number of semantic matches (defaults to retrieval.top_k)
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// Answer a question
    Ask {
        question: String,

        /// Number of semantic matches (defaults to retrieval.top_k)
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::BuildIndex { .. } => "build_index",
            Commands::Describe { .. } => "describe",
            Commands::Retrieve { .. } => "retrieve",
            Commands::Context { .. } => "context",
            Commands::Ask { .. } => "ask",
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env for local development
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("grambank_rag=info".parse()?))
        .init();

    let cli = Cli::parse();

    if let Some(addr) = cli.metrics_addr.as_deref() {
        match addr.parse::<SocketAddr>() {
            Ok(socket) => metrics::spawn_metrics_server(socket),
            Err(err) => warn!(%addr, "Invalid metrics address: {}", err),
        }
    }

    let config = Config::load(cli.config.as_deref())?;

    let command_name = cli.command.name();
    metrics::record_command_start(command_name);
    let start = Instant::now();

    let result = execute_command(&config, cli.command).await;

    metrics::record_command_result(command_name, start.elapsed(), result.is_ok());

    result
}

async fn execute_command(config: &Config, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::BuildIndex { batch_size } => commands::build_index_run(config, batch_size).await,
        Commands::Describe { id } => commands::describe(config, &id),
        Commands::Retrieve { question, top_k } => {
            commands::retrieve(config, &question, top_k).await
        }
        Commands::Context { question, top_k } => {
            commands::context(config, &question, top_k).await
        }
        Commands::Ask { question, top_k } => commands::ask(config, &question, top_k).await,
    }
}
