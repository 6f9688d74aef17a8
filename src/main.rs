mod chunker;
mod cli;
mod config;
mod db;
mod embedding;
mod engine;
mod error;
mod index;
mod memory;
mod reader;
mod server;
mod tools;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "arca", version, about = "Local semantic retrieval engine with per-user memory, served over MCP")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the MCP server (transport from config: stdio or sse)
    Serve,
    /// Manage the embedding model
    Model {
        #[command(subcommand)]
        action: ModelAction,
    },
    /// Index a file or literal text
    Ingest {
        /// Path to the file to ingest
        #[arg(long, conflicts_with = "text")]
        file: Option<String>,
        /// Literal text to ingest
        #[arg(long)]
        text: Option<String>,
        /// Target collection (defaults to 'documents')
        #[arg(long)]
        collection: Option<String>,
    },
    /// Search indexed documents (and optionally a user's memories)
    Search {
        /// Natural language query
        query: String,
        /// Collection to search (defaults to 'documents')
        #[arg(long)]
        collection: Option<String>,
        /// Maximum number of results
        #[arg(long)]
        limit: Option<usize>,
        /// Also search this user's memories
        #[arg(long)]
        user_id: Option<String>,
    },
    /// Run database diagnostics
    Doctor,
}

#[derive(Subcommand)]
enum ModelAction {
    /// Download the embedding model to ~/.arca/models/
    Download,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = config::ArcaConfig::load()?;

    // Log to stderr so stdout stays clean for MCP JSON-RPC.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve => match config.server.transport.as_str() {
            "sse" | "http" => server::serve_sse(config).await?,
            _ => server::serve_stdio(config).await?,
        },
        Command::Model { action } => match action {
            ModelAction::Download => {
                cli::model_download(&config.embedding).await?;
            }
        },
        Command::Ingest {
            file,
            text,
            collection,
        } => {
            cli::ingest::ingest(&config, file, text, collection).await?;
        }
        Command::Search {
            query,
            collection,
            limit,
            user_id,
        } => {
            cli::search::search(&config, query, collection, limit, user_id).await?;
        }
        Command::Doctor => {
            cli::doctor::doctor(&config)?;
        }
    }

    Ok(())
}
