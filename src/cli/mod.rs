//! CLI module for DocFinder.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// DocFinder - Ask questions about a directory of documents
///
/// Embeds every text file in a directory and answers questions using the
/// most relevant documents as context for a chat model.
#[derive(Parser, Debug)]
#[command(name = "docfinder")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Index a directory and answer a single question
    Ask {
        /// Directory holding the documents
        #[arg(short, long, env = "DOCUMENTS_DIR")]
        documents_dir: String,

        /// The question to ask (read from stdin when omitted)
        query: Option<String>,
    },

    /// Index a directory and answer questions interactively
    Repl {
        /// Directory holding the documents
        #[arg(short, long, env = "DOCUMENTS_DIR")]
        documents_dir: String,
    },

    /// Show the documents most similar to a query, with scores
    Search {
        /// Directory holding the documents
        #[arg(short, long, env = "DOCUMENTS_DIR")]
        documents_dir: String,

        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },

    /// List the models available at the completion service
    Models,

    /// Start HTTP API server
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,

        /// Directory to index at startup
        #[arg(short, long, env = "DOCUMENTS_DIR")]
        documents_dir: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}
