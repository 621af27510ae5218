//! CLI module for Finna.

pub mod commands;
mod output;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Finna - Live Session Search
///
/// A service for indexing live session transcripts and searching them
/// semantically. The name "Finna" comes from the Old Norse word for "to find."
#[derive(Parser, Debug)]
#[command(name = "finna")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
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
    /// Initialize Finna and verify connectivity
    Init,

    /// Start the HTTP API server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },

    /// Search indexed sessions
    Search {
        /// Search query
        query: String,

        /// Restrict results to one category
        #[arg(short = 'C', long)]
        category: Option<String>,
    },

    /// List tracked sessions
    List,

    /// Re-index a session's transcript
    Reindex {
        /// Session ID to re-index
        session_id: String,
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

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "embedding.model")
        key: String,
        /// Configuration value
        value: String,
    },

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}
