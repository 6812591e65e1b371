//! CLI module for Laer.

pub mod commands;
mod output;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Laer - Interactive YouTube Study Sessions
///
/// A backend for turning YouTube lectures into interactive study sessions:
/// grounded Q&A over the transcript, personalized quizzes, and study notes.
/// The name "Laer" comes from the Norwegian word for "learn."
#[derive(Parser, Debug)]
#[command(name = "laer")]
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
    /// Start the HTTP API server
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Wipe the vector store collections
    Reset {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
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
}
