//! CLI module for the document chat CLI.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

use crate::models::OutputFormat;

/// Chat with hosted LLMs and your documents from the terminal.
#[derive(Debug, Parser)]
#[command(name = "docchat")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[arg(
        long,
        short = 'f',
        global = true,
        help = "Output format: text, json, or markdown"
    )]
    pub format: Option<OutputFormat>,

    #[arg(long, short = 'v', global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Interactive chat, optionally grounded in a document
    Chat(commands::ChatArgs),

    /// Ask a single question and print the answer
    Ask(commands::AskArgs),

    /// Manage configuration
    #[command(subcommand)]
    Config(commands::ConfigCommand),

    /// Check provider reachability
    Status,
}

// FromStr for --format is implemented in models::answer
