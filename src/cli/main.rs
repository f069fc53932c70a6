use std::path::PathBuf;

use clap::Parser;

use crate::Commands;

/// Main CLI application arguments and command structure
#[derive(Parser)]
#[clap(
    name = "notesuite",
    version,
    about = "Command-line client for the Notes Suite service"
)]
pub struct Cli {
    /// Path to the configuration file
    #[clap(short = 'c', long, value_parser)]
    pub config: Option<PathBuf>,

    /// Base URL of the notes API, overriding the configured one
    #[clap(long, value_parser)]
    pub api_url: Option<String>,

    /// Verbose output mode
    #[clap(short, long)]
    pub verbose: bool,

    /// Subcommands for the notesuite client
    #[clap(subcommand)]
    pub command: Commands,
}
