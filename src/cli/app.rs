//! Main CLI application structure

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use super::merge_cmd::{self, MergeArgs};
use super::output::{Output, OutputFormat};
use super::{execute_cmd, logging};

#[derive(Parser)]
#[command(name = "compose-merge")]
#[command(author, version, about = "Merge a base compose file with per-project overrides")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Merge the base compose file with every project's compose file
    Merge(MergeArgs),

    /// Run a plugin request (JSON on stdin) and print the response
    Execute {
        /// Read the request from a file instead of stdin
        #[arg(long)]
        request: Option<PathBuf>,
    },

    /// Print the plugin manifest
    Manifest,
}

/// Run the CLI application
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let output = Output::new(cli.format);

    match cli.command {
        Commands::Merge(args) => merge_cmd::run(args, &output),
        Commands::Execute { request } => execute_cmd::run(request.as_deref()),
        Commands::Manifest => execute_cmd::manifest(&output),
    }
}
