//! The command line interface for the planner.
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// The command line interface for the planner.
#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    /// The available commands.
    #[command(subcommand)]
    pub command: Commands,
}

/// The available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Solve a planning model.
    Run {
        /// Path to the model directory.
        #[arg(help = "Path to the model directory")]
        model_dir: PathBuf,
        /// Override the number of demand scenarios from settings.toml.
        #[arg(long)]
        scenarios: Option<u32>,
    },
}
