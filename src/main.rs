//! Provides the main entry point to the program.
use anyhow::Result;
use clap::Parser;
use mecwlp::cli::{Cli, Commands};
use mecwlp::commands::handle_run_command;

fn main() -> Result<()> {
    human_panic::setup_panic!();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            model_dir,
            scenarios,
        } => handle_run_command(&model_dir, scenarios),
    }
}
