use std::process::ExitCode;

use accord::AccountRole;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod output;
mod prompt;

use cli::{Cli, Commands};

fn main() -> ExitCode {
    // Logs go to stderr so that stdout carries only the report
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("accord=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match &cli.command {
        Commands::SetupRouterAccount(args) => {
            commands::setup::run(args, AccountRole::Router, cli.format)
        }
        Commands::SetupAdminAccount(args) => {
            commands::setup::run(args, AccountRole::Administrative, cli.format)
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
