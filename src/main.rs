//! vsdbg-layer - Visual Studio Debugger layer buildpack
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use vsdbg_layer::cli::{Cli, Commands};
use vsdbg_layer::config::ConfigManager;
use vsdbg_layer::error::VsdbgResult;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> VsdbgResult<()> {
    let cli = Cli::parse();

    // 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("vsdbg_layer=warn"),
        1 => EnvFilter::new("vsdbg_layer=info"),
        _ => EnvFilter::new("vsdbg_layer=debug"),
    };

    // stdout carries the build log and command output
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    // Detection needs no configuration
    if let Commands::Detect = cli.command {
        return vsdbg_layer::cli::commands::detect().await;
    }

    let manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    debug!("Using config {}", manager.path().display());
    let config = manager.load().await?;

    match cli.command {
        Commands::Detect => unreachable!("Detect handled above"),
        Commands::Build(args) => vsdbg_layer::cli::commands::build(args, &config).await,
        Commands::Retrieve(args) => vsdbg_layer::cli::commands::retrieve(args, &config).await,
        Commands::Config(args) => {
            vsdbg_layer::cli::commands::config(args, &manager, &config).await
        }
    }
}
