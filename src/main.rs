mod cli;
mod commands;
mod config;
mod error;
mod mcp;
mod page_range;
mod pdf;
mod pipeline;
mod upload;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use pipeline::Orchestrator;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // stdout belongs to the MCP transport
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = cli.load_config()?;
    for dir in [&config.upload_dir, &config.output_dir] {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    }
    let orchestrator = Orchestrator::new(config);

    match cli.command {
        Commands::Mcp => {
            mcp::run_server(orchestrator).await?;
        }
        Commands::Extract { path, pages } => {
            commands::extract::run(&orchestrator, &path, &pages)?;
        }
        Commands::Merge { inputs } => {
            commands::merge::run(&orchestrator, &inputs)?;
        }
    }

    Ok(())
}
