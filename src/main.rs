mod cli;
mod commands;
mod merger;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Logging is initialised by each command once its log level is known
    let cli = Cli::parse();

    match cli.command {
        Commands::Watch(args) => commands::watch::run(args).await,
        Commands::Config(args) => commands::config::run(args.command),
        Commands::Doctor(args) => commands::doctor::run(args).await,
    }
}
