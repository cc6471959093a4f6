//! Delivery CLI
//!
//! Command-line interface for the Delivery orchestrator API.

mod commands;
mod config;
mod id_resolver;
mod types;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;

#[derive(Parser)]
#[command(name = "delivery")]
#[command(about = "CLI for interacting with the Delivery-Bot API", long_about = None)]
struct Cli {
    /// Base API URL
    #[arg(
        short,
        long,
        global = true,
        env = "DELIVERY_API_URL",
        default_value = "http://localhost:8080"
    )]
    base: String,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config { base_url: cli.base };

    handle_command(cli.command, &config).await
}
