mod classifier;
mod cli;
mod config;
mod error;
mod execution_log;
mod output;
mod patterns;
mod reporter;
mod results;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    output::print_banner();

    let cli = Cli::parse();
    info!("Starting yamato-log-parser");
    cli.execute().await?;

    Ok(())
}
