//! NFH CLI - Forest health monitoring for Nepal from Sentinel-2 imagery.

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "nfh-cli",
    version,
    about = "Nepal forest health monitor: NDVI change detection and reporting"
)]
struct Cli {
    #[command(subcommand)]
    command: nfh_cmd::Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Credentials may come from a .env file in the working directory.
    dotenvy::dotenv().ok();
    env_logger::init();
    let cli = Cli::parse();
    nfh_cmd::run(cli.command).await
}
