//! Command implementations for the NFH CLI.
//!
//! Provides subcommands for comparing vegetation health between two years
//! around a location in Nepal and for browsing the location gazetteer.

use clap::Subcommand;

pub mod analyze;
pub mod config;
pub mod locations;

#[derive(Subcommand)]
pub enum Command {
    /// Compare NDVI between two years and report on forest health
    Analyze(analyze::AnalyzeArgs),

    /// Find districts and protected areas by name
    Search {
        /// Case-insensitive part of the name
        query: String,
    },

    /// List every known location with its coordinates
    Locations,
}

pub async fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Analyze(args) => analyze::run_analyze(args).await,
        Command::Search { query } => locations::run_search(&query),
        Command::Locations => locations::run_locations(),
    }
}
