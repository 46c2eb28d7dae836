//! Command-line interface wiring for tardis.

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::Settings;

pub mod enrich;
pub mod llr;

/// Top-level CLI definition.
#[derive(Debug, Parser)]
#[command(
    name = "tardis",
    author,
    version,
    about = "Drug-target-adverse event signal detection",
    long_about = None
)]
pub struct Cli {
    /// Worker threads for row-parallel stages (0 = one per core).
    #[arg(long, global = true)]
    pub workers: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Parse CLI arguments from the environment.
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Dispatch the selected sub-command.
    pub async fn dispatch(self, mut settings: Settings) -> Result<()> {
        if let Some(workers) = self.workers {
            settings.workers = workers;
        }
        match self.command {
            Commands::Llr(args) => llr::run(args, settings).await,
            Commands::Enrich(args) => enrich::run(args, settings).await,
        }
    }
}

/// Supported sub-commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Disproportionality analysis of exploded case reports.
    Llr(llr::Args),
    /// Target / adverse event enrichment with Fisher's test and q-values.
    Enrich(enrich::Args),
}
